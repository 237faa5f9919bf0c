use std::time::{SystemTime, UNIX_EPOCH};

use rand::distr::Open01;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::NodeId;
use super::chain::Chain;
use super::node::Node;
use super::walk_input::WalkInput;
use crate::error::{Error, Result};
use crate::tokenizer::is_closing;

/// One token emitted by a walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Emitted<'c> {
	pub node: NodeId,
	pub token: &'c str,
	/// The walk jumped to a random start node before this token.
	pub restart: bool,
}

/// Weighted random walk over a finalized [`Chain`].
///
/// # Responsibilities
/// - Pick start nodes uniformly, optionally preferring sentence starts
/// - Follow edges using the chain's descending thresholds
/// - Restart from a random node when a token has no successor
///
/// The generator owns its random source, so two generators built from the
/// same seed produce the same walk over the same chain.
#[derive(Debug)]
pub struct Generator<R = StdRng> {
	rng: R,
}

impl Generator<StdRng> {
	/// Creates a generator seeded from `input.seed`, or from the clock.
	pub fn new(input: &WalkInput) -> Self {
		Self::from_seed(input.seed.unwrap_or_else(time_seed))
	}

	pub fn from_seed(seed: u64) -> Self {
		Self::with_rng(StdRng::seed_from_u64(seed))
	}
}

impl<R: Rng> Generator<R> {
	pub fn with_rng(rng: R) -> Self {
		Self { rng }
	}

	/// Walks `chain` and returns exactly `input.length()` tokens.
	///
	/// # Errors
	/// - `EmptyChain` if the chain has no nodes
	/// - `NotFinalized` if counts changed after the last `finalize`
	pub fn walk<'c>(&mut self, chain: &'c Chain, input: &WalkInput) -> Result<Vec<Emitted<'c>>> {
		if chain.is_empty() {
			return Err(Error::EmptyChain);
		}
		if !chain.is_finalized() {
			return Err(Error::NotFinalized);
		}

		let mut emitted = Vec::with_capacity(input.length());
		let mut current: Option<NodeId> = None;
		while emitted.len() < input.length() {
			let (node, restart) = match current {
				Some(id) => (chain.node(id), false),
				None => (self.pick_start(chain, input.sentence_start), true),
			};
			emitted.push(Emitted { node: node.id(), token: node.token(), restart });

			let u: f64 = self.rng.sample(Open01);
			current = node.select_successor(u);
		}

		Ok(emitted)
	}

	/// Walks `chain` and renders the tokens as text.
	pub fn generate(&mut self, chain: &Chain, input: &WalkInput) -> Result<String> {
		let emitted = self.walk(chain, input)?;
		Ok(render(&emitted, input.mark_restarts))
	}

	/// Draws a start node, retrying up to `count / 2` times for one whose
	/// token starts with an uppercase letter when `sentence_start` is set.
	fn pick_start<'c>(&mut self, chain: &'c Chain, sentence_start: bool) -> &'c Node {
		let mut node = self.random_node(chain);
		if sentence_start {
			let mut retries = chain.count() / 2;
			while retries > 0 && !starts_uppercase(node.token()) {
				node = self.random_node(chain);
				retries -= 1;
			}
		}
		node
	}

	fn random_node<'c>(&mut self, chain: &'c Chain) -> &'c Node {
		let count = chain.count();
		let u: f64 = self.rng.random();
		let index = ((u * count as f64) as usize).min(count - 1);
		chain.at(index)
	}
}

fn starts_uppercase(token: &str) -> bool {
	token.chars().next().is_some_and(char::is_uppercase)
}

/// Seed derived from the current time, used when no seed is configured.
pub fn time_seed() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|elapsed| elapsed.as_nanos() as u64)
		.unwrap_or_default()
}

/// Joins emitted tokens into text.
///
/// Tokens are separated by one space, except before closing punctuation.
/// With `mark_restarts`, every restart after the first token is preceded by
/// ` \` and a newline. The marker takes the place of the separating space:
/// the token after the newline starts the line, with no leading space.
pub fn render(emitted: &[Emitted<'_>], mark_restarts: bool) -> String {
	let mut text = String::new();
	for (position, item) in emitted.iter().enumerate() {
		if position > 0 {
			if item.restart && mark_restarts {
				text.push_str(" \\\n");
			} else if !is_closing(item.token) {
				text.push(' ');
			}
		}
		text.push_str(item.token);
	}
	text
}
