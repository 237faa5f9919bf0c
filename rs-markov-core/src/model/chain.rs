use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use log::debug;

use super::NodeId;
use super::edge::Edge;
use super::node::Node;
use crate::cancel::CancelFlag;
use crate::error::Result;
use crate::serializer;
use crate::tokenizer::tokenize;

/// A first-order Markov chain over word tokens.
///
/// # Responsibilities
/// - Merge observed token sequences into nodes and counted edges
/// - Convert counts into selection thresholds (`finalize`)
/// - Expose nodes by token, by arena id, and by sorted position
/// - Merge with another chain
///
/// # Invariants
/// - Tokens are unique; `index` maps each token to its arena id
/// - `order` lists every arena id, sorted by token
/// - Edges only reference ids present in `nodes`
#[derive(Clone, Debug, Default)]
pub struct Chain {
	/// Arena owning every node; a node's id is its position here.
	nodes: Vec<Node>,
	index: HashMap<String, NodeId>,
	/// Arena ids sorted by token, backing `at()`.
	order: Vec<NodeId>,
	/// Set when counts changed after the last `finalize`.
	stale: bool,
}

/// Outcome of a single ingestion call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Ingested {
	/// Tokens merged into the chain.
	pub tokens: usize,
	/// Whether the run stopped on the cancellation flag.
	pub cancelled: bool,
}

impl Chain {
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of distinct tokens.
	pub fn count(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Node at sorted position `index`.
	///
	/// # Panics
	/// Panics if `index >= self.count()`.
	pub fn at(&self, index: usize) -> &Node {
		&self.nodes[self.order[index]]
	}

	/// Node with arena id `id`.
	///
	/// # Panics
	/// Panics if `id` does not belong to this chain.
	pub fn node(&self, id: NodeId) -> &Node {
		&self.nodes[id]
	}

	pub fn get(&self, token: &str) -> Option<&Node> {
		self.index.get(token).map(|&id| &self.nodes[id])
	}

	/// Iterates over nodes sorted by token.
	pub fn nodes(&self) -> impl Iterator<Item = &Node> {
		self.order.iter().map(|&id| &self.nodes[id])
	}

	/// Whether thresholds reflect the current counts.
	pub fn is_finalized(&self) -> bool {
		!self.stale
	}

	/// Drops every node and edge.
	pub fn clear(&mut self) {
		self.nodes.clear();
		self.index.clear();
		self.order.clear();
		self.stale = false;
	}

	/// Looks up the node for `token`, creating it on first sight.
	pub(crate) fn intern(&mut self, token: &str) -> NodeId {
		if let Some(&id) = self.index.get(token) {
			return id;
		}

		let id = self.nodes.len();
		self.nodes.push(Node::new(token, id));
		self.index.insert(token.to_owned(), id);

		let nodes = &self.nodes;
		let position = self
			.order
			.binary_search_by(|&other| nodes[other].token().cmp(token))
			.unwrap_or_else(|position| position);
		self.order.insert(position, id);

		self.stale = true;
		id
	}

	/// Adds `count` observations of the transition `from -> to`.
	///
	/// Keeps the successors of `from` sorted by target token and merges into
	/// an existing edge when `to` is already a successor.
	pub(crate) fn link(&mut self, from: NodeId, to: NodeId, count: u64) {
		let position = {
			let nodes = &self.nodes;
			let target = nodes[to].token();
			nodes[from]
				.successors()
				.binary_search_by(|edge| nodes[edge.target()].token().cmp(target))
		};

		let successors = self.nodes[from].successors_mut();
		match position {
			Ok(found) => successors[found].increase(count),
			Err(insert_at) => successors.insert(insert_at, Edge::new(to, count)),
		}
		self.stale = true;
	}

	/// Starts an incremental ingestion of one token sequence.
	///
	/// The returned [`Ingestion`] remembers the previous token, so feeding it
	/// line after line links the last token of a line to the first of the next.
	pub fn begin<'a>(&'a mut self, cancel: &'a CancelFlag) -> Ingestion<'a> {
		Ingestion { chain: self, cancel, previous: None, tokens: 0, cancelled: false }
	}

	/// Merges an ordered token sequence into the chain.
	///
	/// # Parameters
	/// - `tokens`: the sequence, in reading order. Consecutive tokens become
	///   one observed transition each.
	/// - `cancel`: checked before each token.
	///
	/// # Behavior
	/// - Each distinct token gets one node; counts of repeated transitions add up.
	/// - Empty strings are skipped; the tokens around them are linked.
	/// - Thresholds become stale until the next `finalize`.
	///
	/// # Notes
	/// - When the flag is set, ingestion stops and everything merged so far
	///   is kept. The returned [`Ingested`] tells how far it went.
	pub fn ingest<I, S>(&mut self, tokens: I, cancel: &CancelFlag) -> Ingested
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut ingestion = self.begin(cancel);
		for token in tokens {
			if !ingestion.push(token.as_ref()) {
				break;
			}
		}
		ingestion.finish()
	}

	/// Tokenizes and ingests `text` as one sequence spanning all its lines.
	pub fn ingest_text(&mut self, text: &str, cancel: &CancelFlag) -> Ingested {
		let mut ingestion = self.begin(cancel);
		for line in text.lines() {
			if !ingestion.push_line(line) {
				break;
			}
		}
		ingestion.finish()
	}

	/// Recomputes every edge threshold from the current counts.
	pub fn finalize(&mut self) {
		for node in &mut self.nodes {
			node.compute_thresholds();
		}
		self.stale = false;
		debug!("Finalized chain with {} nodes", self.nodes.len());
	}

	/// Merges another chain into this one.
	///
	/// Nodes are matched by token and edge counts are summed. Thresholds
	/// become stale.
	pub fn merge(&mut self, other: &Self) {
		let ids: Vec<NodeId> = other.nodes.iter().map(|node| self.intern(node.token())).collect();

		for node in &other.nodes {
			let from = ids[node.id()];
			for edge in node.successors() {
				self.link(from, ids[edge.target()], edge.count());
			}
		}
		self.stale = self.stale || !other.is_empty();
	}

	/// Writes the chain to `path`; see [`serializer::save`].
	pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
		serializer::save(self, path)
	}

	/// Reads a chain from `path`; see [`serializer::load`].
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
		serializer::load(path)
	}
}

impl fmt::Display for Chain {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&serializer::lines::write(self))
	}
}

/// Incremental ingestion of a single token sequence into a [`Chain`].
pub struct Ingestion<'a> {
	chain: &'a mut Chain,
	cancel: &'a CancelFlag,
	previous: Option<NodeId>,
	tokens: usize,
	cancelled: bool,
}

impl Ingestion<'_> {
	/// Merges one token. Returns `false` once the run has been cancelled.
	///
	/// An empty string is not a token: it is ignored and does not break the
	/// sequence.
	pub fn push(&mut self, token: &str) -> bool {
		if self.cancelled || self.cancel.is_cancelled() {
			self.cancelled = true;
			return false;
		}
		if token.is_empty() {
			return true;
		}

		let current = self.chain.intern(token);
		if let Some(previous) = self.previous {
			self.chain.link(previous, current, 1);
		}
		self.previous = Some(current);
		self.tokens += 1;
		true
	}

	/// Tokenizes and merges one line. Returns `false` once cancelled.
	pub fn push_line(&mut self, line: &str) -> bool {
		tokenize(line).all(|token| self.push(token))
	}

	pub fn tokens(&self) -> usize {
		self.tokens
	}

	pub fn finish(self) -> Ingested {
		Ingested { tokens: self.tokens, cancelled: self.cancelled }
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	fn successors(chain: &Chain, token: &str) -> Vec<(String, u64)> {
		chain
			.get(token)
			.map(|node| {
				node.successors()
					.iter()
					.map(|edge| (chain.node(edge.target()).token().to_owned(), edge.count()))
					.collect()
			})
			.unwrap_or_default()
	}

	#[test]
	fn ingest_counts_transitions() {
		let mut chain = Chain::new();
		let cancel = CancelFlag::new();
		chain.ingest(["a", "plan", "a", "plan", "a", "canal"], &cancel);

		assert_eq!(chain.count(), 3);
		assert_eq!(successors(&chain, "a"), vec![("canal".to_owned(), 1), ("plan".to_owned(), 2)]);
		assert_eq!(successors(&chain, "plan"), vec![("a".to_owned(), 2)]);
		assert!(successors(&chain, "canal").is_empty());
	}

	#[test]
	fn single_token_still_creates_a_node() {
		let mut chain = Chain::new();
		let outcome = chain.ingest(["alone"], &CancelFlag::new());
		assert_eq!(outcome, Ingested { tokens: 1, cancelled: false });
		assert_eq!(chain.count(), 1);
		assert!(chain.at(0).successors().is_empty());
	}

	#[test]
	fn separate_calls_do_not_link_across_sequences() {
		let mut chain = Chain::new();
		let cancel = CancelFlag::new();
		chain.ingest(["a", "plan"], &cancel);
		chain.ingest(["a", "canal"], &cancel);

		assert!(successors(&chain, "plan").is_empty());
		assert_eq!(successors(&chain, "a"), vec![("canal".to_owned(), 1), ("plan".to_owned(), 1)]);
	}

	#[test]
	fn finalize_example_thresholds() {
		let mut chain = Chain::new();
		let cancel = CancelFlag::new();
		chain.ingest(["a", "plan"], &cancel);
		chain.ingest(["a", "canal"], &cancel);
		assert!(!chain.is_finalized());
		chain.finalize();
		assert!(chain.is_finalized());

		let thresholds: Vec<f64> = chain.get("a").unwrap().successors().iter().map(Edge::threshold).collect();
		assert_eq!(thresholds, vec![0.5, 0.0]);
	}

	#[test]
	fn at_follows_token_order() {
		let mut chain = Chain::new();
		chain.ingest(["delta", "alpha", "charlie", "bravo"], &CancelFlag::new());
		let tokens: Vec<&str> = (0..chain.count()).map(|i| chain.at(i).token()).collect();
		assert_eq!(tokens, vec!["alpha", "bravo", "charlie", "delta"]);
		assert_eq!(chain.get("delta").unwrap().id(), 0);
	}

	#[test]
	fn ingest_text_links_across_lines() {
		let mut chain = Chain::new();
		chain.ingest_text("It rains.\nIt pours", &CancelFlag::new());
		assert_eq!(successors(&chain, "."), vec![("It".to_owned(), 1)]);
		assert_eq!(successors(&chain, "rains"), vec![(".".to_owned(), 1)]);
	}

	#[test]
	fn cancelled_flag_stops_before_first_token() {
		let mut chain = Chain::new();
		let cancel = CancelFlag::new();
		cancel.cancel();
		let outcome = chain.ingest(["a", "b"], &cancel);
		assert_eq!(outcome, Ingested { tokens: 0, cancelled: true });
		assert!(chain.is_empty());

		cancel.reset();
		let outcome = chain.ingest(["a", "b"], &cancel);
		assert_eq!(outcome, Ingested { tokens: 2, cancelled: false });
		assert_eq!(chain.count(), 2);
	}

	#[test]
	fn empty_strings_are_not_tokens() {
		let mut chain = Chain::new();
		let outcome = chain.ingest(["a", "", "b"], &CancelFlag::new());
		assert_eq!(outcome, Ingested { tokens: 2, cancelled: false });
		assert_eq!(chain.count(), 2);
		assert!(chain.get("").is_none());
		assert_eq!(successors(&chain, "a"), vec![("b".to_owned(), 1)]);
	}

	#[test]
	fn clear_resets_everything() {
		let mut chain = Chain::new();
		chain.ingest(["a", "b"], &CancelFlag::new());
		chain.clear();
		assert_eq!(chain.count(), 0);
		assert!(chain.get("a").is_none());
		assert!(chain.is_finalized());
	}

	#[test]
	fn merge_sums_counts() {
		let cancel = CancelFlag::new();
		let mut left = Chain::new();
		left.ingest(["a", "b", "a", "b"], &cancel);
		let mut right = Chain::new();
		right.ingest(["c", "a", "b"], &cancel);

		left.merge(&right);
		assert_eq!(left.count(), 3);
		assert_eq!(successors(&left, "a"), vec![("b".to_owned(), 3)]);
		assert_eq!(successors(&left, "c"), vec![("a".to_owned(), 1)]);
		assert_eq!(successors(&left, "b"), vec![("a".to_owned(), 1)]);
	}

	#[test]
	fn display_uses_line_format() {
		let mut chain = Chain::new();
		chain.ingest(["a", "b", "a"], &CancelFlag::new());
		assert_eq!(chain.to_string(), "a 1 b\nb 1 a\n");
	}
}
