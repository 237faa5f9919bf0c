//! Save/load round trips for both formats, with and without compression.

use std::collections::BTreeMap;
use std::fs;

use pretty_assertions::assert_eq;
use rs_markov_core::serializer::envelope::MAGIC;
use rs_markov_core::{CancelFlag, Chain, Error, Generator, WalkInput};

const TEXT: &str = "The cat sat on the mat. The dog sat on the cat!\n\
	A cat, a dog (and a bird) sat: « quietly » ?\n\
	The end.";

type Snapshot = BTreeMap<String, BTreeMap<String, u64>>;

fn sample() -> Chain {
	let mut chain = Chain::new();
	chain.ingest_text(TEXT, &CancelFlag::new());
	chain.finalize();
	chain
}

fn snapshot(chain: &Chain) -> Snapshot {
	chain
		.nodes()
		.map(|node| {
			let successors = node
				.successors()
				.iter()
				.map(|edge| (chain.node(edge.target()).token().to_owned(), edge.count()))
				.collect();
			(node.token().to_owned(), successors)
		})
		.collect()
}

fn thresholds(chain: &Chain) -> BTreeMap<(String, String), f64> {
	chain
		.nodes()
		.flat_map(|node| {
			node.successors().iter().map(move |edge| {
				((node.token().to_owned(), chain.node(edge.target()).token().to_owned()), edge.threshold())
			})
		})
		.collect()
}

#[test]
fn round_trip_every_format() {
	let dir = tempfile::tempdir().unwrap();
	let original = sample();

	for name in ["chain.markov", "chain.markovz", "chain.json", "chain.jsonz"] {
		let path = dir.path().join(name);
		original.save(&path).unwrap();

		let bytes = fs::read(&path).unwrap();
		assert_eq!(bytes.starts_with(MAGIC), name.ends_with('z'), "{name}");

		let mut loaded = Chain::load(&path).unwrap();
		assert!(!loaded.is_finalized(), "{name}");
		loaded.finalize();

		assert_eq!(snapshot(&loaded), snapshot(&original), "{name}");
		let expected = thresholds(&original);
		for (key, value) in thresholds(&loaded) {
			assert!((expected[&key] - value).abs() < 1e-9, "{name}: {key:?}");
		}
	}
}

#[test]
fn structured_reload_replays_identical_output() {
	let mut chain = Chain::new();
	chain.ingest(["a", "b", "c", "a", "c", "b", "a"], &CancelFlag::new());
	chain.finalize();
	assert_eq!(chain.count(), 3);

	let input = WalkInput::new(120).unwrap();
	let before = Generator::from_seed(2015).generate(&chain, &input).unwrap();

	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("three.json");
	chain.save(&path).unwrap();
	let mut reloaded = Chain::load(&path).unwrap();
	reloaded.finalize();

	let after = Generator::from_seed(2015).generate(&reloaded, &input).unwrap();
	assert_eq!(after, before);
}

#[test]
fn line_format_is_human_readable() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("tiny.markov");
	let mut chain = Chain::new();
	chain.ingest(["a", "plan", "a", "canal"], &CancelFlag::new());
	chain.save(&path).unwrap();

	assert_eq!(fs::read_to_string(&path).unwrap(), "a 1 canal 1 plan\ncanal\nplan 1 a\n");
}

#[test]
fn plain_payload_loads_under_a_compressed_name() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("plain.markovz");
	fs::write(&path, "a 1 b\nb\n").unwrap();

	let chain = Chain::load(&path).unwrap();
	assert_eq!(chain.count(), 2);
}

#[test]
fn malformed_structured_payload_is_reported() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("broken.json");
	fs::write(&path, r#"{"0": {"token": "a", "id": 0, "successors": [{"count": 1, "node_id": 9}]}}"#).unwrap();

	let mut chain = sample();
	let before = snapshot(&chain);
	match Chain::load(&path) {
		Ok(loaded) => chain = loaded,
		Err(error) => assert!(matches!(error, Error::Parse { .. })),
	}
	assert_eq!(snapshot(&chain), before);

	fs::write(&path, "[1, 2").unwrap();
	assert!(matches!(Chain::load(&path), Err(Error::Json(_))));
}

#[test]
fn failed_save_keeps_previous_file() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("keep.markov");
	sample().save(&path).unwrap();
	let previous = fs::read(&path).unwrap();

	let mut unrepresentable = Chain::new();
	unrepresentable.ingest(["new york", "city"], &CancelFlag::new());
	assert!(matches!(unrepresentable.save(&path), Err(Error::InvalidInput(_))));
	assert_eq!(fs::read(&path).unwrap(), previous);

	let missing = dir.path().join("missing").join("chain.json");
	assert!(matches!(sample().save(&missing), Err(Error::Write { .. })));
	assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn whitespace_tokens_survive_the_structured_format() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("spaces.json");
	let mut chain = Chain::new();
	chain.ingest(["new york", "city"], &CancelFlag::new());
	chain.save(&path).unwrap();

	let loaded = Chain::load(&path).unwrap();
	assert_eq!(snapshot(&loaded), snapshot(&chain));
}

#[test]
fn empty_strings_never_reach_the_saved_file() {
	let dir = tempfile::tempdir().unwrap();
	let mut chain = Chain::new();
	chain.ingest(["a", "", "b"], &CancelFlag::new());

	for name in ["gap.json", "gap.markov"] {
		let path = dir.path().join(name);
		chain.save(&path).unwrap();
		let loaded = Chain::load(&path).unwrap();
		assert_eq!(snapshot(&loaded), snapshot(&chain), "{name}");
		assert_eq!(loaded.count(), 2, "{name}");
	}
}
