//! Line format: one node per line, `<token> (<count> <target>)*`.

use crate::error::{Error, Result};
use crate::model::NodeId;
use crate::model::chain::Chain;

/// Renders `chain` in sorted token order, edges in stored order.
pub fn write(chain: &Chain) -> String {
	let mut text = String::new();
	for node in chain.nodes() {
		text.push_str(node.token());
		for edge in node.successors() {
			text.push(' ');
			text.push_str(&edge.count().to_string());
			text.push(' ');
			text.push_str(chain.node(edge.target()).token());
		}
		text.push('\n');
	}
	text
}

/// Fails if a token cannot be represented in the line format.
pub fn check(chain: &Chain) -> Result<()> {
	match chain.nodes().find(|node| node.token().chars().any(char::is_whitespace)) {
		Some(node) => Err(Error::InvalidInput(format!(
			"token {:?} contains whitespace, use the structured format",
			node.token()
		))),
		None => Ok(()),
	}
}

/// Parses the line format.
///
/// Pass 1 creates a node for the first field of every line so that pass 2
/// can resolve any target. Counts are taken verbatim; the returned chain is
/// not finalized.
pub fn read(text: &str) -> Result<Chain> {
	let mut chain = Chain::new();

	for line in text.lines() {
		if let Some(token) = line.split_whitespace().next() {
			chain.intern(token);
		}
	}

	for (number, line) in text.lines().enumerate() {
		let mut fields = line.split_whitespace();
		let Some(token) = fields.next() else {
			continue;
		};
		let from = resolve(&chain, token, number + 1)?;

		while let Some(count) = fields.next() {
			let count: u64 = count
				.parse()
				.map_err(|_| Error::parse(number + 1, format!("invalid count {count:?}")))?;
			if count == 0 {
				return Err(Error::parse(number + 1, "edge count must be >= 1"));
			}
			let target = fields
				.next()
				.ok_or_else(|| Error::parse(number + 1, "count without target token"))?;
			let to = resolve(&chain, target, number + 1)?;
			chain.link(from, to, count);
		}
	}

	Ok(chain)
}

fn resolve(chain: &Chain, token: &str, line: usize) -> Result<NodeId> {
	chain
		.get(token)
		.map(|node| node.id())
		.ok_or_else(|| Error::parse(line, format!("unknown token {token:?}")))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::cancel::CancelFlag;
	use pretty_assertions::assert_eq;

	#[test]
	fn writes_sorted_nodes() {
		let mut chain = Chain::new();
		chain.ingest(["b", "a", "c", "a", "b"], &CancelFlag::new());
		assert_eq!(write(&chain), "a 1 b 1 c\nb 1 a\nc 1 a\n");
	}

	#[test]
	fn reads_forward_references() {
		let chain = read("a 2 zebra\nzebra\n").unwrap();
		assert_eq!(chain.count(), 2);
		let edge = &chain.get("a").unwrap().successors()[0];
		assert_eq!(edge.count(), 2);
		assert_eq!(chain.node(edge.target()).token(), "zebra");
		assert!(!chain.is_finalized());
	}

	#[test]
	fn skips_blank_lines() {
		let chain = read("\na 1 b\n\nb\n").unwrap();
		assert_eq!(chain.count(), 2);
	}

	#[test]
	fn rejects_malformed_lines() {
		assert!(matches!(read("a x b\nb\n"), Err(Error::Parse { line: 1, .. })));
		assert!(matches!(read("a\nb 1\n"), Err(Error::Parse { line: 2, .. })));
		assert!(matches!(read("a 1 ghost\n"), Err(Error::Parse { line: 1, .. })));
		assert!(matches!(read("a 0 a\n"), Err(Error::Parse { line: 1, .. })));
	}

	#[test]
	fn whitespace_tokens_are_not_representable() {
		let mut chain = Chain::new();
		chain.ingest(["new york"], &CancelFlag::new());
		assert!(check(&chain).is_err());
	}
}
