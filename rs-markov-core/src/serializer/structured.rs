//! Structured (JSON) format: a map from node id to
//! `{token, id, successors: [{count, node_id}]}`.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::NodeId;
use crate::model::chain::Chain;

#[derive(Serialize, Deserialize, Debug)]
struct NodeRecord {
	token: String,
	id: NodeId,
	successors: Vec<SuccessorRecord>,
}

#[derive(Serialize, Deserialize, Debug)]
struct SuccessorRecord {
	count: u64,
	node_id: NodeId,
}

pub fn write(chain: &Chain) -> Result<Vec<u8>> {
	let records: BTreeMap<NodeId, NodeRecord> = chain
		.nodes()
		.map(|node| {
			let successors = node
				.successors()
				.iter()
				.map(|edge| SuccessorRecord { count: edge.count(), node_id: edge.target() })
				.collect();
			(node.id(), NodeRecord { token: node.token().to_owned(), id: node.id(), successors })
		})
		.collect();

	Ok(serde_json::to_vec_pretty(&records)?)
}

/// Parses the structured format.
///
/// Phase 1 materializes every node and keeps its successor descriptors
/// unresolved; phase 2 resolves each `node_id` against the complete node set.
/// The returned chain is not finalized.
pub fn read(bytes: &[u8]) -> Result<Chain> {
	let records: BTreeMap<NodeId, NodeRecord> = serde_json::from_slice(bytes)?;

	let mut chain = Chain::new();
	let mut ids: HashMap<NodeId, NodeId> = HashMap::with_capacity(records.len());
	let mut pending = Vec::with_capacity(records.len());

	for (key, record) in &records {
		if *key != record.id {
			return Err(Error::parse(0, format!("node key {key} holds id {}", record.id)));
		}
		if record.token.is_empty() {
			return Err(Error::parse(0, format!("node {key} has an empty token")));
		}
		if chain.get(&record.token).is_some() {
			return Err(Error::parse(0, format!("duplicate token {:?}", record.token)));
		}
		ids.insert(record.id, chain.intern(&record.token));
		pending.push((record.id, &record.successors));
	}

	for (id, successors) in pending {
		let from = ids[&id];
		for successor in successors {
			let to = *ids.get(&successor.node_id).ok_or_else(|| {
				Error::parse(0, format!("node {id} references unknown node {}", successor.node_id))
			})?;
			if successor.count == 0 {
				return Err(Error::parse(0, format!("node {id} has an edge with count 0")));
			}
			chain.link(from, to, successor.count);
		}
	}

	Ok(chain)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::cancel::CancelFlag;

	#[test]
	fn writes_id_keyed_records() {
		let mut chain = Chain::new();
		chain.ingest(["a", "b"], &CancelFlag::new());
		let value: serde_json::Value = serde_json::from_slice(&write(&chain).unwrap()).unwrap();

		assert_eq!(value["0"]["token"], "a");
		assert_eq!(value["0"]["successors"][0]["count"], 1);
		assert_eq!(value["0"]["successors"][0]["node_id"], 1);
		assert_eq!(value["1"]["successors"].as_array().unwrap().len(), 0);
	}

	#[test]
	fn resolves_ids_declared_later() {
		let json = br#"{
			"0": {"token": "a", "id": 0, "successors": [{"count": 3, "node_id": 7}]},
			"7": {"token": "z", "id": 7, "successors": []}
		}"#;
		let chain = read(json).unwrap();
		let edge = &chain.get("a").unwrap().successors()[0];
		assert_eq!(edge.count(), 3);
		assert_eq!(chain.node(edge.target()).token(), "z");
	}

	#[test]
	fn rejects_dangling_references() {
		let json = br#"{"0": {"token": "a", "id": 0, "successors": [{"count": 1, "node_id": 4}]}}"#;
		assert!(matches!(read(json), Err(Error::Parse { .. })));
	}

	#[test]
	fn rejects_mismatched_keys_and_duplicates() {
		let mismatched = br#"{"0": {"token": "a", "id": 1, "successors": []}}"#;
		assert!(matches!(read(mismatched), Err(Error::Parse { .. })));

		let duplicated = br#"{
			"0": {"token": "a", "id": 0, "successors": []},
			"1": {"token": "a", "id": 1, "successors": []}
		}"#;
		assert!(matches!(read(duplicated), Err(Error::Parse { .. })));
	}

	#[test]
	fn rejects_invalid_json() {
		assert!(matches!(read(b"{not json"), Err(Error::Json(_))));
	}
}
