//! Markov chain model and generation.
//!
//! This module provides:
//! - The token graph (`Chain`, `Node`, `Edge`)
//! - Threshold computation and weighted successor selection
//! - A random-walk generator (`Generator`) configured by `WalkInput`

/// Arena index of a node inside its chain.
pub type NodeId = usize;

/// Token graph: node arena, token index, sorted positional access,
/// ingestion and merging.
pub mod chain;

/// Directed, counted arc between two nodes.
pub mod edge;

/// Weighted random walk producing token sequences and rendered text.
pub mod generator;

/// Graph vertex holding sorted outgoing edges and their thresholds.
pub mod node;

/// Generation parameters (length, start heuristic, restart marker, seed).
pub mod walk_input;
