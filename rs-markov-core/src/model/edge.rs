use super::NodeId;

/// Directed arc from its owning [`Node`](super::node::Node) to `target`.
///
/// The target is addressed by arena index; the node itself stays owned by the
/// chain. `threshold` is only meaningful after the chain has been finalized.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
	target: NodeId,
	count: u64,
	threshold: f64,
}

impl Edge {
	pub(crate) fn new(target: NodeId, count: u64) -> Self {
		Self { target, count, threshold: 1.0 }
	}

	pub fn target(&self) -> NodeId {
		self.target
	}

	/// Number of times this transition was observed.
	pub fn count(&self) -> u64 {
		self.count
	}

	/// Residual probability mass left after this edge, in `[0, 1]`.
	pub fn threshold(&self) -> f64 {
		self.threshold
	}

	pub(crate) fn increase(&mut self, by: u64) {
		self.count += by;
	}

	pub(crate) fn set_threshold(&mut self, threshold: f64) {
		self.threshold = threshold;
	}
}
