use super::edge::Edge;
use super::NodeId;

/// Residuals closer to zero than this are snapped to exactly zero.
pub const THRESHOLD_EPSILON: f64 = 1e-9;

/// A vertex of the Markov chain: one distinct token.
///
/// Conceptually, this is a state of a first-order chain where outgoing edges
/// are weighted by their number of observations.
///
/// ## Invariants
/// - Successors are sorted by target token (ascending)
/// - At most one edge per target node
/// - Each edge count is strictly positive
#[derive(Clone, Debug)]
pub struct Node {
	token: String,
	id: NodeId,
	successors: Vec<Edge>,
}

impl Node {
	pub(crate) fn new(token: &str, id: NodeId) -> Self {
		Self { token: token.to_owned(), id, successors: Vec::new() }
	}

	pub fn token(&self) -> &str {
		&self.token
	}

	/// Stable arena id, also used as the key of the structured format.
	pub fn id(&self) -> NodeId {
		self.id
	}

	pub fn successors(&self) -> &[Edge] {
		&self.successors
	}

	/// Sum of all outgoing edge counts.
	pub fn total(&self) -> u64 {
		self.successors.iter().map(Edge::count).sum()
	}

	pub(crate) fn successors_mut(&mut self) -> &mut Vec<Edge> {
		&mut self.successors
	}

	/// Recomputes the selection threshold of every outgoing edge.
	///
	/// Walking the edges in stored order, each threshold is the probability
	/// mass remaining once this edge and all previous ones are accounted for.
	/// The sequence is non-increasing and ends at 0.
	pub(crate) fn compute_thresholds(&mut self) {
		let total = self.total();
		if total == 0 {
			return;
		}

		let mut residual = 1.0_f64;
		for edge in &mut self.successors {
			residual -= edge.count() as f64 / total as f64;
			residual = if residual.abs() < THRESHOLD_EPSILON { 0.0 } else { residual.max(0.0) };
			edge.set_threshold(residual);
		}
	}

	/// Picks the successor for the uniform draw `u` in `(0, 1)`.
	///
	/// Returns the target of the first edge whose threshold is below `u`, or
	/// `None` when no edge qualifies (including a node without successors).
	pub fn select_successor(&self, u: f64) -> Option<NodeId> {
		self.successors
			.iter()
			.find(|edge| edge.threshold() < u)
			.map(Edge::target)
	}
}
