use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared cancellation flag for ingestion.
///
/// Clones observe the same flag. Setting it stops the running ingestion at
/// the next token; everything merged so far is kept.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn cancel(&self) {
		self.0.store(true, Ordering::SeqCst);
	}

	pub fn is_cancelled(&self) -> bool {
		self.0.load(Ordering::SeqCst)
	}

	/// Clears the flag so the next ingestion runs to completion.
	pub fn reset(&self) {
		self.0.store(false, Ordering::SeqCst);
	}
}
