use crate::error::{Error, Result};

/// Default number of tokens emitted by a walk.
pub const DEFAULT_LENGTH: usize = 500;

/// Parameters of a generation walk.
///
/// # Responsibilities
/// - Bound the number of emitted tokens (`length`, always >= 1)
/// - Toggle the uppercase sentence-start heuristic
/// - Toggle the restart marker when rendering
/// - Optionally pin the random seed for reproducible output
#[derive(Clone, Debug, PartialEq)]
pub struct WalkInput {
	/// Number of tokens to emit.
	length: usize,

	/// Prefer start nodes whose token begins with an uppercase letter.
	pub sentence_start: bool,

	/// Render each restart as a ` \` line continuation.
	pub mark_restarts: bool,

	/// Fixed seed. `None` seeds once from the wall clock.
	pub seed: Option<u64>,
}

impl Default for WalkInput {
	fn default() -> Self {
		Self { length: DEFAULT_LENGTH, sentence_start: false, mark_restarts: false, seed: None }
	}
}

impl WalkInput {
	/// Creates an input emitting `length` tokens.
	///
	/// # Errors
	/// Returns an error if `length` is 0.
	pub fn new(length: usize) -> Result<Self> {
		let mut input = Self::default();
		input.set_length(length)?;
		Ok(input)
	}

	pub fn length(&self) -> usize {
		self.length
	}

	/// Sets the number of tokens to emit.
	///
	/// # Errors
	/// Returns an error if `length` is 0.
	pub fn set_length(&mut self, length: usize) -> Result<()> {
		if length == 0 {
			return Err(Error::InvalidInput("length must be >= 1".to_owned()));
		}
		self.length = length;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rejects_empty_walks() {
		assert!(WalkInput::new(0).is_err());
		let mut input = WalkInput::default();
		assert!(input.set_length(0).is_err());
		assert_eq!(input.length(), DEFAULT_LENGTH);
	}

	#[test]
	fn accepts_positive_lengths() {
		let input = WalkInput::new(12).unwrap();
		assert_eq!(input.length(), 12);
		assert_eq!(input.seed, None);
	}
}
