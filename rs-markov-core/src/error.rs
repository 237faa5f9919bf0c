use std::path::PathBuf;

/// Errors raised while building, persisting or walking a chain.
///
/// Cancellation of an ingestion run is not an error, and neither is a node
/// without successors: both are ordinary outcomes handled by the caller.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// A text source could not be opened or read. Ingestion skips it.
	#[error("Cannot read source '{source_name}': {io}")]
	SourceRead {
		source_name: String,
		#[source]
		io: std::io::Error,
	},

	/// A persisted chain is malformed. `line` is 0 when no line applies.
	#[error("Parse error at line {line}: {message}")]
	Parse { line: usize, message: String },

	#[error("Structured payload error: {0}")]
	Json(#[from] serde_json::Error),

	/// The destination could not be written. The previous file, if any, is left untouched.
	#[error("Cannot write '{}': {io}", path.display())]
	Write {
		path: PathBuf,
		#[source]
		io: std::io::Error,
	},

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("The chain has no nodes")]
	EmptyChain,

	#[error("The chain changed since the last finalize")]
	NotFinalized,

	#[error("Invalid input: {0}")]
	InvalidInput(String),

	#[error("Ingestion worker panicked")]
	WorkerPanicked,
}

impl Error {
	pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
		Self::Parse { line, message: message.into() }
	}
}

pub type Result<T> = std::result::Result<T, Error>;
