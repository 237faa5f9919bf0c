//! On-disk chain formats.
//!
//! Two payloads are supported, both optionally wrapped in a compression
//! envelope:
//! - the line format (`lines`), one node per line
//! - the structured format (`structured`), JSON keyed by node id
//!
//! The destination name picks both: a `.json`/`.jsonz` extension selects the
//! structured format, and a name ending in `z` is compressed.

use std::fs;
use std::path::Path;

use log::info;

use crate::error::{Error, Result};
use crate::io::write_atomic;
use crate::model::chain::Chain;

/// `MRKV` compression envelope.
pub mod envelope;

/// `<token> (<count> <target>)*` per line.
pub mod lines;

/// JSON map from node id to token and successor ids.
pub mod structured;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
	Lines,
	Structured,
}

impl Format {
	/// Picks the format paired with a file name.
	pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
		let extension = path
			.as_ref()
			.extension()
			.map(|extension| extension.to_string_lossy().to_ascii_lowercase());
		match extension.as_deref() {
			Some("json") | Some("jsonz") => Self::Structured,
			_ => Self::Lines,
		}
	}
}

/// Whether saving to `path` uses the compression envelope.
pub fn wants_compression<P: AsRef<Path>>(path: P) -> bool {
	path.as_ref()
		.file_name()
		.is_some_and(|name| name.to_string_lossy().ends_with('z'))
}

/// Serializes `chain` to a plain (uncompressed) payload.
pub fn encode(chain: &Chain, format: Format) -> Result<Vec<u8>> {
	match format {
		Format::Lines => {
			lines::check(chain)?;
			Ok(lines::write(chain).into_bytes())
		}
		Format::Structured => structured::write(chain),
	}
}

/// Parses a payload, compressed or not. The returned chain is not finalized.
pub fn decode(bytes: &[u8], format: Format) -> Result<Chain> {
	let payload = envelope::open(bytes)?;
	match format {
		Format::Lines => {
			let text = std::str::from_utf8(&payload)
				.map_err(|e| Error::parse(0, format!("line format is not UTF-8: {e}")))?;
			lines::read(text)
		}
		Format::Structured => structured::read(&payload),
	}
}

/// Writes `chain` to `path` in the format and envelope paired with its name.
///
/// # Parameters
/// - `chain`: saved as raw counts; thresholds are not persisted.
/// - `path`: `.json`/`.jsonz` selects the structured format, any other name
///   the line format. A name ending in `z` is compressed.
///
/// # Behavior
/// - Builds the whole payload in memory, then writes it to a scratch file
///   next to `path` and renames it into place.
///
/// # Errors
/// - `InvalidInput` if a token contains whitespace and the line format was
///   selected. Nothing is written.
/// - `Write` if the destination cannot be written. Any existing file at
///   `path` is left untouched.
pub fn save<P: AsRef<Path>>(chain: &Chain, path: P) -> Result<()> {
	let path = path.as_ref();
	let format = Format::from_path(path);
	let compressed = wants_compression(path);

	let mut bytes = encode(chain, format)?;
	if compressed {
		bytes = envelope::compress(&bytes)?;
	}
	write_atomic(path, &bytes)?;

	info!(
		"Saved {} nodes to {} ({:?}, {} bytes{})",
		chain.count(),
		path.display(),
		format,
		bytes.len(),
		if compressed { ", compressed" } else { "" }
	);
	Ok(())
}

/// Reads a chain from `path`.
///
/// # Behavior
/// - The format is picked from the name, as for [`save`]. Compression is
///   detected from the content, so a plain payload under a `z` name loads too.
/// - Returns a new chain; nothing is merged into an existing one.
///
/// # Errors
/// - `Io` if the file cannot be read.
/// - `Parse` or `Json` if the payload is malformed.
///
/// # Notes
/// - The chain is not finalized. Call `finalize` before generating from it.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Chain> {
	let path = path.as_ref();
	let bytes = fs::read(path)?;
	let chain = decode(&bytes, Format::from_path(path))?;
	info!("Loaded {} nodes from {}", chain.count(), path.display());
	Ok(chain)
}
