use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{Error, Result};

/// Directory holding `path`, used for the scratch file of an atomic write.
///
/// Example:
/// `data/chain.json` → `data`, `chain.json` → `.`
pub(crate) fn parent_dir(path: &Path) -> &Path {
	match path.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => parent,
		_ => Path::new("."),
	}
}

/// Writes `bytes` to a scratch file next to `path`, then renames it over `path`.
///
/// Readers never observe a partially written destination.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
	let failed = |io: std::io::Error| Error::Write { path: path.to_path_buf(), io };

	let mut scratch = NamedTempFile::new_in(parent_dir(path)).map_err(failed)?;
	scratch.write_all(bytes).map_err(failed)?;
	scratch.as_file().sync_all().map_err(failed)?;
	scratch.persist(path).map_err(|e| failed(e.error))?;
	Ok(())
}

/// Display name of a source path: its file name, or the path itself.
///
/// Examples:
/// - `"./data/book.txt"` → `"book.txt"`
/// - `"/"` → `"/"`
pub fn display_name<P: AsRef<Path>>(path: P) -> String {
	let path = path.as_ref();
	path.file_name()
		.map(|name| name.to_string_lossy().to_string())
		.unwrap_or_else(|| path.display().to_string())
}

/// Lists all files with a given extension in a directory, sorted by path.
pub fn list_files<P: AsRef<Path>>(dir: P, extension: &str) -> std::io::Result<Vec<PathBuf>> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir)? {
		let path = entry?.path();
		if path.is_file() && path.extension() == Some(std::ffi::OsStr::new(extension)) {
			files.push(path);
		}
	}

	files.sort();
	Ok(files)
}

/// Expands `inputs` into files: directories contribute their `extension`
/// files, plain paths are kept as given.
pub fn expand_inputs(inputs: &[PathBuf], extension: &str) -> std::io::Result<Vec<PathBuf>> {
	let mut files = Vec::new();
	for input in inputs {
		if input.is_dir() {
			files.extend(list_files(input, extension)?);
		} else {
			files.push(input.clone());
		}
	}
	Ok(files)
}
