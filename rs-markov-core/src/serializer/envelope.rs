use std::borrow::Cow;
use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;

use crate::error::{Error, Result};

/// Prefix marking a compressed payload.
pub const MAGIC: &[u8; 4] = b"MRKV";

/// Size of the big-endian uncompressed length stored after [`MAGIC`].
const LENGTH_SIZE: usize = 4;

/// Wraps `payload` as `MAGIC`, uncompressed length (u32, big-endian), zlib stream.
pub fn compress(payload: &[u8]) -> Result<Vec<u8>> {
	let length = u32::try_from(payload.len())
		.map_err(|_| Error::InvalidInput("payload too large to compress".to_owned()))?;

	let mut out = Vec::with_capacity(MAGIC.len() + LENGTH_SIZE + payload.len() / 2);
	out.extend_from_slice(MAGIC);
	out.extend_from_slice(&length.to_be_bytes());

	let mut encoder = ZlibEncoder::new(out, Compression::best());
	encoder.write_all(payload)?;
	Ok(encoder.finish()?)
}

pub fn is_compressed(bytes: &[u8]) -> bool {
	bytes.starts_with(MAGIC)
}

/// Returns the plain payload of `bytes`.
///
/// Without the magic prefix the input is already plain and is borrowed as-is.
pub fn open(bytes: &[u8]) -> Result<Cow<'_, [u8]>> {
	let Some(rest) = bytes.strip_prefix(MAGIC.as_slice()) else {
		return Ok(Cow::Borrowed(bytes));
	};

	if rest.len() < LENGTH_SIZE {
		return Err(Error::parse(0, "truncated compression header"));
	}
	let (header, stream) = rest.split_at(LENGTH_SIZE);
	let mut length = [0u8; LENGTH_SIZE];
	length.copy_from_slice(header);
	let expected = u32::from_be_bytes(length) as usize;

	let mut payload = Vec::new();
	ZlibDecoder::new(stream)
		.read_to_end(&mut payload)
		.map_err(|e| Error::parse(0, format!("corrupt compressed payload: {e}")))?;

	if payload.len() != expected {
		return Err(Error::parse(
			0,
			format!("compressed payload holds {} bytes, header announces {expected}", payload.len()),
		));
	}
	Ok(Cow::Owned(payload))
}
