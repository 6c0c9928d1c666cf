//! Size-bounded encoding of files dropped into a dialog.

use std::io::{self, Read};
use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use palaver_domain::FileMessage;
use tracing::{debug, warn};

/// Read chunk size.
pub const CHUNK_SIZE: usize = 1024;

#[derive(Debug, thiserror::Error)]
pub enum AttachmentError {
	/// The payload is larger than the configured limit.
	#[error("file too large (max {max_bytes} bytes)")]
	TooLarge { max_bytes: u64 },

	#[error("attachment needs a file name")]
	EmptyFilename,

	#[error("read failed: {0}")]
	Io(#[from] io::Error),
}

/// Read `reader` to the end and wrap it as a file payload.
///
/// Reading stops with [`AttachmentError::TooLarge`] as soon as more than
/// `max_bytes` have been read. Only the last path component of `filename`
/// is kept.
pub fn encode_attachment<R: Read>(mut reader: R, filename: &str, max_bytes: u64) -> Result<FileMessage, AttachmentError> {
	let filename = Path::new(filename.trim())
		.file_name()
		.and_then(|n| n.to_str())
		.filter(|n| !n.trim().is_empty())
		.ok_or(AttachmentError::EmptyFilename)?
		.to_string();

	let mut data = Vec::new();
	let mut chunk = [0u8; CHUNK_SIZE];
	loop {
		let n = match reader.read(&mut chunk) {
			Ok(0) => break,
			Ok(n) => n,
			Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
			Err(e) => return Err(e.into()),
		};
		data.extend_from_slice(&chunk[..n]);
		if data.len() as u64 > max_bytes {
			warn!(filename = %filename, max_bytes, "attachment refused: too large");
			return Err(AttachmentError::TooLarge { max_bytes });
		}
	}

	debug!(filename = %filename, bytes = data.len(), "attachment encoded");
	Ok(FileMessage {
		raw_data: STANDARD.encode(&data),
		filename,
	})
}

/// Decode the payload of a received file message.
pub fn decode_attachment(file: &FileMessage) -> Result<Vec<u8>, base64::DecodeError> {
	STANDARD.decode(file.raw_data.as_bytes())
}
