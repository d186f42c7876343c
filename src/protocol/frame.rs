//! Message framing
//!
//! ## Wire Format
//! ```text
//! ┌──────────────┬─────────────────────────────────┐
//! │ Length (4)   │  Body (header + message)        │
//! └──────────────┴─────────────────────────────────┘
//! ```
//!
//! The length is a big-endian signed int32 counting body bytes only. The
//! body is always serialized first so its length is known before the prefix
//! is written.

use std::io::{self, Read, Write};

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{KraftError, Result};
use super::codec::{take, take_array, Wire};

/// Size of the length prefix
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Maximum accepted body size (100 MB)
pub const MAX_FRAME_SIZE: usize = 100 * 1024 * 1024;

/// Serialize a body with `write_body`, then prefix it with its length
pub fn encode_frame(write_body: impl FnOnce(&mut BytesMut)) -> Bytes {
    let mut body = BytesMut::new();
    write_body(&mut body);

    let mut frame = BytesMut::with_capacity(LENGTH_PREFIX_SIZE + body.len());
    frame.put_i32(body.len() as i32);
    frame.put_slice(&body);
    frame.freeze()
}

fn check_length(len: i32) -> Result<usize> {
    if len < 0 || len as usize > MAX_FRAME_SIZE {
        return Err(KraftError::InvalidLength(i64::from(len)));
    }
    Ok(len as usize)
}

/// Split one frame off the front of `bytes`
///
/// Returns the body and the total bytes consumed (prefix included)
pub fn decode_frame(bytes: &[u8]) -> Result<(&[u8], usize)> {
    let mut cursor = bytes;
    let len = check_length(i32::decode(&mut cursor)?)?;
    let body = take(&mut cursor, len)?;
    Ok((body, LENGTH_PREFIX_SIZE + len))
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one complete frame body from a stream
///
/// Blocks until the whole frame is received or an error occurs
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Bytes> {
    let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
    reader.read_exact(&mut prefix)?;

    let mut cursor: &[u8] = &prefix;
    let len = check_length(i32::from_be_bytes(take_array(&mut cursor)?))?;

    // Grow with the bytes actually received rather than trusting the prefix
    let mut body = Vec::new();
    reader.take(len as u64).read_to_end(&mut body)?;
    if body.len() < len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("frame body ended after {} of {} bytes", body.len(), len),
        )
        .into());
    }
    Ok(Bytes::from(body))
}

/// Write an already framed message to a stream
pub fn write_frame<W: Write>(writer: &mut W, frame: &[u8]) -> Result<()> {
    writer.write_all(frame)?;
    writer.flush()?;
    Ok(())
}
