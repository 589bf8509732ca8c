//! Length-prefixed framing for [`Message`] values.
//!
//! Each frame is a six byte header followed by the payload:
//!
//! ```text
//! +------------+----------------+-----------------+
//! | type (u16) | length (u32)   | payload         |
//! +------------+----------------+-----------------+
//! ```
//!
//! Integers are big-endian. Payloads above [`MAX_PAYLOAD_BYTES`] are refused
//! before any allocation so a hostile length cannot exhaust memory.

use std::io::{self, Read, Write};

use thiserror::Error;

use crate::message::{Message, MessageType};

/// Size of the fixed frame header in bytes.
pub const HEADER_LEN: usize = 6;

/// Largest payload accepted in either direction.
pub const MAX_PAYLOAD_BYTES: usize = 64 * 1024;

/// Errors raised while reading or writing frames.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The declared payload length exceeds [`MAX_PAYLOAD_BYTES`].
    #[error("payload too large: {size} bytes exceeds {max_size} byte limit")]
    PayloadTooLarge {
        /// Declared or actual payload size.
        size: usize,
        /// Configured maximum.
        max_size: usize,
    },
    /// The underlying stream failed, closed early, or timed out.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl CodecError {
    /// Returns true when the failure was caused by an expired deadline.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Io(error) if error.kind() == io::ErrorKind::TimedOut)
    }
}

/// Reads exactly one frame from `reader`.
///
/// # Errors
///
/// Returns [`CodecError::Io`] when the stream fails or ends mid-frame and
/// [`CodecError::PayloadTooLarge`] for oversize frames.
#[expect(
    clippy::big_endian_bytes,
    reason = "the frame header is defined in network byte order"
)]
pub fn read_message<R: Read>(reader: &mut R) -> Result<Message, CodecError> {
    let mut header = [0_u8; HEADER_LEN];
    reader.read_exact(&mut header)?;
    let [t0, t1, l0, l1, l2, l3] = header;
    let kind = MessageType::new(u16::from_be_bytes([t0, t1]));
    let size = usize::try_from(u32::from_be_bytes([l0, l1, l2, l3])).unwrap_or(usize::MAX);
    enforce_limit(size)?;

    let mut payload = vec![0_u8; size];
    reader.read_exact(&mut payload)?;
    Ok(Message::new(kind, payload))
}

/// Writes `message` as one frame and flushes `writer`.
///
/// # Errors
///
/// Returns [`CodecError::PayloadTooLarge`] for oversize payloads and
/// [`CodecError::Io`] when writing fails.
#[expect(
    clippy::big_endian_bytes,
    reason = "the frame header is defined in network byte order"
)]
pub fn write_message<W: Write>(writer: &mut W, message: &Message) -> Result<(), CodecError> {
    let payload = message.payload();
    enforce_limit(payload.len())?;
    let length = u32::try_from(payload.len()).map_err(|_| CodecError::PayloadTooLarge {
        size: payload.len(),
        max_size: MAX_PAYLOAD_BYTES,
    })?;

    let mut frame = Vec::with_capacity(HEADER_LEN + payload.len());
    frame.extend_from_slice(&message.kind().raw().to_be_bytes());
    frame.extend_from_slice(&length.to_be_bytes());
    frame.extend_from_slice(payload);
    writer.write_all(&frame)?;
    writer.flush()?;
    Ok(())
}

const fn enforce_limit(size: usize) -> Result<(), CodecError> {
    if size > MAX_PAYLOAD_BYTES {
        return Err(CodecError::PayloadTooLarge {
            size,
            max_size: MAX_PAYLOAD_BYTES,
        });
    }
    Ok(())
}
