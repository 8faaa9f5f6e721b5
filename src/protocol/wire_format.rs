//! Wire format encoding and decoding of the frame prelude.
//!
//! Every frame starts with a 12-byte prelude block:
//! ```text
//! ┌──────────────┬────────────────┬──────────────┐
//! │ Total Length │ Headers Length │ Prelude CRC  │
//! │ 4 bytes      │ 4 bytes        │ 4 bytes      │
//! │ uint32 BE    │ uint32 BE      │ uint32 BE    │
//! └──────────────┴────────────────┴──────────────┘
//! ```
//!
//! followed by the header block, the payload and a trailing 4-byte message
//! CRC. All multi-byte integers are Big Endian.

use super::checksum::crc32;
use crate::error::{ChecksumKind, EventStreamError, Result};

/// Size of the prelude without its CRC (total length + headers length).
pub const PRELUDE_SIZE: usize = 8;

/// Size of the prelude including its CRC.
pub const PRELUDE_WITH_CRC_SIZE: usize = PRELUDE_SIZE + CRC_SIZE;

/// Size of each CRC field.
pub const CRC_SIZE: usize = 4;

/// Smallest possible frame: prelude, prelude CRC and message CRC.
pub const MIN_FRAME_SIZE: usize = PRELUDE_WITH_CRC_SIZE + CRC_SIZE;

/// Default maximum total frame length (16 MB).
pub const MAX_MESSAGE_SIZE: u32 = 16 * 1024 * 1024;

/// Default maximum header block length (128 KB).
pub const MAX_HEADERS_SIZE: u32 = 128 * 1024;

/// Decoded frame prelude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prelude {
    /// Length of the whole frame in bytes, CRCs included.
    pub total_length: u32,
    /// Length of the encoded header block in bytes.
    pub headers_length: u32,
}

impl Prelude {
    /// Create a new prelude.
    pub fn new(total_length: u32, headers_length: u32) -> Self {
        Self {
            total_length,
            headers_length,
        }
    }

    /// Compute the prelude for a frame carrying the given header block and payload.
    ///
    /// Fails with an encoding error if the frame would not fit the default limits.
    pub fn for_frame(headers_length: usize, payload_length: usize) -> Result<Self> {
        if headers_length > MAX_HEADERS_SIZE as usize {
            return Err(EventStreamError::Encoding(format!(
                "Headers length {} exceeds maximum {}",
                headers_length, MAX_HEADERS_SIZE
            )));
        }

        let total_length = MIN_FRAME_SIZE + headers_length + payload_length;
        if total_length > MAX_MESSAGE_SIZE as usize {
            return Err(EventStreamError::Encoding(format!(
                "Message length {} exceeds maximum {}",
                total_length, MAX_MESSAGE_SIZE
            )));
        }

        Ok(Self::new(total_length as u32, headers_length as u32))
    }

    /// Encode the 8-byte prelude (Big Endian).
    ///
    /// # Example
    ///
    /// ```
    /// use aws_event_stream::protocol::Prelude;
    ///
    /// let bytes = Prelude::new(16, 0).encode();
    /// assert_eq!(bytes, [0, 0, 0, 16, 0, 0, 0, 0]);
    /// ```
    pub fn encode(&self) -> [u8; PRELUDE_SIZE] {
        let mut buf = [0u8; PRELUDE_SIZE];
        buf[0..4].copy_from_slice(&self.total_length.to_be_bytes());
        buf[4..8].copy_from_slice(&self.headers_length.to_be_bytes());
        buf
    }

    /// Encode the prelude followed by its CRC.
    pub fn encode_with_crc(&self) -> [u8; PRELUDE_WITH_CRC_SIZE] {
        let prelude = self.encode();
        let mut buf = [0u8; PRELUDE_WITH_CRC_SIZE];
        buf[..PRELUDE_SIZE].copy_from_slice(&prelude);
        buf[PRELUDE_SIZE..].copy_from_slice(&crc32(&prelude).to_be_bytes());
        buf
    }

    /// Decode the prelude from bytes without checking its CRC.
    ///
    /// Returns `None` if buffer is too short.
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < PRELUDE_SIZE {
            return None;
        }
        Some(Self {
            total_length: read_u32(buf, 0),
            headers_length: read_u32(buf, 4),
        })
    }

    /// Decode the prelude and verify the prelude CRC that follows it.
    ///
    /// Returns `Ok(None)` if fewer than 12 bytes are available.
    pub fn decode_checked(buf: &[u8]) -> Result<Option<Self>> {
        if buf.len() < PRELUDE_WITH_CRC_SIZE {
            return Ok(None);
        }

        let expected = read_u32(buf, PRELUDE_SIZE);
        let computed = crc32(&buf[..PRELUDE_SIZE]);
        if expected != computed {
            return Err(EventStreamError::Checksum {
                kind: ChecksumKind::Prelude,
                expected,
                computed,
            });
        }

        Ok(Self::decode(buf))
    }

    /// Validate the declared lengths.
    ///
    /// Checks:
    /// - Total length covers at least prelude, prelude CRC and message CRC
    /// - Header block fits inside the frame
    /// - Neither length exceeds the given maximums
    pub fn validate(&self, max_message_size: u32, max_headers_size: u32) -> Result<()> {
        if (self.total_length as usize) < MIN_FRAME_SIZE {
            return Err(EventStreamError::Protocol(format!(
                "Total length {} is smaller than the minimum frame size {}",
                self.total_length, MIN_FRAME_SIZE
            )));
        }

        if self.headers_length > self.total_length - MIN_FRAME_SIZE as u32 {
            return Err(EventStreamError::Protocol(format!(
                "Headers length {} does not fit in a frame of total length {}",
                self.headers_length, self.total_length
            )));
        }

        if self.total_length > max_message_size {
            return Err(EventStreamError::Protocol(format!(
                "Message size {} exceeds maximum {}",
                self.total_length, max_message_size
            )));
        }

        if self.headers_length > max_headers_size {
            return Err(EventStreamError::Protocol(format!(
                "Headers size {} exceeds maximum {}",
                self.headers_length, max_headers_size
            )));
        }

        Ok(())
    }

    /// Payload length implied by the prelude.
    ///
    /// Only meaningful after [`Prelude::validate`] succeeded.
    #[inline]
    pub fn payload_length(&self) -> u32 {
        self.total_length - self.headers_length - MIN_FRAME_SIZE as u32
    }

    /// Offset of the trailing message CRC.
    #[inline]
    pub fn message_crc_offset(&self) -> usize {
        self.total_length as usize - CRC_SIZE
    }
}

/// Read a Big Endian u32 at `offset`. Caller guarantees the bounds.
#[inline]
pub(crate) fn read_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ])
}
