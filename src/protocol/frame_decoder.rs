//! Streaming frame decoder.
//!
//! Uses `bytes::BytesMut` as the accumulator. The decoder keeps no stored
//! parse state beyond the buffered bytes; every call works out its phase
//! from how much is buffered:
//! - `AwaitingPrelude`: fewer than 12 bytes buffered
//! - `AwaitingFullFrame`: prelude verified, fewer than `total_length` bytes buffered
//!
//! Any checksum or protocol failure poisons the decoder. The format has no
//! resynchronization markers, so the stream must be abandoned.
//!
//! # Example
//!
//! ```
//! use aws_event_stream::protocol::{FrameDecoder, Message};
//!
//! let frame = Message::builder()
//!     .header(":event-type", "AudioEvent")
//!     .build()
//!     .unwrap()
//!     .encode()
//!     .unwrap();
//!
//! let mut decoder = FrameDecoder::new();
//! let mut messages = Vec::new();
//!
//! // Data arrives in chunks from the transport
//! for chunk in frame.chunks(5) {
//!     messages.extend(decoder.push(chunk).unwrap());
//! }
//! assert_eq!(messages.len(), 1);
//! ```

use bytes::BytesMut;

use super::message::Message;
use super::wire_format::{Prelude, PRELUDE_WITH_CRC_SIZE};
use crate::config::DecoderConfig;
use crate::error::{EventStreamError, Result};

/// Which part of a frame the decoder is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderPhase {
    /// Fewer than 12 bytes buffered.
    AwaitingPrelude,
    /// Prelude verified; waiting for the rest of the frame.
    AwaitingFullFrame { total_length: u32 },
}

/// Incremental decoder for one event stream.
///
/// Feed it bytes as they arrive; it yields fully validated messages.
/// Bound to a single stream and must be called sequentially.
pub struct FrameDecoder {
    /// Bytes received but not yet consumed by a complete frame.
    buffer: BytesMut,
    /// Size limits.
    config: DecoderConfig,
    /// Set once a decode fails.
    poisoned: bool,
}

impl FrameDecoder {
    /// Create a new decoder with default limits.
    ///
    /// Default capacity: 64KB, max message: 16MB, max header block: 128KB.
    pub fn new() -> Self {
        Self::with_config(DecoderConfig::default())
    }

    /// Create a new decoder with custom limits.
    pub fn with_config(config: DecoderConfig) -> Self {
        Self {
            buffer: BytesMut::with_capacity(config.initial_capacity),
            config,
            poisoned: false,
        }
    }

    /// Append `data` and try to decode one message.
    ///
    /// Returns `Ok(None)` when no complete frame is buffered yet. At most one
    /// message is returned per call; call [`FrameDecoder::try_decode`] (or
    /// this method with an empty slice) to drain further buffered frames.
    pub fn decode_frame(&mut self, data: &[u8]) -> Result<Option<Message>> {
        if self.poisoned {
            return Err(EventStreamError::DecoderPoisoned);
        }
        self.buffer.extend_from_slice(data);
        self.try_decode()
    }

    /// Append `data` and decode every complete message now buffered.
    ///
    /// Partial data stays buffered for the next call.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Message>> {
        let mut messages = Vec::new();

        if let Some(message) = self.decode_frame(data)? {
            messages.push(message);
            while let Some(message) = self.try_decode()? {
                messages.push(message);
            }
        }

        Ok(messages)
    }

    /// Try to decode one message from already buffered bytes.
    ///
    /// Returns:
    /// - `Ok(Some(message))` if a complete frame was decoded and consumed
    /// - `Ok(None)` if more data is needed
    /// - `Err(...)` on checksum or protocol failure; the decoder is then poisoned
    pub fn try_decode(&mut self) -> Result<Option<Message>> {
        if self.poisoned {
            return Err(EventStreamError::DecoderPoisoned);
        }

        match self.try_decode_inner() {
            Ok(message) => Ok(message),
            Err(e) => {
                tracing::warn!(buffered = self.buffer.len(), "event stream decode failed: {}", e);
                self.poisoned = true;
                Err(e)
            }
        }
    }

    fn try_decode_inner(&mut self) -> Result<Option<Message>> {
        let prelude = match self.checked_prelude()? {
            Some(prelude) => prelude,
            None => return Ok(None),
        };

        let total_length = prelude.total_length as usize;
        if self.buffer.len() < total_length {
            return Ok(None);
        }

        let frame = self.buffer.split_to(total_length).freeze();
        let message = Message::from_frame(frame, &prelude)?;

        tracing::trace!(
            total_length = prelude.total_length,
            headers = message.headers().len(),
            remaining = self.buffer.len(),
            "decoded event stream frame"
        );
        Ok(Some(message))
    }

    /// Verify and validate the buffered prelude, if there is one.
    fn checked_prelude(&self) -> Result<Option<Prelude>> {
        match Prelude::decode_checked(&self.buffer)? {
            Some(prelude) => {
                prelude.validate(self.config.max_message_size, self.config.max_headers_size)?;
                Ok(Some(prelude))
            }
            None => Ok(None),
        }
    }

    /// Current phase, derived from the buffered bytes.
    ///
    /// A corrupt or invalid prelude reports `AwaitingPrelude`; the next
    /// decode call surfaces the error.
    pub fn phase(&self) -> DecoderPhase {
        if self.buffer.len() < PRELUDE_WITH_CRC_SIZE {
            return DecoderPhase::AwaitingPrelude;
        }
        match self.checked_prelude() {
            Ok(Some(prelude)) => DecoderPhase::AwaitingFullFrame {
                total_length: prelude.total_length,
            },
            _ => DecoderPhase::AwaitingPrelude,
        }
    }

    /// Append data to the buffer without decoding.
    ///
    /// Prefer `decode_frame()` which does extend + decode in one call.
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Get the number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// True once a decode has failed.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Limits in effect.
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChecksumKind;
    use crate::protocol::checksum::crc32;
    use crate::protocol::wire_format::MIN_FRAME_SIZE;

    fn make_message(event_type: &str, payload: &[u8]) -> Message {
        Message::builder()
            .header(":message-type", "event")
            .header(":event-type", event_type)
            .payload(bytes::Bytes::copy_from_slice(payload))
            .build()
            .unwrap()
    }

    fn encode(message: &Message) -> Vec<u8> {
        message.encode().unwrap().to_vec()
    }

    /// Frame with a valid prelude CRC and message CRC but arbitrary lengths.
    fn raw_frame(total_length: u32, headers_length: u32, body: &[u8]) -> Vec<u8> {
        let mut bytes = Prelude::new(total_length, headers_length)
            .encode_with_crc()
            .to_vec();
        bytes.extend_from_slice(body);
        let crc = crc32(&bytes);
        bytes.extend_from_slice(&crc.to_be_bytes());
        bytes
    }

    #[test]
    fn test_single_complete_frame() {
        let mut decoder = FrameDecoder::new();
        let message = make_message("Foo", b"hello");

        let decoded = decoder.decode_frame(&encode(&message)).unwrap();

        assert_eq!(decoded, Some(message));
        assert!(decoder.is_empty());
    }

    #[test]
    fn test_one_message_per_call() {
        let mut decoder = FrameDecoder::new();
        let first = make_message("First", b"1");
        let second = make_message("Second", b"22");

        let mut combined = encode(&first);
        combined.extend(encode(&second));

        assert_eq!(decoder.decode_frame(&combined).unwrap(), Some(first));
        assert!(!decoder.is_empty());
        assert_eq!(decoder.decode_frame(&[]).unwrap(), Some(second));
        assert_eq!(decoder.decode_frame(&[]).unwrap(), None);
        assert!(decoder.is_empty());
    }

    #[test]
    fn test_multiple_frames_in_one_push() {
        let mut decoder = FrameDecoder::new();
        let messages: Vec<Message> = (0..3)
            .map(|i| make_message(&format!("Event{}", i), format!("body {}", i).as_bytes()))
            .collect();

        let combined: Vec<u8> = messages.iter().flat_map(encode).collect();

        assert_eq!(decoder.push(&combined).unwrap(), messages);
        assert!(decoder.is_empty());
    }

    #[test]
    fn test_fragmented_prelude() {
        let mut decoder = FrameDecoder::new();
        let bytes = encode(&make_message("Foo", b"test"));

        assert_eq!(decoder.decode_frame(&bytes[..5]).unwrap(), None);
        assert_eq!(decoder.phase(), DecoderPhase::AwaitingPrelude);
        assert_eq!(decoder.len(), 5);

        assert!(decoder.decode_frame(&bytes[5..]).unwrap().is_some());
        assert!(decoder.is_empty());
    }

    #[test]
    fn test_fragmented_body() {
        let mut decoder = FrameDecoder::new();
        let message = make_message("Foo", b"this is a longer payload that will be fragmented");
        let bytes = encode(&message);

        let partial_len = PRELUDE_WITH_CRC_SIZE + 10;
        assert_eq!(decoder.decode_frame(&bytes[..partial_len]).unwrap(), None);
        assert_eq!(
            decoder.phase(),
            DecoderPhase::AwaitingFullFrame {
                total_length: bytes.len() as u32
            }
        );

        assert_eq!(
            decoder.decode_frame(&bytes[partial_len..]).unwrap(),
            Some(message)
        );
        assert_eq!(decoder.phase(), DecoderPhase::AwaitingPrelude);
    }

    #[test]
    fn test_byte_at_a_time() {
        let mut decoder = FrameDecoder::new();
        let first = make_message("Foo", b"hi");
        let second = Message::default();
        let mut bytes = encode(&first);
        bytes.extend(encode(&second));

        let mut all = Vec::new();
        for byte in &bytes {
            if let Some(message) = decoder.decode_frame(&[*byte]).unwrap() {
                all.push(message);
            }
        }

        assert_eq!(all, vec![first, second]);
        assert!(decoder.is_empty());
    }

    #[test]
    fn test_mixed_complete_and_partial() {
        let mut decoder = FrameDecoder::new();
        let first = make_message("First", b"first");
        let second = make_message("Second", b"second");
        let second_bytes = encode(&second);

        let mut data = encode(&first);
        data.extend_from_slice(&second_bytes[..5]);

        assert_eq!(decoder.push(&data).unwrap(), vec![first]);
        assert_eq!(decoder.len(), 5);

        assert_eq!(decoder.push(&second_bytes[5..]).unwrap(), vec![second]);
    }

    #[test]
    fn test_prelude_checksum_failure_is_permanent() {
        let mut decoder = FrameDecoder::new();
        let mut bytes = encode(&make_message("Foo", b"x"));
        bytes[9] ^= 0x01;

        let err = decoder.decode_frame(&bytes[..12]).unwrap_err();
        assert!(matches!(
            err,
            EventStreamError::Checksum {
                kind: ChecksumKind::Prelude,
                ..
            }
        ));
        assert!(decoder.is_poisoned());

        let err = decoder.decode_frame(&bytes[12..]).unwrap_err();
        assert!(matches!(err, EventStreamError::DecoderPoisoned));
    }

    #[test]
    fn test_message_checksum_failure() {
        let mut decoder = FrameDecoder::new();
        let mut bytes = encode(&make_message("Foo", b"payload"));
        let payload_byte = bytes.len() - 6;
        bytes[payload_byte] ^= 0x10;

        let err = decoder.decode_frame(&bytes).unwrap_err();
        assert!(matches!(
            err,
            EventStreamError::Checksum {
                kind: ChecksumKind::Message,
                ..
            }
        ));
        assert!(decoder.try_decode().is_err());
    }

    #[test]
    fn test_total_length_below_minimum() {
        let mut decoder = FrameDecoder::new();
        let mut bytes = Prelude::new(15, 0).encode_with_crc().to_vec();
        bytes.extend_from_slice(&[0, 0, 0]);

        let err = decoder.decode_frame(&bytes).unwrap_err();
        assert!(err.is_protocol());
    }

    #[test]
    fn test_headers_length_exceeds_frame() {
        let mut decoder = FrameDecoder::new();
        // Rejected as soon as the prelude is available
        let bytes = Prelude::new(20, 5).encode_with_crc();

        let err = decoder.decode_frame(&bytes).unwrap_err();
        assert!(err.is_protocol());
    }

    #[test]
    fn test_header_block_underrun() {
        // headers_length claims 3 bytes, but those bytes hold a truncated header
        let frame = raw_frame(MIN_FRAME_SIZE as u32 + 3, 3, &[2, b'a', b'b']);
        let err = FrameDecoder::new().decode_frame(&frame).unwrap_err();
        assert!(err.is_protocol());
    }

    #[test]
    fn test_unknown_header_type() {
        let frame = raw_frame(MIN_FRAME_SIZE as u32 + 3, 3, &[1, b'a', 42]);
        let err = FrameDecoder::new().decode_frame(&frame).unwrap_err();
        assert!(err.to_string().contains("Unknown header value type: 42"));
    }

    #[test]
    fn test_max_message_size_rejected_early() {
        let config = DecoderConfig::default().with_max_message_size(100);
        let mut decoder = FrameDecoder::with_config(config);

        // Only the prelude of a 1000 byte frame has arrived
        let bytes = Prelude::new(1000, 0).encode_with_crc();

        let err = decoder.decode_frame(&bytes).unwrap_err();
        assert!(err.to_string().contains("exceeds maximum"));
    }

    #[test]
    fn test_empty_payload_and_no_headers() {
        let mut decoder = FrameDecoder::new();
        let bytes = encode(&Message::default());
        assert_eq!(bytes.len(), MIN_FRAME_SIZE);

        let message = decoder.decode_frame(&bytes).unwrap().unwrap();
        assert!(message.headers().is_empty());
        assert!(message.payload().is_empty());
    }

    #[test]
    fn test_large_payload() {
        let mut decoder = FrameDecoder::new();
        let payload = vec![0xAB; 1024 * 1024];
        let message = make_message("Big", &payload);

        let decoded = decoder.decode_frame(&encode(&message)).unwrap().unwrap();

        assert_eq!(decoded.payload().len(), 1024 * 1024);
        assert!(decoded.payload().iter().all(|&b| b == 0xAB));
    }
}
