//! Event stream message and the frame encoder.
//!
//! A [`Message`] is an ordered list of headers plus a payload. Encoding
//! produces one complete frame:
//!
//! ```text
//! ┌─────────┬─────────────┬─────────┬─────────┬─────────────┐
//! │ Prelude │ Prelude CRC │ Headers │ Payload │ Message CRC │
//! │ 8 bytes │ 4 bytes     │ *       │ *       │ 4 bytes     │
//! └─────────┴─────────────┴─────────┴─────────┴─────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use aws_event_stream::protocol::{HeaderValue, Message};
//!
//! let message = Message::builder()
//!     .header(":message-type", "event")
//!     .header(":event-type", "AudioEvent")
//!     .payload(&b"pcm"[..])
//!     .build()
//!     .unwrap();
//!
//! let frame = message.encode().unwrap();
//! assert_eq!(Message::decode(&frame).unwrap(), message);
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use super::checksum::crc32;
use super::header::{decode_headers, encode_headers, Header, HeaderValue};
use super::wire_format::{
    read_u32, Prelude, CRC_SIZE, MAX_HEADERS_SIZE, MAX_MESSAGE_SIZE, PRELUDE_WITH_CRC_SIZE,
};
use crate::codec::JsonCodec;
use crate::error::{ChecksumKind, EventStreamError, Result};

/// One event stream frame: headers and payload.
///
/// Equality compares the set of headers, not their order.
#[derive(Debug, Clone, Default)]
pub struct Message {
    headers: Vec<Header>,
    payload: Bytes,
}

impl Message {
    /// Create a message from headers and payload.
    ///
    /// # Errors
    ///
    /// Returns an encoding error if two headers share a name.
    pub fn new(headers: Vec<Header>, payload: impl Into<Bytes>) -> Result<Self> {
        check_unique_names(&headers)?;
        Ok(Self {
            headers,
            payload: payload.into(),
        })
    }

    /// Start building a message.
    pub fn builder() -> MessageBuilder {
        MessageBuilder::default()
    }

    /// Headers in encode order.
    #[inline]
    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    /// Look up a header value by name.
    pub fn header(&self, name: &str) -> Option<&HeaderValue> {
        self.headers
            .iter()
            .find(|h| h.name == name)
            .map(|h| &h.value)
    }

    /// Get a reference to the payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Get a clone of the payload as Bytes (cheap, zero-copy).
    #[inline]
    pub fn payload_bytes(&self) -> Bytes {
        self.payload.clone()
    }

    /// Deserialize a JSON payload.
    pub fn json_payload<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        JsonCodec::decode(&self.payload)
    }

    /// Split into headers and payload.
    pub fn into_parts(self) -> (Vec<Header>, Bytes) {
        (self.headers, self.payload)
    }

    /// Encode the message as a complete frame.
    pub fn encode(&self) -> Result<Bytes> {
        let mut dst = BytesMut::new();
        self.encode_into(&mut dst)?;
        Ok(dst.freeze())
    }

    /// Append the encoded frame to `dst`.
    ///
    /// On error `dst` is left as it was.
    pub fn encode_into(&self, dst: &mut BytesMut) -> Result<()> {
        let mut header_bytes = BytesMut::new();
        encode_headers(&self.headers, &mut header_bytes)?;

        let prelude = Prelude::for_frame(header_bytes.len(), self.payload.len())?;

        let start = dst.len();
        dst.reserve(prelude.total_length as usize);
        dst.put_slice(&prelude.encode_with_crc());
        dst.put_slice(&header_bytes);
        dst.put_slice(&self.payload);
        let message_crc = crc32(&dst[start..]);
        dst.put_u32(message_crc);

        tracing::trace!(
            total_length = prelude.total_length,
            headers_length = prelude.headers_length,
            "encoded event stream frame"
        );
        Ok(())
    }

    /// Decode exactly one frame.
    ///
    /// Bytes after the frame, or a frame shorter than its declared length,
    /// are protocol errors. Use [`FrameDecoder`](super::FrameDecoder) for streams.
    pub fn decode(frame: &[u8]) -> Result<Message> {
        let prelude = Prelude::decode_checked(frame)?.ok_or_else(|| {
            EventStreamError::Protocol(format!(
                "Frame of {} bytes is shorter than the prelude",
                frame.len()
            ))
        })?;
        prelude.validate(MAX_MESSAGE_SIZE, MAX_HEADERS_SIZE)?;

        if frame.len() != prelude.total_length as usize {
            return Err(EventStreamError::Protocol(format!(
                "Frame length {} does not match declared total length {}",
                frame.len(),
                prelude.total_length
            )));
        }

        Self::from_frame(Bytes::copy_from_slice(frame), &prelude)
    }

    /// Build a message from one complete frame whose prelude was already
    /// checked and validated. `frame.len()` equals `prelude.total_length`.
    pub(crate) fn from_frame(frame: Bytes, prelude: &Prelude) -> Result<Message> {
        debug_assert_eq!(frame.len(), prelude.total_length as usize);

        // Verify integrity before interpreting the header block, so corrupted
        // bytes surface as a checksum failure.
        let crc_offset = prelude.message_crc_offset();
        let expected = read_u32(&frame, crc_offset);
        let computed = crc32(&frame[..crc_offset]);
        if expected != computed {
            return Err(EventStreamError::Checksum {
                kind: ChecksumKind::Message,
                expected,
                computed,
            });
        }

        let headers_end = PRELUDE_WITH_CRC_SIZE + prelude.headers_length as usize;
        let headers = decode_headers(&frame[PRELUDE_WITH_CRC_SIZE..headers_end])?;

        let payload_end = headers_end + prelude.payload_length() as usize;
        debug_assert_eq!(payload_end + CRC_SIZE, frame.len());
        let payload = frame.slice(headers_end..payload_end);

        Ok(Message { headers, payload })
    }
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.payload == other.payload
            && self.headers.len() == other.headers.len()
            && self
                .headers
                .iter()
                .all(|h| other.header(&h.name) == Some(&h.value))
            && other
                .headers
                .iter()
                .all(|h| self.header(&h.name) == Some(&h.value))
    }
}

fn check_unique_names(headers: &[Header]) -> Result<()> {
    for (i, header) in headers.iter().enumerate() {
        if headers[..i].iter().any(|h| h.name == header.name) {
            return Err(EventStreamError::Encoding(format!(
                "Duplicate header name: {}",
                header.name
            )));
        }
    }
    Ok(())
}

impl Eq for Message {}

/// Builder for [`Message`].
#[derive(Debug, Default)]
pub struct MessageBuilder {
    headers: Vec<Header>,
    payload: Option<Bytes>,
    error: Option<EventStreamError>,
}

impl MessageBuilder {
    /// Append a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<HeaderValue>) -> Self {
        self.headers.push(Header::new(name, value));
        self
    }

    /// Set the payload.
    pub fn payload(mut self, payload: impl Into<Bytes>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Set the payload to the JSON encoding of `value`.
    pub fn json_payload<T: serde::Serialize>(mut self, value: &T) -> Self {
        match JsonCodec::encode(value) {
            Ok(bytes) => self.payload = Some(Bytes::from(bytes)),
            Err(e) => self.error = Some(e),
        }
        self
    }

    /// Build the message.
    ///
    /// # Errors
    ///
    /// Returns an encoding error for duplicate header names, or the error
    /// from a failed [`MessageBuilder::json_payload`].
    pub fn build(self) -> Result<Message> {
        if let Some(err) = self.error {
            return Err(err);
        }

        Message::new(self.headers, self.payload.unwrap_or_default())
    }
}
