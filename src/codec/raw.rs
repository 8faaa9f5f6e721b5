//! Raw codec - pass-through for binary payloads such as audio chunks.
//!
//! # Example
//!
//! ```
//! use aws_event_stream::codec::RawCodec;
//! use bytes::Bytes;
//!
//! // Zero-copy with Bytes
//! let bytes = Bytes::from_static(b"zero copy");
//! let passed = RawCodec::serialize_bytes(bytes.clone());
//! assert_eq!(passed.as_ptr(), bytes.as_ptr()); // Same memory
//! ```

use bytes::Bytes;

/// Content type announced for raw binary payloads.
pub const OCTET_STREAM_CONTENT_TYPE: &str = "application/octet-stream";

/// Raw codec that passes bytes through without transformation.
pub struct RawCodec;

impl RawCodec {
    /// Serialize raw bytes (copies data into Bytes).
    ///
    /// For truly zero-copy, use `serialize_bytes` with an existing `Bytes` value.
    #[inline]
    pub fn serialize(data: &[u8]) -> Bytes {
        Bytes::copy_from_slice(data)
    }

    /// Serialize Bytes (true zero-copy, just returns the input).
    #[inline]
    pub fn serialize_bytes(data: Bytes) -> Bytes {
        data
    }

    /// Deserialize - returns a reference to the input (zero-copy).
    #[inline]
    pub fn deserialize(data: &[u8]) -> &[u8] {
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Message;

    #[test]
    fn test_payload_preserved_through_frame() {
        let all_bytes: Vec<u8> = (0..=255).collect();
        let message = Message::builder()
            .header(":content-type", OCTET_STREAM_CONTENT_TYPE)
            .payload(RawCodec::serialize(&all_bytes))
            .build()
            .unwrap();

        let decoded = Message::decode(&message.encode().unwrap()).unwrap();
        assert_eq!(RawCodec::deserialize(decoded.payload()), &all_bytes[..]);
    }

    #[test]
    fn test_serialize_bytes_zero_copy() {
        let original = Bytes::from_static(b"static data");
        let serialized = RawCodec::serialize_bytes(original.clone());
        assert_eq!(serialized.as_ptr(), original.as_ptr());
    }

    #[test]
    fn test_serialize_empty() {
        let serialized = RawCodec::serialize(b"");
        assert!(serialized.is_empty());
    }
}
