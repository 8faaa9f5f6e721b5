//! Codec module - serialization/deserialization for message payloads.
//!
//! The frame format treats payloads as opaque bytes; the `:content-type`
//! header says how to read them. Two codecs cover the common cases:
//!
//! - [`RawCodec`] - Pass-through for raw bytes (zero-copy)
//! - [`JsonCodec`] - JSON using `serde_json` (`application/json` payloads)
//!
//! # Design
//!
//! Codecs are implemented as marker structs with static methods rather than trait objects.
//!
//! # Example
//!
//! ```
//! use aws_event_stream::codec::{JsonCodec, RawCodec};
//!
//! let encoded = JsonCodec::encode(&"hello").unwrap();
//! let decoded: String = JsonCodec::decode(&encoded).unwrap();
//! assert_eq!(decoded, "hello");
//!
//! let raw = RawCodec::serialize(b"pcm audio");
//! assert_eq!(RawCodec::deserialize(&raw), b"pcm audio");
//! ```

mod json;
mod raw;

pub use json::{JsonCodec, JSON_CONTENT_TYPE};
pub use raw::{RawCodec, OCTET_STREAM_CONTENT_TYPE};
