//! # aws-event-stream
//!
//! Encoder and incremental decoder for the `vnd.amazon.event-stream` binary
//! message format, used to carry bidirectional and streaming payloads inside
//! a single long-lived HTTP body.
//!
//! ## Architecture
//!
//! - **Protocol** ([`protocol`]): frame layout, typed header values, CRC checks,
//!   the encoder and the chunk-tolerant [`FrameDecoder`](protocol::FrameDecoder)
//! - **Codecs** ([`codec`]): raw and JSON payload helpers
//! - **Async adapters**: [`MessageReader`] and [`MessageWriter`] over `tokio` I/O
//!
//! Transport, request signing and service-specific event mapping live
//! outside this crate.
//!
//! ## Example
//!
//! ```
//! use aws_event_stream::protocol::{FrameDecoder, Message};
//!
//! let message = Message::builder()
//!     .header(":message-type", "event")
//!     .header(":event-type", "AudioEvent")
//!     .header(":content-type", "application/octet-stream")
//!     .payload(&b"\x00\x01\x02"[..])
//!     .build()
//!     .unwrap();
//!
//! let bytes = message.encode().unwrap();
//!
//! let mut decoder = FrameDecoder::new();
//! let mut decoded = None;
//! for byte in bytes.iter() {
//!     if let Some(m) = decoder.decode_frame(&[*byte]).unwrap() {
//!         decoded = Some(m);
//!     }
//! }
//! assert_eq!(decoded, Some(message));
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod protocol;

mod reader;
mod writer;

pub use config::{DecoderConfig, ReaderConfig};
pub use error::{ChecksumKind, EventStreamError, Result};
pub use protocol::{FrameDecoder, Header, HeaderValue, Message, MessageBuilder, MessageType};
pub use reader::MessageReader;
pub use writer::MessageWriter;
