//! Protocol module - wire format, header codec, messages and framing.
//!
//! This module implements the `vnd.amazon.event-stream` binary format:
//! - 12-byte prelude with CRC
//! - Typed header values and the header block codec
//! - Message encoder
//! - Incremental decoder for chunked transports

mod checksum;
mod frame_decoder;
mod header;
mod message;
mod message_type;
mod wire_format;

pub use checksum::crc32;
pub use frame_decoder::{DecoderPhase, FrameDecoder};
pub use header::{
    decode_headers, encode_headers, Header, HeaderType, HeaderValue, MAX_HEADER_NAME_LEN,
    MAX_HEADER_VALUE_LEN,
};
pub use message::{Message, MessageBuilder};
pub use message_type::{
    MessageType, CONTENT_TYPE_HEADER, ERROR_CODE_HEADER, ERROR_MESSAGE_HEADER, EVENT_TYPE_HEADER,
    EXCEPTION_TYPE_HEADER, MESSAGE_TYPE_HEADER,
};
pub use wire_format::{
    Prelude, CRC_SIZE, MAX_HEADERS_SIZE, MAX_MESSAGE_SIZE, MIN_FRAME_SIZE, PRELUDE_SIZE,
    PRELUDE_WITH_CRC_SIZE,
};
