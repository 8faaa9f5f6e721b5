//! Error types for aws-event-stream.

use std::fmt;

use thiserror::Error;

/// Which of the two frame checksums failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumKind {
    /// CRC over the 8-byte prelude.
    Prelude,
    /// CRC over everything before the trailing message CRC.
    Message,
}

impl fmt::Display for ChecksumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChecksumKind::Prelude => f.write_str("prelude"),
            ChecksumKind::Message => f.write_str("message"),
        }
    }
}

/// Main error type for all event stream operations.
#[derive(Debug, Error)]
pub enum EventStreamError {
    /// Structurally impossible frame data (bad tag, lengths that don't reconcile, ...).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Prelude or message CRC mismatch.
    #[error("{kind} checksum mismatch; expected=0x{expected:08x}; calculated=0x{computed:08x}")]
    Checksum {
        kind: ChecksumKind,
        expected: u32,
        computed: u32,
    },

    /// A message could not be encoded (value or frame too large, bad header name).
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Typed header accessor used on a value of another type. `name` is set
    /// when the header was looked up by name.
    #[error("expected HeaderValue::{expected}, found: {found}{}", header_suffix(.name))]
    HeaderType {
        name: Option<String>,
        expected: &'static str,
        found: &'static str,
    },

    /// A header required to classify the message is absent.
    #[error("`{0}` header is required to deserialize an event stream message")]
    MissingHeader(String),

    /// The message headers are present but inconsistent.
    #[error("{0}")]
    InvalidMessage(String),

    /// JSON payload serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error while reading or writing a stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The decoder already failed and can no longer be trusted.
    #[error("Decoder used after a previous decode failure")]
    DecoderPoisoned,
}

fn header_suffix(name: &Option<String>) -> String {
    match name {
        Some(name) => format!(" (header `{}`)", name),
        None => String::new(),
    }
}

impl EventStreamError {
    /// Attach the header name to a [`EventStreamError::HeaderType`] error.
    /// Other errors are returned unchanged.
    pub fn for_header(self, header: &str) -> Self {
        match self {
            EventStreamError::HeaderType {
                expected, found, ..
            } => EventStreamError::HeaderType {
                name: Some(header.to_string()),
                expected,
                found,
            },
            other => other,
        }
    }

    /// True for [`EventStreamError::Protocol`].
    pub fn is_protocol(&self) -> bool {
        matches!(self, EventStreamError::Protocol(_))
    }

    /// True for [`EventStreamError::Checksum`].
    pub fn is_checksum(&self) -> bool {
        matches!(self, EventStreamError::Checksum { .. })
    }

    /// True for [`EventStreamError::Encoding`].
    pub fn is_encoding(&self) -> bool {
        matches!(self, EventStreamError::Encoding(_))
    }
}

/// Result type alias using EventStreamError.
pub type Result<T> = std::result::Result<T, EventStreamError>;
