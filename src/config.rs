//! Decoder and reader configuration.

use crate::protocol::{MAX_HEADERS_SIZE, MAX_MESSAGE_SIZE};

/// Default initial capacity of the decoder accumulator (64 KB).
pub const DEFAULT_INITIAL_CAPACITY: usize = 64 * 1024;

/// Default size of the read buffer used by [`MessageReader`](crate::MessageReader) (64 KB).
pub const DEFAULT_READ_BUFFER_SIZE: usize = 64 * 1024;

/// Limits applied by [`FrameDecoder`](crate::protocol::FrameDecoder).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Largest accepted `total_length`.
    pub max_message_size: u32,
    /// Largest accepted `headers_length`.
    pub max_headers_size: u32,
    /// Initial accumulator capacity.
    pub initial_capacity: usize,
}

impl DecoderConfig {
    /// Set the maximum frame length.
    pub fn with_max_message_size(mut self, max_message_size: u32) -> Self {
        self.max_message_size = max_message_size;
        self
    }

    /// Set the maximum header block length.
    pub fn with_max_headers_size(mut self, max_headers_size: u32) -> Self {
        self.max_headers_size = max_headers_size;
        self
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_message_size: MAX_MESSAGE_SIZE,
            max_headers_size: MAX_HEADERS_SIZE,
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
        }
    }
}

/// Configuration for [`MessageReader`](crate::MessageReader).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Bytes requested per read call.
    pub read_buffer_size: usize,
    /// Limits for the underlying decoder.
    pub decoder: DecoderConfig,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            decoder: DecoderConfig::default(),
        }
    }
}
