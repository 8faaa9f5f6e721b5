//! Async message reader over any `AsyncRead` byte source.
//!
//! Reads chunks from the transport into a fixed buffer, feeds them to a
//! [`FrameDecoder`] and hands out messages one at a time. Every frame that
//! is already buffered is drained before the next read.
//!
//! # Example
//!
//! ```ignore
//! use aws_event_stream::MessageReader;
//!
//! let mut reader = MessageReader::new(response_body);
//! while let Some(message) = reader.next_message().await? {
//!     println!("{:?}", message.message_type()?);
//! }
//! ```

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::config::ReaderConfig;
use crate::error::{EventStreamError, Result};
use crate::protocol::{FrameDecoder, Message};

/// Reads event stream messages from an async byte source.
pub struct MessageReader<R> {
    reader: R,
    decoder: FrameDecoder,
    read_buf: Vec<u8>,
    finished: bool,
    /// Set once the stream ended mid-frame.
    truncated: bool,
}

impl<R: AsyncRead + Unpin> MessageReader<R> {
    /// Create a reader with default configuration.
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, ReaderConfig::default())
    }

    /// Create a reader with custom read buffer size and decoder limits.
    pub fn with_config(reader: R, config: ReaderConfig) -> Self {
        Self {
            reader,
            decoder: FrameDecoder::with_config(config.decoder),
            read_buf: vec![0u8; config.read_buffer_size.max(1)],
            finished: false,
            truncated: false,
        }
    }

    /// Read the next message.
    ///
    /// Returns `Ok(None)` on a clean end of stream. An end of stream in the
    /// middle of a frame is a protocol error, and every later call fails with
    /// [`EventStreamError::DecoderPoisoned`].
    pub async fn next_message(&mut self) -> Result<Option<Message>> {
        if self.truncated {
            return Err(EventStreamError::DecoderPoisoned);
        }

        loop {
            if let Some(message) = self.decoder.try_decode()? {
                return Ok(Some(message));
            }

            if self.finished {
                return Ok(None);
            }

            let n = self.reader.read(&mut self.read_buf).await?;
            if n == 0 {
                self.finished = true;
                if !self.decoder.is_empty() {
                    self.truncated = true;
                    tracing::warn!(buffered = self.decoder.len(), "event stream ended mid-frame");
                    return Err(EventStreamError::Protocol(format!(
                        "Stream ended mid-frame with {} bytes buffered",
                        self.decoder.len()
                    )));
                }
                tracing::debug!("event stream ended");
                return Ok(None);
            }

            self.decoder.extend(&self.read_buf[..n]);
        }
    }

    /// Read messages until the end of the stream.
    pub async fn collect_all(&mut self) -> Result<Vec<Message>> {
        let mut messages = Vec::new();
        while let Some(message) = self.next_message().await? {
            messages.push(message);
        }
        Ok(messages)
    }

    /// The underlying decoder.
    pub fn decoder(&self) -> &FrameDecoder {
        &self.decoder
    }

    /// Give back the byte source. Buffered bytes are discarded.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DecoderConfig;
    use tokio::io::AsyncWriteExt;

    fn frames(messages: &[Message]) -> Vec<u8> {
        messages
            .iter()
            .flat_map(|m| m.encode().unwrap().to_vec())
            .collect()
    }

    fn sample_messages() -> Vec<Message> {
        vec![
            Message::builder()
                .header(":message-type", "event")
                .header(":event-type", "TranscriptEvent")
                .payload(&br#"{"Transcript":{"Results":[]}}"#[..])
                .build()
                .unwrap(),
            Message::builder()
                .header(":message-type", "event")
                .header(":event-type", "Ping")
                .build()
                .unwrap(),
            Message::builder().payload(&b"raw"[..]).build().unwrap(),
        ]
    }

    #[tokio::test]
    async fn test_reads_all_messages_from_slice() {
        let messages = sample_messages();
        let bytes = frames(&messages);

        let mut reader = MessageReader::new(&bytes[..]);
        assert_eq!(reader.collect_all().await.unwrap(), messages);
        assert!(reader.next_message().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_small_read_buffer() {
        let messages = sample_messages();
        let bytes = frames(&messages);

        let config = ReaderConfig {
            read_buffer_size: 3,
            decoder: DecoderConfig::default(),
        };
        let mut reader = MessageReader::with_config(&bytes[..], config);
        assert_eq!(reader.collect_all().await.unwrap(), messages);
    }

    #[tokio::test]
    async fn test_chunked_duplex_transport() {
        let messages = sample_messages();
        let bytes = frames(&messages);

        let (mut tx, rx) = tokio::io::duplex(16);
        let writer = tokio::spawn(async move {
            for chunk in bytes.chunks(7) {
                tx.write_all(chunk).await.unwrap();
            }
        });

        let mut reader = MessageReader::new(rx);
        let received = reader.collect_all().await.unwrap();
        writer.await.unwrap();

        assert_eq!(received, messages);
    }

    #[tokio::test]
    async fn test_truncated_stream() {
        let bytes = frames(&sample_messages());
        let truncated = &bytes[..bytes.len() - 2];

        let mut reader = MessageReader::new(truncated);
        assert!(reader.next_message().await.unwrap().is_some());
        assert!(reader.next_message().await.unwrap().is_some());

        let err = reader.next_message().await.unwrap_err();
        assert!(err.is_protocol());
        assert!(err.to_string().contains("ended mid-frame"));

        assert!(matches!(
            reader.next_message().await.unwrap_err(),
            EventStreamError::DecoderPoisoned
        ));
        assert!(reader.collect_all().await.is_err());
    }

    #[tokio::test]
    async fn test_partial_prelude_stays_failed() {
        let bytes = Message::default().encode().unwrap();

        let mut reader = MessageReader::new(&bytes[..10]);
        assert!(reader.next_message().await.unwrap_err().is_protocol());
        assert!(reader.next_message().await.is_err());
    }

    #[tokio::test]
    async fn test_corrupt_stream() {
        let mut bytes = frames(&sample_messages());
        bytes[20] ^= 0xFF;

        let mut reader = MessageReader::new(&bytes[..]);
        let err = reader.next_message().await.unwrap_err();
        assert!(err.is_checksum());
        assert!(reader.decoder().is_poisoned());
    }

    #[tokio::test]
    async fn test_empty_stream() {
        let mut reader = MessageReader::new(&b""[..]);
        assert!(reader.next_message().await.unwrap().is_none());
    }
}
