//! Async message writer over any `AsyncWrite` byte sink.
//!
//! Each message is encoded into a reusable buffer and written as one
//! contiguous frame. Batches are encoded up front so a message that fails
//! to encode leaves nothing half-written on the wire.

use bytes::BytesMut;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::Result;
use crate::protocol::Message;

/// Writes event stream messages to an async byte sink.
pub struct MessageWriter<W> {
    writer: W,
    /// Reusable encode buffer.
    buffer: BytesMut,
    frames_written: u64,
}

impl<W: AsyncWrite + Unpin> MessageWriter<W> {
    /// Create a new writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            buffer: BytesMut::with_capacity(8 * 1024),
            frames_written: 0,
        }
    }

    /// Encode and write one message, then flush.
    pub async fn send(&mut self, message: &Message) -> Result<()> {
        self.buffer.clear();
        message.encode_into(&mut self.buffer)?;
        self.write_buffer(1).await
    }

    /// Encode and write several messages with a single write and flush.
    pub async fn send_batch(&mut self, messages: &[Message]) -> Result<()> {
        if messages.is_empty() {
            return Ok(());
        }

        self.buffer.clear();
        for message in messages {
            if let Err(e) = message.encode_into(&mut self.buffer) {
                self.buffer.clear();
                return Err(e);
            }
        }
        self.write_buffer(messages.len() as u64).await
    }

    /// Write the empty frame (no headers, no payload) that terminates a
    /// signed request stream.
    pub async fn send_end_frame(&mut self) -> Result<()> {
        self.send(&Message::default()).await
    }

    /// Shut down the underlying sink.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.writer.shutdown().await?;
        Ok(())
    }

    /// Number of frames written so far.
    #[inline]
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Give back the byte sink.
    pub fn into_inner(self) -> W {
        self.writer
    }

    async fn write_buffer(&mut self, frames: u64) -> Result<()> {
        self.writer.write_all(&self.buffer).await?;
        self.writer.flush().await?;
        self.frames_written += frames;
        tracing::trace!(frames, bytes = self.buffer.len(), "wrote event stream frames");
        Ok(())
    }
}
