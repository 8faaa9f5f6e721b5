//! Transcribe-style audio stream - example of the write and read paths.
//!
//! This example demonstrates:
//! - Building `AudioEvent` messages with the message builder
//! - Writing them through `MessageWriter` into an in-memory pipe
//! - Reading them back with `MessageReader` while the pipe delivers small chunks
//! - Classifying each message by its standard headers

use aws_event_stream::codec::OCTET_STREAM_CONTENT_TYPE;
use aws_event_stream::{Message, MessageReader, MessageWriter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A tiny pipe buffer forces the reader to reassemble frames from fragments
    let (client, server) = tokio::io::duplex(24);

    let producer = tokio::spawn(async move {
        let mut writer = MessageWriter::new(client);
        for i in 0..5u8 {
            let audio: Vec<u8> = (0..32).map(|n| n ^ i).collect();
            let message = Message::builder()
                .header(":message-type", "event")
                .header(":event-type", "AudioEvent")
                .header(":content-type", OCTET_STREAM_CONTENT_TYPE)
                .payload(audio)
                .build()?;
            writer.send(&message).await?;
        }
        writer.send_end_frame().await?;
        writer.shutdown().await?;
        Ok::<_, aws_event_stream::EventStreamError>(writer.frames_written())
    });

    let mut reader = MessageReader::new(server);
    while let Some(message) = reader.next_message().await? {
        if message.headers().is_empty() {
            println!("end frame");
            continue;
        }
        println!(
            "{:?} with {} payload bytes",
            message.message_type()?,
            message.payload().len()
        );
    }

    let written = producer.await??;
    println!("{} frames written", written);

    Ok(())
}
