//! Dump an event stream read from stdin.
//!
//! # Usage
//!
//! ```sh
//! cargo run --example dump_stream < captured-response-body.bin
//! ```

use aws_event_stream::MessageReader;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut reader = MessageReader::new(tokio::io::stdin());
    let mut count = 0usize;

    while let Some(message) = reader.next_message().await? {
        count += 1;
        println!("message {} ({} payload bytes)", count, message.payload().len());
        for header in message.headers() {
            println!("  {} = {}", header.name, header.value);
        }
    }

    println!("{} messages", count);
    Ok(())
}
