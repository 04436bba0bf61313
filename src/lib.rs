//! # mqp-stream
//!
//! Async streaming client for the MailUnit Query Protocol (MQP), the
//! line-oriented query/response protocol MailUnit servers speak over TCP.
//!
//! ## Why?
//!
//! An MQP response can carry an arbitrary number of stored messages, each
//! with a raw binary body. Buffering the whole response defeats the point of
//! the protocol's length-prefixed framing:
//!
//! ```ignore
//! // This buffers every message body at once.
//! let messages: Vec<Message> = client.query("...").await?;
//! ```
//!
//! `mqp-stream` pulls messages off the wire one at a time:
//!
//! ```ignore
//! let mut response = client.send_query("...").await?;
//! while let Some(message) = response.fetch_next().await? {
//!     process(message);
//! }
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use mqp_stream::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new("localhost", 5880);
//!
//!     let mut response = client.send_query("subject = 'invoice'").await?;
//!     println!(
//!         "{} ({} matched)",
//!         response.header().status(),
//!         response.header().affected_count()
//!     );
//!
//!     while let Some(message) = response.fetch_next().await? {
//!         println!(
//!             "#{} from {:?}: {} bytes",
//!             message.header().id(),
//!             message.header().from(),
//!             message.body().len()
//!         );
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Streaming**: messages are fetched one at a time, in wire order, with
//!   bodies read to exactly their declared length
//! - **Async native**: built on tokio and futures
//! - **Tidy teardown**: once the last expected message is consumed the client
//!   sends the `q;` quit directive and closes the connection, exactly once
//! - **Error handling**: transport failures are returned as Results, no
//!   panics; malformed header lines are dropped per the wire format's
//!   lenient framing

pub mod client;
pub mod error;
pub mod parser;
pub mod types;

// Re-export main types at crate root
pub use client::{Client, Response};
pub use error::{Error, Result};
pub use types::{Message, MessageHeader, ResponseAction, ResponseHeader, ResponseStatus};
