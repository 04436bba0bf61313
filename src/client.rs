//! MQP streaming client.
//!
//! This module provides the [`Client`] for sending queries to an MQP server
//! and the [`Response`] session for pulling matched messages off the wire one
//! at a time.

use std::pin::Pin;

use async_stream::stream;
use futures::Stream;
use tokio::io::{AsyncBufRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, trace};

use crate::error::Result;
use crate::parser;
use crate::types::{Message, ResponseAction, ResponseHeader, ResponseStatus};

/// MQP streaming client.
///
/// A client holds only the server address; each query opens its own
/// connection, which lives for the duration of the returned [`Response`] and
/// is closed with a `q;` quit directive once the message stream is drained.
///
/// # Example
///
/// ```ignore
/// use mqp_stream::Client;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = Client::new("localhost", 5880);
///
///     let mut response = client.send_query("subject = 'invoice'").await?;
///     while let Some(message) = response.fetch_next().await? {
///         println!(
///             "#{} {}: {} bytes",
///             message.header().id(),
///             message.header().subject().unwrap_or_default(),
///             message.body().len()
///         );
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Clone, Debug)]
pub struct Client {
    host: String,
    port: u16,
}

impl Client {
    /// Create a new client for an MQP server address.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Server hostname.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Server port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Send a query and return the response session.
    ///
    /// The query is trimmed and a terminating `;` is appended if missing; no
    /// other validation or escaping is applied. The returned [`Response`]
    /// owns the connection — drive it with [`Response::fetch_next`] until it
    /// reports completion.
    ///
    /// Any transport error while connecting, writing the query, or reading
    /// the response header aborts the whole query: the connection is dropped
    /// and no session is returned. Retrying is the caller's decision.
    pub async fn send_query(&self, query: &str) -> Result<Response> {
        debug!(host = %self.host, port = self.port, "connecting to MQP server");
        let stream = TcpStream::connect((self.host.as_str(), self.port)).await?;
        let mut stream = BufReader::new(stream);

        let query = normalize_query(query);
        trace!(query = %query, "sending query");
        stream.get_mut().write_all(query.as_bytes()).await?;
        stream.get_mut().flush().await?;

        let header = parser::read_response_header(&mut stream).await?;
        debug!(
            status = %header.status(),
            action = ?header.action(),
            affected = header.affected_count(),
            "response header received"
        );

        let mut response = Response::new(header, stream);
        if response.completed {
            // Nothing will ever be fetched, so the quit handshake that
            // normally follows the last message runs right away instead of
            // leaving the connection dangling.
            response.finish().await?;
        }
        Ok(response)
    }

    /// Send a query and collect every matched message into a `Vec`.
    ///
    /// **Warning**: this buffers all message bodies in memory. For large
    /// result sets, use [`send_query`] and fetch one message at a time.
    ///
    /// [`send_query`]: Client::send_query
    pub async fn query(&self, query: &str) -> Result<Vec<Message>> {
        let mut response = self.send_query(query).await?;
        let mut messages = Vec::new();
        while let Some(message) = response.fetch_next().await? {
            messages.push(message);
        }
        Ok(messages)
    }
}

/// Trim the query and guarantee exactly one trailing `;`.
fn normalize_query(query: &str) -> String {
    let query = query.trim();
    if query.ends_with(';') {
        query.to_string()
    } else {
        format!("{query};")
    }
}

/// A per-query response session.
///
/// Tracks how many messages have been retrieved against the count the
/// response header declared. The session owns the connection exclusively;
/// `&mut self` on [`fetch_next`] is what enforces the protocol's "one
/// outstanding read at a time" rule, and the retrieved-count and completion
/// flag change together inside a single `fetch_next` call, so there is no
/// window where one is updated and the other is not.
///
/// The session starts completed — no fetch will ever touch the transport —
/// when the status is not [`ResponseStatus::Success`], the action is not
/// [`ResponseAction::Matched`], or the affected count is zero.
///
/// [`fetch_next`]: Response::fetch_next
#[derive(Debug)]
pub struct Response<S = BufReader<TcpStream>> {
    header: ResponseHeader,
    stream: S,
    retrieved: u32,
    completed: bool,
}

impl<S> Response<S>
where
    S: AsyncBufRead + AsyncWrite + Unpin,
{
    pub(crate) fn new(header: ResponseHeader, stream: S) -> Self {
        let completed = header.status() != ResponseStatus::Success
            || header.action() != ResponseAction::Matched
            || header.affected_count() == 0;
        Self {
            header,
            stream,
            retrieved: 0,
            completed,
        }
    }

    /// The parsed response header.
    pub fn header(&self) -> &ResponseHeader {
        &self.header
    }

    /// Number of messages fetched so far. Never exceeds
    /// `header().affected_count()`.
    pub fn retrieved(&self) -> u32 {
        self.retrieved
    }

    /// Whether the message stream is exhausted (or never existed).
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Fetch the next message off the wire.
    ///
    /// Returns `Ok(None)` once the session is completed, without any
    /// transport activity. Otherwise reads one message header block followed
    /// by exactly the declared number of body bytes. Fetching the final
    /// message also performs the teardown handshake — writing `q;` and
    /// shutting the connection down — strictly after that message's body has
    /// been read in full.
    ///
    /// Messages come back in wire order; there is no prefetching. A stalled
    /// peer blocks this call indefinitely, and cancelling it externally means
    /// closing the transport out from under the session.
    pub async fn fetch_next(&mut self) -> Result<Option<Message>> {
        if self.completed {
            return Ok(None);
        }

        let header = parser::read_message_header(&mut self.stream).await?;
        let mut body = vec![0u8; header.size() as usize];
        if !body.is_empty() {
            self.stream.read_exact(&mut body).await?;
        }
        debug!(id = header.id(), size = header.size(), "fetched message");

        self.retrieved += 1;
        if self.retrieved == self.header.affected_count() {
            self.completed = true;
            self.finish().await?;
        }

        Ok(Some(Message::new(header, body)))
    }

    /// Convert the session into a stream of messages.
    ///
    /// Yields until the session completes or the first error, whichever
    /// comes first.
    pub fn into_stream(mut self) -> Pin<Box<dyn Stream<Item = Result<Message>> + Send>>
    where
        S: Send + 'static,
    {
        Box::pin(stream! {
            loop {
                match self.fetch_next().await {
                    Ok(Some(message)) => yield Ok(message),
                    Ok(None) => break,
                    Err(e) => {
                        yield Err(e);
                        break;
                    }
                }
            }
        })
    }

    /// Quit/close handshake. Runs exactly once per session: either when the
    /// retrieved count reaches the affected count, or during setup for a
    /// session that starts completed.
    async fn finish(&mut self) -> Result<()> {
        trace!("message stream complete, sending quit directive");
        self.stream.write_all(b"q;").await?;
        self.stream.flush().await?;
        self.stream.shutdown().await?;
        Ok(())
    }
}
