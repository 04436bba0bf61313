//! Integration tests for mqp-stream.
//!
//! Each test spawns a one-shot scripted MQP server on a loopback port, runs
//! the client against it, and then inspects exactly what arrived on the
//! server side of the connection.

use futures::StreamExt;
use mqp_stream::{Client, Error, ResponseAction, ResponseStatus};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Read the client's query: everything up to and including the `;`.
async fn read_query(socket: &mut TcpStream) -> Vec<u8> {
    let mut query = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        socket.read_exact(&mut byte).await.unwrap();
        query.push(byte[0]);
        if byte[0] == b';' {
            return query;
        }
    }
}

/// Spawn a server that accepts one connection, reads the query, writes
/// `response`, and drains the connection until the client closes it.
///
/// The join handle resolves to `(query bytes, bytes sent after the
/// response)` — for a well-behaved client the latter is exactly `q;`.
async fn spawn_server(response: &'static [u8]) -> (Client, JoinHandle<(Vec<u8>, Vec<u8>)>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let query = read_query(&mut socket).await;
        socket.write_all(response).await.unwrap();
        let mut rest = Vec::new();
        socket.read_to_end(&mut rest).await.unwrap();
        (query, rest)
    });

    (Client::new("127.0.0.1", port), handle)
}

// ============================================================================
// Query Normalization
// ============================================================================

#[tokio::test]
async fn test_query_is_trimmed_and_terminated() {
    let (client, server) = spawn_server(b"STATUS: Success\r\nMATCHED: 0\r\n\n").await;

    let response = client.send_query("  find all  ").await.unwrap();
    assert!(response.is_completed());
    drop(response);

    let (query, _) = server.await.unwrap();
    assert_eq!(query, b"find all;");
}

#[tokio::test]
async fn test_terminated_query_gets_no_second_semicolon() {
    let (client, server) = spawn_server(b"STATUS: Success\r\nMATCHED: 0\r\n\n").await;

    client.send_query("\tfind all;\n").await.unwrap();

    let (query, _) = server.await.unwrap();
    assert_eq!(query, b"find all;");
}

// ============================================================================
// Message Stream
// ============================================================================

#[tokio::test]
async fn test_fetch_matched_messages() {
    let (client, server) = spawn_server(
        b"STATUS: Success\r\nMATCHED: 2\r\n\n\
          ID: 7\r\nSIZE: 5\r\nSUBJECT: hello\r\nFROM: s@x\r\nTO: a@x\r\nTO: b@x\r\n\nworld\
          ID: 8\r\nSIZE: 0\r\n\n",
    )
    .await;

    let mut response = client.send_query("find all").await.unwrap();
    assert_eq!(response.header().status(), ResponseStatus::Success);
    assert_eq!(response.header().action(), ResponseAction::Matched);
    assert_eq!(response.header().affected_count(), 2);
    assert!(!response.is_completed());

    let first = response.fetch_next().await.unwrap().unwrap();
    assert_eq!(first.header().id(), 7);
    assert_eq!(first.header().size(), 5);
    assert_eq!(first.header().subject(), Some("hello"));
    assert_eq!(first.header().from(), ["s@x"]);
    assert_eq!(first.header().to(), ["a@x", "b@x"]);
    assert_eq!(first.body(), b"world");

    let second = response.fetch_next().await.unwrap().unwrap();
    assert_eq!(second.header().id(), 8);
    assert!(second.body().is_empty());

    assert!(response.is_completed());
    assert_eq!(response.retrieved(), 2);
    assert!(response.fetch_next().await.unwrap().is_none());

    // The teardown handshake sent exactly the quit directive and closed.
    let (_, rest) = server.await.unwrap();
    assert_eq!(rest, b"q;");
}

#[tokio::test]
async fn test_bogus_header_lines_are_dropped() {
    let (client, server) = spawn_server(
        b"STATUS: Success\r\nBOGUS: 1\r\nMATCHED: 1\r\n\n\
          ID: 1\r\nX-NOPE: ?\r\nSIZE: 2\r\n\nok",
    )
    .await;

    let mut response = client.send_query("find all").await.unwrap();
    assert_eq!(response.header().affected_count(), 1);

    let message = response.fetch_next().await.unwrap().unwrap();
    assert_eq!(message.header().id(), 1);
    assert_eq!(message.body(), b"ok");

    let (_, rest) = server.await.unwrap();
    assert_eq!(rest, b"q;");
}

#[tokio::test]
async fn test_into_stream_drains_the_session() {
    let (client, server) = spawn_server(
        b"STATUS: Success\r\nMATCHED: 3\r\n\n\
          ID: 1\r\nSIZE: 1\r\n\na\
          ID: 2\r\nSIZE: 1\r\n\nb\
          ID: 3\r\nSIZE: 1\r\n\nc",
    )
    .await;

    let response = client.send_query("find all").await.unwrap();
    let mut stream = response.into_stream();

    let mut ids = Vec::new();
    while let Some(message) = stream.next().await {
        ids.push(message.unwrap().header().id());
    }
    assert_eq!(ids, [1, 2, 3]);

    let (_, rest) = server.await.unwrap();
    assert_eq!(rest, b"q;");
}

#[tokio::test]
async fn test_query_collect() {
    let (client, server) = spawn_server(
        b"STATUS: Success\r\nMATCHED: 2\r\n\n\
          ID: 1\r\nSIZE: 3\r\n\nfoo\
          ID: 2\r\nSIZE: 3\r\n\nbar",
    )
    .await;

    let messages = client.query("find all").await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].body(), b"foo");
    assert_eq!(messages[1].body(), b"bar");

    let (_, rest) = server.await.unwrap();
    assert_eq!(rest, b"q;");
}

// ============================================================================
// Sessions With No Message Stream
// ============================================================================

#[tokio::test]
async fn test_error_status_completes_immediately() {
    let (client, server) = spawn_server(b"STATUS: ParseError\r\n\n").await;

    let mut response = client.send_query("not a query").await.unwrap();
    assert_eq!(response.header().status(), ResponseStatus::ParseError);
    assert_eq!(response.header().action(), ResponseAction::Error);
    assert!(response.is_completed());
    assert!(response.fetch_next().await.unwrap().is_none());
    drop(response);

    let (_, rest) = server.await.unwrap();
    assert_eq!(rest, b"q;");
}

#[tokio::test]
async fn test_deleted_response_carries_no_messages() {
    let (client, server) = spawn_server(b"STATUS: Success\r\nDELETED: 4\r\n\n").await;

    let mut response = client.send_query("drop old").await.unwrap();
    assert_eq!(response.header().action(), ResponseAction::Deleted);
    assert_eq!(response.header().affected_count(), 4);
    assert!(response.is_completed());
    assert!(response.fetch_next().await.unwrap().is_none());
    drop(response);

    let (_, rest) = server.await.unwrap();
    assert_eq!(rest, b"q;");
}

// ============================================================================
// Error Handling
// ============================================================================

#[tokio::test]
async fn test_connect_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let client = Client::new("127.0.0.1", port);
    let result = client.send_query("find all").await;
    assert!(matches!(result, Err(Error::Io(_))));
}

#[tokio::test]
async fn test_stream_closed_inside_response_header() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_query(&mut socket).await;
        // Unterminated header block, then hang up.
        socket.write_all(b"STATUS: Success\r\n").await.unwrap();
    });

    let client = Client::new("127.0.0.1", port);
    let result = client.send_query("find all").await;
    assert!(matches!(result, Err(Error::UnexpectedEof)));

    server.await.unwrap();
}

#[tokio::test]
async fn test_stream_closed_inside_message_body() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_query(&mut socket).await;
        socket
            .write_all(b"STATUS: Success\r\nMATCHED: 1\r\n\nID: 1\r\nSIZE: 100\r\n\nshort")
            .await
            .unwrap();
    });

    let client = Client::new("127.0.0.1", port);
    let mut response = client.send_query("find all").await.unwrap();
    let result = response.fetch_next().await;
    assert!(matches!(result, Err(Error::Io(_))));

    server.await.unwrap();
}
