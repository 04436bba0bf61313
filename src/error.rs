//! Error types for mqp-stream.

use thiserror::Error;

/// Error type for mqp-stream operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error on the underlying connection (connect failure, write
    /// failure, short body read, stream closed unexpectedly).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the stream before a header block was terminated.
    #[error("Connection closed inside a header block")]
    UnexpectedEof,

    /// A header line was not valid UTF-8.
    #[error("Header line is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// Unknown response status name in a `STATUS:` line.
    #[error("Unknown response status: {0}")]
    UnknownStatus(String),
}

/// Result type alias for mqp-stream operations.
pub type Result<T> = std::result::Result<T, Error>;
