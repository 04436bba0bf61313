//! Async reader for MQP header blocks.
//!
//! An MQP response is framed as header blocks: runs of `\n`-delimited text
//! lines ending with a blank line. The same framing is used for the top-level
//! response header and for every per-message header, so the block reader here
//! is shared by both.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::trace;

use crate::error::{Error, Result};
use crate::types::{MessageHeader, ResponseHeader};

/// Read one header block, handing each line to `on_line`.
///
/// Lines are split on `\n`; the `\n` itself is stripped but a trailing `\r`
/// is left for the line grammar to deal with. Returns when the block's
/// terminator is reached: a line that is empty or whitespace-only, which is
/// discarded rather than passed to the handler.
///
/// Reaching end-of-stream before the terminator is an error — the peer is
/// required to finish every block it starts.
pub async fn read_header_block<R, F>(reader: &mut R, mut on_line: F) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    F: FnMut(&str),
{
    let mut buf = Vec::with_capacity(128);
    loop {
        buf.clear();
        let n = reader.read_until(b'\n', &mut buf).await?;
        if n == 0 || buf.last() != Some(&b'\n') {
            return Err(Error::UnexpectedEof);
        }
        buf.pop();
        let line = std::str::from_utf8(&buf)?;
        if line.trim().is_empty() {
            return Ok(());
        }
        on_line(line);
    }
}

/// Read and parse a response header block.
///
/// Lines the header grammar rejects are dropped and the block keeps being
/// read; this mirrors the server's lenient framing, where one malformed line
/// does not invalidate the response.
pub async fn read_response_header<R>(reader: &mut R) -> Result<ResponseHeader>
where
    R: AsyncBufRead + Unpin,
{
    let mut header = ResponseHeader::default();
    read_header_block(reader, |line| {
        if !header.parse_line(line) {
            trace!(line, "dropped unrecognized response header line");
        }
    })
    .await?;
    Ok(header)
}

/// Read and parse one message header block.
///
/// Same drop-and-continue policy as [`read_response_header`].
pub async fn read_message_header<R>(reader: &mut R) -> Result<MessageHeader>
where
    R: AsyncBufRead + Unpin,
{
    let mut header = MessageHeader::default();
    read_header_block(reader, |line| {
        if !header.parse_line(line) {
            trace!(line, "dropped unrecognized message header line");
        }
    })
    .await?;
    Ok(header)
}
