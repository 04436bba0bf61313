//! Core types for MQP query responses.

use std::str::FromStr;

use crate::error::Error;

const STATUS_PREFIX: &str = "STATUS: ";
const MATCHED_PREFIX: &str = "MATCHED: ";
const DELETED_PREFIX: &str = "DELETED: ";

const ITEM_PREFIX: &str = "ITEM: ";
const ID_PREFIX: &str = "ID: ";
const SIZE_PREFIX: &str = "SIZE: ";
const SUBJECT_PREFIX: &str = "SUBJECT: ";
const FROM_PREFIX: &str = "FROM: ";
const TO_PREFIX: &str = "TO: ";
const CC_PREFIX: &str = "CC: ";
const BCC_PREFIX: &str = "BCC: ";

/// Status reported by the server in the response header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseStatus {
    /// Query executed successfully.
    Success = 100,
    /// Unspecified server-side failure.
    UnknownError = 200,
    /// The server could not parse the query.
    ParseError = 201,
    /// The server's storage layer failed.
    StorageError = 202,
    /// The query timed out on the server.
    TimeOut = 203,
}

impl ResponseStatus {
    /// Numeric wire code of this status.
    pub fn code(self) -> u32 {
        self as u32
    }
}

impl FromStr for ResponseStatus {
    type Err = Error;

    /// Accepts the symbolic status name or its decimal code.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            "Success" | "100" => Ok(Self::Success),
            "UnknownError" | "200" => Ok(Self::UnknownError),
            "ParseError" | "201" => Ok(Self::ParseError),
            "StorageError" | "202" => Ok(Self::StorageError),
            "TimeOut" | "203" => Ok(Self::TimeOut),
            _ => Err(Error::UnknownStatus(input.to_string())),
        }
    }
}

impl std::fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ResponseStatus::Success => "Success",
            ResponseStatus::UnknownError => "UnknownError",
            ResponseStatus::ParseError => "ParseError",
            ResponseStatus::StorageError => "StorageError",
            ResponseStatus::TimeOut => "TimeOut",
        };
        write!(f, "{}", s)
    }
}

/// What kind of result the response carries.
///
/// Only [`ResponseAction::Matched`] responses are followed by a message
/// stream; `Deleted` responses report a count and nothing else.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResponseAction {
    /// No `MATCHED:`/`DELETED:` line was present (the default).
    #[default]
    Error,
    /// The query matched `affected_count` stored messages.
    Matched,
    /// The query deleted `affected_count` stored messages.
    Deleted,
}

/// The fixed-shape status header that precedes any message stream.
///
/// Built once per query by feeding header lines to [`parse_line`]; immutable
/// after the header block's blank-line terminator is consumed.
///
/// [`parse_line`]: ResponseHeader::parse_line
#[derive(Clone, Debug)]
pub struct ResponseHeader {
    status: ResponseStatus,
    action: ResponseAction,
    affected_count: u32,
}

impl Default for ResponseHeader {
    fn default() -> Self {
        Self {
            status: ResponseStatus::UnknownError,
            action: ResponseAction::Error,
            affected_count: 0,
        }
    }
}

impl ResponseHeader {
    /// Response status.
    pub fn status(&self) -> ResponseStatus {
        self.status
    }

    /// Response action.
    pub fn action(&self) -> ResponseAction {
        self.action
    }

    /// Number of messages the server matched or deleted.
    pub fn affected_count(&self) -> u32 {
        self.affected_count
    }

    /// Apply one raw header line (`\n` already stripped, `\r` still present).
    ///
    /// Returns `false` for lines the grammar rejects: a line with no `\r`
    /// past position zero, an unrecognized prefix, an unknown status name, or
    /// a malformed count. Rejected lines leave the header unchanged except
    /// that `MATCHED:`/`DELETED:` set the action before their count parses.
    /// A later occurrence of a field overwrites an earlier one.
    pub fn parse_line(&mut self, line: &str) -> bool {
        let Some(end) = line.find('\r') else {
            return false;
        };
        if end == 0 {
            return false;
        }
        let line = &line[..end];
        if let Some(name) = line.strip_prefix(STATUS_PREFIX) {
            match name.parse::<ResponseStatus>() {
                Ok(status) => {
                    self.status = status;
                    true
                }
                Err(_) => false,
            }
        } else if let Some(count) = line.strip_prefix(MATCHED_PREFIX) {
            self.action = ResponseAction::Matched;
            self.set_affected_count(count)
        } else if let Some(count) = line.strip_prefix(DELETED_PREFIX) {
            self.action = ResponseAction::Deleted;
            self.set_affected_count(count)
        } else {
            false
        }
    }

    fn set_affected_count(&mut self, value: &str) -> bool {
        match value.parse::<u32>() {
            Ok(count) => {
                self.affected_count = count;
                true
            }
            Err(_) => false,
        }
    }
}

/// Per-message header: identity, declared body size, and address lists.
///
/// Built line by line from a message header block. `FROM:`/`TO:`/`CC:`/`BCC:`
/// lines append in wire order (a message may list several recipients);
/// `SUBJECT:` is last-write-wins.
#[derive(Clone, Debug, Default)]
pub struct MessageHeader {
    id: u32,
    size: u32,
    subject: Option<String>,
    from: Vec<String>,
    to: Vec<String>,
    cc: Vec<String>,
    bcc: Vec<String>,
}

impl MessageHeader {
    /// Message id assigned by the server.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Declared body length in bytes.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Subject line, if the header carried one.
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Sender addresses in wire order.
    pub fn from(&self) -> &[String] {
        &self.from
    }

    /// Recipient addresses in wire order.
    pub fn to(&self) -> &[String] {
        &self.to
    }

    /// Carbon-copy addresses in wire order.
    pub fn cc(&self) -> &[String] {
        &self.cc
    }

    /// Blind-carbon-copy addresses in wire order.
    pub fn bcc(&self) -> &[String] {
        &self.bcc
    }

    /// Apply one raw header line.
    ///
    /// The line is trimmed of surrounding whitespace first. Returns `false`
    /// for unrecognized prefixes and for malformed `ID:`/`SIZE:` integers
    /// (the field keeps its previous value).
    pub fn parse_line(&mut self, line: &str) -> bool {
        let line = line.trim();
        if line.starts_with(ITEM_PREFIX) {
            // Reserved field: recognized on the wire, no defined effect yet.
        } else if let Some(value) = line.strip_prefix(ID_PREFIX) {
            match value.parse::<u32>() {
                Ok(id) => self.id = id,
                Err(_) => return false,
            }
        } else if let Some(value) = line.strip_prefix(SIZE_PREFIX) {
            match value.parse::<u32>() {
                Ok(size) => self.size = size,
                Err(_) => return false,
            }
        } else if let Some(value) = line.strip_prefix(SUBJECT_PREFIX) {
            self.subject = Some(value.to_string());
        } else if let Some(value) = line.strip_prefix(FROM_PREFIX) {
            self.from.push(value.to_string());
        } else if let Some(value) = line.strip_prefix(TO_PREFIX) {
            self.to.push(value.to_string());
        } else if let Some(value) = line.strip_prefix(CC_PREFIX) {
            self.cc.push(value.to_string());
        } else if let Some(value) = line.strip_prefix(BCC_PREFIX) {
            self.bcc.push(value.to_string());
        } else {
            return false;
        }
        true
    }
}

/// One fetched message: its header and exactly `header.size()` body bytes.
#[derive(Clone, Debug)]
pub struct Message {
    header: MessageHeader,
    body: Vec<u8>,
}

impl Message {
    pub(crate) fn new(header: MessageHeader, body: Vec<u8>) -> Self {
        Self { header, body }
    }

    /// Message header.
    pub fn header(&self) -> &MessageHeader {
        &self.header
    }

    /// Raw body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Consume the message, returning its header and body.
    pub fn into_parts(self) -> (MessageHeader, Vec<u8>) {
        (self.header, self.body)
    }
}
