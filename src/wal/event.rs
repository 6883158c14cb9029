//! Log Event Module
//!
//! The mutation record and its one-line, tab-separated encoding:
//!
//! ```text
//! <sequence>\t<event type>\t<key>\t<value>\n
//! ```
//!
//! Backslash, tab, newline and carriage return inside keys and values are
//! escaped so any byte sequence survives a round trip.

use bytes::Bytes;

use crate::error::{KvError, Result};

// == Event Type ==
/// Kind of mutation, stored as its numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EventType {
    Put = 1,
    Delete = 2,
}

impl EventType {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(EventType::Put),
            2 => Some(EventType::Delete),
            _ => None,
        }
    }
}

// == Event ==
/// A single logged mutation.
///
/// `sequence` is 0 until the log writer assigns the next number at append time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub sequence: u64,
    pub event_type: EventType,
    pub key: String,
    pub value: Bytes,
}

impl Event {
    pub fn put(key: impl Into<String>, value: Bytes) -> Self {
        Self {
            sequence: 0,
            event_type: EventType::Put,
            key: key.into(),
            value,
        }
    }

    pub fn delete(key: impl Into<String>) -> Self {
        Self {
            sequence: 0,
            event_type: EventType::Delete,
            key: key.into(),
            value: Bytes::new(),
        }
    }

    // == Encode ==
    /// Appends the newline-terminated record to `buf`.
    pub fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.sequence.to_string().as_bytes());
        buf.push(b'\t');
        buf.extend_from_slice(self.event_type.code().to_string().as_bytes());
        buf.push(b'\t');
        escape_into(buf, self.key.as_bytes());
        buf.push(b'\t');
        escape_into(buf, &self.value);
        buf.push(b'\n');
    }

    // == Decode ==
    /// Parses one record with its trailing newline already stripped.
    ///
    /// `line` is the 1-based line number used in error reports.
    pub fn decode(record: &[u8], line: usize) -> Result<Self> {
        let malformed = |reason: &str| KvError::MalformedEvent {
            line,
            reason: reason.to_string(),
        };

        let fields: Vec<&[u8]> = record.split(|b| *b == b'\t').collect();
        let [sequence, event_type, key, value] = fields.as_slice() else {
            return Err(malformed(&format!("expected 4 fields, found {}", fields.len())));
        };

        let sequence = parse_number::<u64>(sequence).ok_or_else(|| malformed("invalid sequence"))?;
        let event_type = parse_number::<u8>(event_type)
            .and_then(EventType::from_code)
            .ok_or_else(|| malformed("unknown event type"))?;
        let key = unescape(key)
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .ok_or_else(|| malformed("invalid key"))?;
        let value = unescape(value).ok_or_else(|| malformed("invalid value escape"))?;

        Ok(Self {
            sequence,
            event_type,
            key,
            value: Bytes::from(value),
        })
    }
}

fn parse_number<T: std::str::FromStr>(field: &[u8]) -> Option<T> {
    std::str::from_utf8(field).ok()?.parse().ok()
}

fn escape_into(buf: &mut Vec<u8>, bytes: &[u8]) {
    for &b in bytes {
        match b {
            b'\\' => buf.extend_from_slice(b"\\\\"),
            b'\t' => buf.extend_from_slice(b"\\t"),
            b'\n' => buf.extend_from_slice(b"\\n"),
            b'\r' => buf.extend_from_slice(b"\\r"),
            _ => buf.push(b),
        }
    }
}

fn unescape(field: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(field.len());
    let mut bytes = field.iter();
    while let Some(&b) = bytes.next() {
        if b != b'\\' {
            out.push(b);
            continue;
        }
        match bytes.next()? {
            b'\\' => out.push(b'\\'),
            b't' => out.push(b'\t'),
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            _ => return None,
        }
    }
    Some(out)
}
