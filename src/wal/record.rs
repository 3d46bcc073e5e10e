//! WAL record layout
//!
//! Records are little-endian and written back to back with no separators:
//!
//! ```text
//! u16              type_len
//! [u8; type_len]   type ("enqueue" | "deliver" | "ack")
//! i64              message_id
//! u32              payload_len
//! [u8; payload_len] payload (UTF-8)
//! i64              timestamp (nanoseconds since the Unix epoch)
//! u8               acked (0 | 1)
//! i32              retries
//! ```
//!
//! The layout is fixed for on-disk compatibility: there is no checksum or
//! version field, so a record is valid exactly when every field decodes.

use std::fmt;
use std::io::{self, BufRead, Read};

use chrono::{TimeZone, Utc};

use crate::topic::Message;

use super::errors::{WalError, WalResult};

/// Size of every fixed-width field in a record
const FIXED_LEN: usize = 2 + 8 + 4 + 8 + 1 + 4;

/// The state transition a record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Enqueue,
    Deliver,
    Ack,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Enqueue => "enqueue",
            EventKind::Deliver => "deliver",
            EventKind::Ack => "ack",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "enqueue" => Some(EventKind::Enqueue),
            "deliver" => Some(EventKind::Deliver),
            "ack" => Some(EventKind::Ack),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One persisted state transition of one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub kind: EventKind,
    pub message: Message,
}

/// Why a record could not be decoded
#[derive(Debug)]
pub enum DecodeError {
    /// The source ended inside the record
    Truncated,
    /// All bytes were present but do not form a valid record
    Malformed(String),
    /// The source itself failed
    Io(io::Error),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Truncated => write!(f, "truncated record"),
            DecodeError::Malformed(reason) => write!(f, "malformed record: {}", reason),
            DecodeError::Io(e) => write!(f, "read error: {}", e),
        }
    }
}

impl From<io::Error> for DecodeError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            DecodeError::Truncated
        } else {
            DecodeError::Io(e)
        }
    }
}

impl LogEntry {
    pub fn new(kind: EventKind, message: Message) -> Self {
        Self { kind, message }
    }

    /// Number of bytes `encode_into` appends.
    pub fn encoded_len(&self) -> usize {
        FIXED_LEN + self.kind.as_str().len() + self.message.payload.len()
    }

    /// Appends the encoded record to `buf`.
    ///
    /// Fails only when the payload does not fit the 32-bit length field;
    /// `buf` is left untouched in that case.
    pub fn encode_into(&self, buf: &mut Vec<u8>) -> WalResult<()> {
        let msg = &self.message;
        let payload_len = u32::try_from(msg.payload.len())
            .map_err(|_| WalError::record_too_large(msg.id, msg.payload.len()))?;
        let kind = self.kind.as_str();

        buf.reserve(self.encoded_len());
        buf.extend_from_slice(&(kind.len() as u16).to_le_bytes());
        buf.extend_from_slice(kind.as_bytes());
        buf.extend_from_slice(&msg.id.to_le_bytes());
        buf.extend_from_slice(&payload_len.to_le_bytes());
        buf.extend_from_slice(msg.payload.as_bytes());
        buf.extend_from_slice(&timestamp_nanos(msg).to_le_bytes());
        buf.push(u8::from(msg.acked));
        buf.extend_from_slice(&msg.retries.to_le_bytes());
        Ok(())
    }

    pub fn encode(&self) -> WalResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut buf)?;
        Ok(buf)
    }

    /// Decodes the next record from `reader`.
    ///
    /// `remaining` is the number of bytes left in the source; a length
    /// field pointing past it is reported as truncation without allocating.
    ///
    /// Returns `Ok(None)` when the source is exhausted exactly at a record
    /// boundary, and the entry with its encoded size otherwise.
    pub fn decode<R: BufRead>(
        reader: &mut R,
        remaining: u64,
    ) -> Result<Option<(LogEntry, usize)>, DecodeError> {
        if reader.fill_buf()?.is_empty() {
            return Ok(None);
        }

        let type_len = u16::from_le_bytes(read_array(reader)?) as usize;
        let type_bytes = read_vec(reader, type_len, remaining)?;
        let kind = std::str::from_utf8(&type_bytes)
            .ok()
            .and_then(EventKind::parse)
            .ok_or_else(|| {
                DecodeError::Malformed(format!(
                    "unknown event type {:?}",
                    String::from_utf8_lossy(&type_bytes)
                ))
            })?;

        let id = i64::from_le_bytes(read_array(reader)?);

        let payload_len = u32::from_le_bytes(read_array(reader)?) as usize;
        let payload_bytes = read_vec(reader, payload_len, remaining)?;
        let payload = String::from_utf8(payload_bytes).map_err(|e| {
            DecodeError::Malformed(format!("payload of message {} is not UTF-8: {}", id, e))
        })?;

        let nanos = i64::from_le_bytes(read_array(reader)?);
        let acked = match read_array::<1, _>(reader)?[0] {
            0 => false,
            1 => true,
            other => {
                return Err(DecodeError::Malformed(format!(
                    "acked flag of message {} is {}",
                    id, other
                )))
            }
        };
        let retries = i32::from_le_bytes(read_array(reader)?);

        let message = Message {
            id,
            payload,
            timestamp: Utc.timestamp_nanos(nanos),
            acked,
            retries,
        };
        let consumed = FIXED_LEN + type_len + payload_len;

        Ok(Some((LogEntry::new(kind, message), consumed)))
    }
}

fn timestamp_nanos(msg: &Message) -> i64 {
    // Out of range only beyond the year 2262
    msg.timestamp.timestamp_nanos_opt().unwrap_or(i64::MAX)
}

fn read_array<const N: usize, R: Read>(reader: &mut R) -> Result<[u8; N], DecodeError> {
    let mut buf = [0u8; N];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

fn read_vec<R: Read>(reader: &mut R, len: usize, remaining: u64) -> Result<Vec<u8>, DecodeError> {
    if len as u64 > remaining {
        return Err(DecodeError::Truncated);
    }
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}
