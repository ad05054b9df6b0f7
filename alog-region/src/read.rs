//! Non-destructive, restartable iteration over committed entries.
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::sync::atomic::Ordering;

use crate::entry::{Frame, Severity, Stage, FRAME_LEN};
use crate::region::LogRegion;

/// Reader-owned iteration state, independent of the region's write cursor.
///
/// Any number of cursors may walk the same region at the same time, with writers
/// still appending; none of them interfere with any other.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReadCursor {
    offset: u64,
}

impl ReadCursor {
    pub const fn new() -> Self {
        ReadCursor { offset: 0 }
    }

    /// Restart iteration from the first entry. Idempotent.
    pub fn reset(&mut self) {
        self.offset = 0;
    }

    /// Region offset of the next entry this cursor would decode.
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadError {
    /// The frame at `offset` does not carry the entry signature. Everything before
    /// it was returned correctly; nothing at or after it can be trusted.
    Corrupt { offset: u64 },
    /// The frame at `offset` declares a payload extending past the committed
    /// cursor: a truncated image, or a header written by a foreign tool.
    Truncated { offset: u64 },
}

/// One decoded entry: raw header fields plus the payload bytes as written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageBlock {
    severity: u8,
    origin: u8,
    timestamp: u64,
    payload: Vec<u8>,
}

impl MessageBlock {
    pub fn severity(&self) -> Option<Severity> {
        Severity::from_raw(self.severity)
    }

    pub fn severity_raw(&self) -> u8 {
        self.severity
    }

    pub fn origin(&self) -> Option<Stage> {
        Stage::from_raw(self.origin)
    }

    pub fn origin_raw(&self) -> u8 {
        self.origin
    }

    /// Ticks since region initialization at which the entry was written.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Render `timestamp severity origin payload` as one text line.
    ///
    /// Unknown severity or origin bytes are shown raw rather than suppressing the
    /// entry; payload bytes that are not UTF-8 are replaced, not dropped.
    pub fn render(&self) -> String {
        use core::fmt::Write as _;

        let mut line = String::new();
        let _ = write!(line, "{:>12} ", self.timestamp);

        match self.severity() {
            Some(severity) => {
                let _ = write!(line, "{:<7} ", severity.as_str());
            }
            None => {
                let _ = write!(line, "sev:{:<3} ", self.severity);
            }
        }

        match self.origin() {
            Some(origin) => {
                let _ = write!(line, "{:<7} ", origin.as_str());
            }
            None => {
                let _ = write!(line, "org:{:<3} ", self.origin);
            }
        }

        let text = String::from_utf8_lossy(&self.payload);
        line.push_str(text.trim_end_matches(['\r', '\n']));
        line
    }
}

impl LogRegion {
    /// Decode the next committed entry, advancing `cursor` past it.
    ///
    /// `Ok(None)` is end-of-log. The committed cursor is re-read on every call:
    /// iteration is live, and entries appended after a cursor already reported
    /// end-of-log show up on the next call, in order.
    pub fn next_block(&self, cursor: &mut ReadCursor) -> Result<Option<MessageBlock>, ReadError> {
        let used = self.header().used.load(Ordering::Acquire);
        let offset = cursor.offset;

        if offset >= used {
            return Ok(None);
        }

        if used - offset < FRAME_LEN as u64 {
            return Err(ReadError::Truncated { offset });
        }

        let mut raw = [0u8; FRAME_LEN];
        self.load_bytes(offset, &mut raw);
        let frame = Frame::decode(&raw).ok_or(ReadError::Corrupt { offset })?;

        let end = offset + frame.encoded_len() as u64;
        if end > used {
            return Err(ReadError::Truncated { offset });
        }

        let mut payload = alloc::vec![0u8; usize::from(frame.payload_len)];
        self.load_bytes(offset + FRAME_LEN as u64, &mut payload);

        // The cursor moves only on success, so a caller can report the offset an
        // iteration stopped at.
        cursor.offset = end;

        Ok(Some(MessageBlock {
            severity: frame.severity,
            origin: frame.origin,
            timestamp: frame.timestamp,
            payload,
        }))
    }

    /// As [`LogRegion::next_block`], rendered as a human-readable line.
    pub fn next_line(&self, cursor: &mut ReadCursor) -> Result<Option<String>, ReadError> {
        let Some(block) = self.next_block(cursor)? else {
            return Ok(None);
        };

        Ok(Some(block.render()))
    }
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadError::Corrupt { offset } => {
                write!(f, "corrupt entry header at region offset {offset}")
            }
            ReadError::Truncated { offset } => {
                write!(f, "entry at region offset {offset} extends past the committed log")
            }
        }
    }
}
