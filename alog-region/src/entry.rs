//! Framing of one log message.
//!
//! Fixed 16-byte header, variable payload, all numeric fields little-endian
//! regardless of host. The header carries everything a reader needs to skip to
//! the next entry, so payloads may contain arbitrary bytes.

/// Tag at the start of every framed entry, `"ALM2"` in little-endian bytes.
pub const ENTRY_SIGNATURE: u32 = u32::from_le_bytes(*b"ALM2");

/// Bytes of the fixed frame header.
pub(crate) const FRAME_LEN: usize = 16;

/// Longest payload one entry can carry; longer writes are stored truncated.
pub const MAX_PAYLOAD: usize = u16::MAX as usize;

/// Message severity, most severe first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Severity {
    Error = 0,
    Warning = 1,
    Info = 2,
    Verbose = 3,
}

/// The boot stage, and with it the privilege context, that produced an entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Stage {
    /// Minimal-environment bootstrap, before permanent memory exists.
    Early = 0,
    /// The fuller-featured stage that drives most of boot.
    Boot = 1,
    /// The privileged, interrupt-like management context.
    Management = 2,
    /// After exit of boot services.
    Runtime = 3,
}

impl Severity {
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Severity::Error),
            1 => Some(Severity::Warning),
            2 => Some(Severity::Info),
            3 => Some(Severity::Verbose),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
            Severity::Verbose => "VERBOSE",
        }
    }
}

impl Stage {
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Stage::Early),
            1 => Some(Stage::Boot),
            2 => Some(Stage::Management),
            3 => Some(Stage::Runtime),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Early => "early",
            Stage::Boot => "boot",
            Stage::Management => "mgmt",
            Stage::Runtime => "runtime",
        }
    }
}

/// Decoded fields of one frame header.
///
/// Severity and origin stay raw here; only the signature gates decoding, and a
/// reader should not lose an entry over an unknown severity byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Frame {
    pub severity: u8,
    pub origin: u8,
    pub payload_len: u16,
    pub timestamp: u64,
}

impl Frame {
    pub(crate) fn encoded_len(&self) -> usize {
        FRAME_LEN + usize::from(self.payload_len)
    }

    pub(crate) fn encode(&self) -> [u8; FRAME_LEN] {
        let mut raw = [0u8; FRAME_LEN];
        raw[..4].copy_from_slice(&ENTRY_SIGNATURE.to_le_bytes());
        raw[4] = self.severity;
        raw[5] = self.origin;
        raw[6..8].copy_from_slice(&self.payload_len.to_le_bytes());
        raw[8..16].copy_from_slice(&self.timestamp.to_le_bytes());
        raw
    }

    /// `None` if the signature does not match; no other field is read before that
    /// check passes.
    pub(crate) fn decode(raw: &[u8; FRAME_LEN]) -> Option<Self> {
        let signature = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
        if signature != ENTRY_SIGNATURE {
            return None;
        }

        Some(Frame {
            severity: raw[4],
            origin: raw[5],
            payload_len: u16::from_le_bytes([raw[6], raw[7]]),
            timestamp: u64::from_le_bytes(raw[8..16].try_into().ok()?),
        })
    }
}

/// Bytes an entry with a payload of `payload_len` occupies in the region.
pub(crate) fn encoded_len(payload_len: usize) -> usize {
    FRAME_LEN + payload_len.min(MAX_PAYLOAD)
}

#[test]
fn frame_roundtrip() {
    let frame = Frame {
        severity: Severity::Warning as u8,
        origin: Stage::Management as u8,
        payload_len: 513,
        timestamp: 0xdead_beef_0042,
    };

    let raw = frame.encode();
    assert_eq!(Frame::decode(&raw), Some(frame));
    assert_eq!(frame.encoded_len(), FRAME_LEN + 513);
}

#[test]
fn decode_checks_signature_first() {
    let mut raw = Frame {
        severity: 0,
        origin: 0,
        payload_len: 4,
        timestamp: 1,
    }
    .encode();

    raw[0] ^= 0x01;
    assert_eq!(Frame::decode(&raw), None);
}

#[test]
fn severity_orders_most_severe_first() {
    assert!(Severity::Error < Severity::Verbose);
    assert_eq!(Severity::from_raw(7), None);
    assert_eq!(Stage::from_raw(2), Some(Stage::Management));
}
