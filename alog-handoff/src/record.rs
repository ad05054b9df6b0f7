//! The stage-boundary record left by the early stage.
//!
//! The record rides in the configuration list the successor stage walks anyway,
//! next to entries from unrelated producers. It only describes where the region
//! lives; the region's own header stays the single source of truth for
//! capacity, cursors and flags.
use alloc::vec::Vec;

use alog_region::{LogRegion, RegionError};

/// Tag at the start of a serialized [`HandoffRecord`], `"ALHB"` in little-endian
/// bytes.
pub const RECORD_SIGNATURE: u32 = u32::from_le_bytes(*b"ALHB");

/// Serialized size of a [`HandoffRecord`].
pub const RECORD_LEN: usize = 20;

/// Physical location of a log region, as left behind by the early stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HandoffRecord {
    pub base_address: u64,
    pub length: u64,
}

impl HandoffRecord {
    pub fn for_region(region: &LogRegion) -> Self {
        HandoffRecord {
            base_address: region.base_address(),
            length: region.total_len() as u64,
        }
    }

    /// Serialize for deposit in a configuration list. All fields little-endian.
    pub fn encode(&self) -> [u8; RECORD_LEN] {
        let mut raw = [0u8; RECORD_LEN];
        raw[..4].copy_from_slice(&RECORD_SIGNATURE.to_le_bytes());
        raw[4..12].copy_from_slice(&self.base_address.to_le_bytes());
        raw[12..20].copy_from_slice(&self.length.to_le_bytes());
        raw
    }

    /// `None` for records of other producers, which carry other signatures.
    pub fn decode(raw: &[u8]) -> Option<Self> {
        let raw: &[u8; RECORD_LEN] = raw.try_into().ok()?;
        let signature = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
        if signature != RECORD_SIGNATURE {
            return None;
        }

        Some(HandoffRecord {
            base_address: u64::from_le_bytes(raw[4..12].try_into().ok()?),
            length: u64::from_le_bytes(raw[12..20].try_into().ok()?),
        })
    }

    /// Re-attach the region this record points to, validating its header.
    ///
    /// # Safety
    /// Caller asserts that the record describes memory that is mapped, lives for
    /// the rest of the program, and is not reused for anything else. A record
    /// taken from the configuration list of the same boot satisfies this as long
    /// as the early stage placed the region outside memory the successor
    /// reclaims.
    pub unsafe fn attach(&self) -> Result<LogRegion, RegionError> {
        unsafe { LogRegion::from_raw(self.base_address as *const u8, self.length as usize) }
    }
}

/// The configuration list a stage hands to its successor.
///
/// Entries are opaque byte strings from many producers. The logger's record is
/// consumed by [`HandoffList::take_logger_record`] exactly once; everything else
/// passes through untouched.
#[derive(Default)]
pub struct HandoffList {
    entries: Vec<Vec<u8>>,
}

impl HandoffList {
    pub fn new() -> Self {
        HandoffList::default()
    }

    /// Deposit an entry of some unrelated producer.
    pub fn deposit_raw(&mut self, entry: Vec<u8>) {
        self.entries.push(entry);
    }

    /// Deposit the logger's record.
    pub fn deposit(&mut self, record: HandoffRecord) {
        self.entries.push(record.encode().to_vec());
    }

    /// Remove and return the logger's record, if the list carries one.
    ///
    /// The second call returns `None`: the record describes a unique live
    /// resource and two owners appending through independent headers would
    /// corrupt it.
    pub fn take_logger_record(&mut self) -> Option<HandoffRecord> {
        let position = self
            .entries
            .iter()
            .position(|entry| HandoffRecord::decode(entry).is_some())?;

        let entry = self.entries.remove(position);
        HandoffRecord::decode(&entry)
    }

    /// The remaining entries, in deposit order.
    pub fn entries(&self) -> impl Iterator<Item = &[u8]> {
        self.entries.iter().map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
