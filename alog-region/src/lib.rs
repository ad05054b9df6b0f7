//! A fixed-capacity log region shared by every stage of one boot attempt.
//!
//! The region is a single contiguous block, owned by whichever stage reserved it and
//! only ever *located* (never moved, never resized) by later stages. All diagnostic
//! producers funnel into [`Writer`], which appends framed entries; readers walk the
//! committed prefix through their own [`ReadCursor`] without coordinating with
//! writers or with each other.
//!
//! ## What "concurrent" means here
//!
//! There is no scheduler underneath this crate. Writers may however be re-entered
//! from interrupt-like management contexts at arbitrary points, including mid-write.
//! The append path therefore never blocks, never allocates and never takes a lock:
//! space is reserved with a single compare-and-swap, payload bytes are plain atomic
//! stores, and the committed cursor only ever advances over fully written entries.
//! A reader racing a writer at the tail may or may not see the newest entry; it can
//! never see a partial one.
//!
//! Logging is diagnostic, not load-bearing. Failure to reserve a region means a
//! boot without a log, and a full region drops new entries rather than destroying
//! the earliest history.
#![cfg_attr(not(feature = "std"), no_std)]

mod clock;
mod entry;
mod read;
mod region;
mod write;

extern crate alloc;
#[cfg(test)]
extern crate std;

pub use clock::{Clock, TickVTable};
pub use entry::{Severity, Stage, ENTRY_SIGNATURE, MAX_PAYLOAD};
pub use read::{MessageBlock, ReadCursor, ReadError};
pub use region::{
    reserve_block, LogRegion, RegionError, HEADER_LEN, REGION_SIGNATURE, REGION_VERSION,
};
pub use write::Writer;
