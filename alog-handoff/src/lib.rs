//! Hand a live [`LogRegion`](alog_region::LogRegion) across the stage boundaries
//! of one boot.
//!
//! Two mechanisms, for the two boundaries a boot has. The early stage leaves a
//! small self-describing record in the configuration list its successor already
//! walks; the successor takes the record out of the list once, re-attaches the
//! region at the same physical range, and keeps appending. Within the full boot
//! environment, discovery instead goes through a published [`LoggerHandle`] that
//! later producers locate by signature and validate by version.
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;
#[cfg(test)]
extern crate std;

mod discovery;
mod record;

pub use discovery::{Discovery, DiscoveryError, LoggerHandle, HANDLE_SIGNATURE, HANDLE_VERSION};
pub use record::{HandoffList, HandoffRecord, RECORD_LEN, RECORD_SIGNATURE};
