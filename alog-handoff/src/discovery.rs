//! Discovery of the shared logger within the full boot environment.
use alloc::vec::Vec;
use core::fmt;

use alog_region::LogRegion;

/// Tag identifying a [`LoggerHandle`] among published handles, `"LOGP"` in
/// little-endian bytes.
pub const HANDLE_SIGNATURE: u32 = u32::from_le_bytes(*b"LOGP");

/// Version of the handle layout this crate publishes and accepts.
pub const HANDLE_VERSION: u32 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiscoveryError {
    /// The handle does not carry [`HANDLE_SIGNATURE`].
    BadSignature,
    /// The handle is from a logger revision with a different layout. Writing
    /// through it could corrupt the region, so the caller gets the found
    /// version and no region.
    IncompatibleVersion { found: u32 },
}

/// The published entry point to the shared log, one per boot.
///
/// Consumers locate the handle by signature, then call [`LoggerHandle::region`]
/// which refuses incompatible revisions instead of handing out a region whose
/// layout it cannot vouch for.
#[derive(Clone, Copy, Debug)]
pub struct LoggerHandle {
    signature: u32,
    version: u32,
    region: LogRegion,
}

impl LoggerHandle {
    pub fn new(region: LogRegion) -> Self {
        LoggerHandle {
            signature: HANDLE_SIGNATURE,
            version: HANDLE_VERSION,
            region,
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn region(&self) -> Result<LogRegion, DiscoveryError> {
        if self.signature != HANDLE_SIGNATURE {
            return Err(DiscoveryError::BadSignature);
        }

        if self.version != HANDLE_VERSION {
            return Err(DiscoveryError::IncompatibleVersion {
                found: self.version,
            });
        }

        Ok(self.region)
    }
}

/// The handle registry of one boot environment.
///
/// Stands in for whatever publication service the platform provides; handles of
/// unrelated services share it, keyed by their signatures.
#[derive(Default)]
pub struct Discovery {
    handles: Vec<LoggerHandle>,
}

impl Discovery {
    pub fn new() -> Self {
        Discovery::default()
    }

    pub fn publish(&mut self, handle: LoggerHandle) {
        self.handles.push(handle);
    }

    /// Find the logger handle by signature alone.
    ///
    /// Matching only the signature lets a consumer distinguish "no logger
    /// published" from "a logger of an incompatible revision", which
    /// [`LoggerHandle::region`] then reports.
    pub fn locate(&self) -> Option<&LoggerHandle> {
        self.handles
            .iter()
            .find(|handle| handle.signature == HANDLE_SIGNATURE)
    }
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryError::BadSignature => write!(f, "published handle is not a logger handle"),
            DiscoveryError::IncompatibleVersion { found } => {
                write!(
                    f,
                    "logger handle version {found} is incompatible with version {HANDLE_VERSION}"
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alog_region::{reserve_block, LogRegion, HEADER_LEN};

    fn region() -> LogRegion {
        LogRegion::init(reserve_block(HEADER_LEN + 128), 0).unwrap()
    }

    #[test]
    fn publish_then_locate() {
        let region = region();
        let mut discovery = Discovery::new();
        assert!(discovery.locate().is_none());

        discovery.publish(LoggerHandle::new(region));
        let located = discovery.locate().unwrap();
        assert_eq!(located.region().unwrap(), region);
    }

    #[test]
    fn incompatible_revisions_are_refused_with_their_version() {
        let handle = LoggerHandle {
            signature: HANDLE_SIGNATURE,
            version: HANDLE_VERSION + 1,
            region: region(),
        };

        let mut discovery = Discovery::new();
        discovery.publish(handle);

        // Located fine, so the caller can see which revision is present.
        let located = discovery.locate().unwrap();
        assert_eq!(located.version(), HANDLE_VERSION + 1);
        assert_eq!(
            located.region(),
            Err(DiscoveryError::IncompatibleVersion {
                found: HANDLE_VERSION + 1,
            })
        );
    }
}
