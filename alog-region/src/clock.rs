//! Tick source behind a vtable, so every execution context can bring its own
//! counter and hosted tests can supply a deterministic one.
use alloc::sync::Arc;

/// A table of environment functions for timestamping.
///
/// The counter must be monotonically non-decreasing for the lifetime of the boot
/// attempt; its absolute value does not matter, entries store ticks relative to
/// the value captured at region initialization.
pub struct TickVTable {
    pub ticks: fn() -> u64,
}

/// A cloneable tick source shared by all writers of one context.
#[derive(Clone)]
pub struct Clock {
    inner: Arc<Inner>,
}

struct Inner {
    vtable: TickVTable,
}

impl Clock {
    /// Create a `Clock` from a customized vtable.
    pub fn from_vtable(vtable: TickVTable) -> Self {
        Clock {
            inner: Arc::new(Inner { vtable }),
        }
    }

    #[cfg(feature = "std")]
    pub fn new() -> Self {
        fn _ticks() -> u64 {
            use std::time::{SystemTime, UNIX_EPOCH};

            match SystemTime::now().duration_since(UNIX_EPOCH) {
                Ok(elapsed) => elapsed.as_micros() as u64,
                Err(_) => 0,
            }
        }

        Self::from_vtable(TickVTable { ticks: _ticks })
    }

    pub fn ticks(&self) -> u64 {
        (self.inner.vtable.ticks)()
    }
}

#[cfg(feature = "std")]
impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
