//! The append path shared by every diagnostic producer.
use core::sync::atomic::Ordering;

use crate::clock::Clock;
use crate::entry::{encoded_len, Frame, Severity, Stage, FRAME_LEN, MAX_PAYLOAD};
use crate::region::{LogRegion, FLAG_OVERFLOW};

/// Appends framed entries to a [`LogRegion`].
///
/// One writer per producing context; all writers of one boot share the same
/// region. `write` never reports failure to its caller: a diagnostic message
/// must not be able to abort a boot, so a write that cannot be stored is counted
/// and dropped instead.
pub struct Writer {
    region: LogRegion,
    origin: Stage,
    clock: Clock,
    threshold: Severity,
}

impl Writer {
    pub fn new(region: LogRegion, origin: Stage, clock: Clock) -> Self {
        Writer {
            region,
            origin,
            clock,
            threshold: Severity::Verbose,
        }
    }

    /// Ignore entries more verbose than `threshold` before they reach the region.
    pub fn with_threshold(mut self, threshold: Severity) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn region(&self) -> LogRegion {
        self.region
    }

    /// Append one entry.
    ///
    /// Safe to call from any context that may interrupt another writer mid-write:
    /// the path below takes no lock, allocates nothing, and never spins on another
    /// writer's progress. Payloads beyond [`MAX_PAYLOAD`] are stored truncated.
    pub fn write(&self, severity: Severity, payload: &[u8]) {
        if severity > self.threshold {
            return;
        }

        let payload = &payload[..payload.len().min(MAX_PAYLOAD)];
        let len = encoded_len(payload.len()) as u64;
        let header = self.region.header();
        let capacity = header.capacity.load(Ordering::Relaxed);

        // Reservation is pure cursor arithmetic; concurrent reservations get
        // disjoint extents, so nobody overwrites anybody's bytes.
        let reserve = header.reserved.fetch_update(
            Ordering::AcqRel,
            Ordering::Acquire,
            |cursor| {
                let end = cursor.checked_add(len)?;
                (end <= capacity).then_some(end)
            },
        );

        let offset = match reserve {
            Ok(previous) => previous,
            Err(_) => {
                // Append-until-full: the earliest history is the diagnostically
                // valuable part and is never overwritten by a noisy late producer.
                header.flags.fetch_or(FLAG_OVERFLOW, Ordering::Relaxed);
                header.discarded.fetch_add(1, Ordering::Relaxed);
                return;
            }
        };

        let frame = Frame {
            severity: severity as u8,
            origin: self.origin as u8,
            payload_len: payload.len() as u16,
            timestamp: self.relative_ticks(),
        };

        self.region.store_bytes(offset, &frame.encode());
        self.region.store_bytes(offset + FRAME_LEN as u64, payload);

        // Publish. `used` may only advance over fully written bytes. A writer
        // nested above an uncommitted predecessor finds `used` short of its own
        // offset, fails the exchange and leaves publication to that predecessor;
        // the predecessor re-reads the reservation frontier after each success,
        // so every completed nested entry becomes visible with it.
        let mut publish_from = offset;
        loop {
            let frontier = header.reserved.load(Ordering::Acquire);
            match header.used.compare_exchange(
                publish_from,
                frontier,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    if header.reserved.load(Ordering::Acquire) == frontier {
                        break;
                    }
                    publish_from = frontier;
                }
                Err(_) => break,
            }
        }
    }

    fn relative_ticks(&self) -> u64 {
        let base = self.region.header().base_ticks.load(Ordering::Relaxed);
        self.clock.ticks().saturating_sub(base)
    }
}
