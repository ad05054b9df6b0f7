//! The backing block and its header.
use core::sync::atomic::{AtomicU32, AtomicU64, AtomicU8, Ordering};

/// Tag identifying a valid region header, `"ALOG"` in little-endian bytes.
pub const REGION_SIGNATURE: u32 = u32::from_le_bytes(*b"ALOG");

/// Header layout version written by this build.
pub const REGION_VERSION: u32 = 1;

/// Bytes occupied by [`RegionHeader`] at the start of the block.
pub const HEADER_LEN: usize = core::mem::size_of::<RegionHeader>();

pub(crate) const FLAG_OVERFLOW: u32 = 1 << 0;

/// The header at offset 0 of the block.
///
/// Everything in here is shared mutable state between boot stages that never saw
/// each other's code run, so every field is a full atomic. The layout is fixed;
/// `version` gates any future change.
#[repr(C)]
pub(crate) struct RegionHeader {
    pub(crate) signature: AtomicU32,
    pub(crate) version: AtomicU32,
    /// Data-area bytes, excluding this header.
    pub(crate) capacity: AtomicU64,
    /// Reservation cursor. `used <= reserved <= capacity` at all times.
    pub(crate) reserved: AtomicU64,
    /// Committed cursor. Readers trust bytes strictly below it.
    pub(crate) used: AtomicU64,
    /// Tick counter value at initialization; entry timestamps are relative to it.
    pub(crate) base_ticks: AtomicU64,
    /// Entries dropped after the region filled up.
    pub(crate) discarded: AtomicU64,
    pub(crate) flags: AtomicU32,
    _pad: AtomicU32,
}

/// A located log region: header plus data area over caller-owned memory.
///
/// Copyable by design. Handing a `LogRegion` to another component shares the
/// region, it does not transfer ownership of the backing memory.
#[derive(Clone, Copy)]
pub struct LogRegion {
    block: &'static [AtomicU8],
    header: &'static RegionHeader,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegionError {
    /// The block cannot hold the header and at least one byte of data.
    TooSmall,
    /// The block start is not aligned for the header's atomics.
    Misaligned,
    /// The header does not carry the region signature.
    BadSignature,
    /// The header layout version is not one this build understands.
    BadVersion,
    /// The capacity recorded in the header disagrees with the block length.
    BadCapacity,
    /// The write cursors are out of bounds for the recorded capacity.
    BadCursor,
}

impl LogRegion {
    /// Start a fresh log over `memory`, which the caller owns for the rest of the
    /// boot attempt and must never move.
    ///
    /// `base_ticks` is the tick counter at this moment; all entry timestamps are
    /// relative to it.
    pub fn init(memory: &'static [AtomicU8], base_ticks: u64) -> Result<Self, RegionError> {
        let region = Self::over(memory)?;
        let capacity = (memory.len() - HEADER_LEN) as u64;

        for byte in &memory[..HEADER_LEN] {
            byte.store(0, Ordering::Relaxed);
        }

        region.header.capacity.store(capacity, Ordering::Relaxed);
        region.header.base_ticks.store(base_ticks, Ordering::Relaxed);
        region.header.version.store(REGION_VERSION, Ordering::Relaxed);
        // The signature is what every later stage trusts; it goes last.
        region.header.signature.store(REGION_SIGNATURE, Ordering::Release);

        Ok(region)
    }

    /// Locate an existing log over `memory`, validating the header before trusting
    /// any of its fields.
    pub fn attach(memory: &'static [AtomicU8]) -> Result<Self, RegionError> {
        let region = Self::over(memory)?;
        let header = region.header;

        if header.signature.load(Ordering::Acquire) != REGION_SIGNATURE {
            return Err(RegionError::BadSignature);
        }

        if header.version.load(Ordering::Relaxed) != REGION_VERSION {
            return Err(RegionError::BadVersion);
        }

        let capacity = header.capacity.load(Ordering::Relaxed);
        if capacity != (memory.len() - HEADER_LEN) as u64 {
            return Err(RegionError::BadCapacity);
        }

        let used = header.used.load(Ordering::Acquire);
        let reserved = header.reserved.load(Ordering::Acquire);
        if used > reserved || reserved > capacity {
            return Err(RegionError::BadCursor);
        }

        Ok(region)
    }

    /// Locate an existing log by absolute address, the cross-stage handoff path.
    ///
    /// # Safety
    ///
    /// The caller promises that `base` points to a block of at least `len` bytes
    /// which stays valid, and at this address, for the rest of the boot attempt.
    pub unsafe fn from_raw(base: *const u8, len: usize) -> Result<Self, RegionError> {
        let memory = &*core::ptr::slice_from_raw_parts(base as *const AtomicU8, len);
        Self::attach(memory)
    }

    fn over(memory: &'static [AtomicU8]) -> Result<Self, RegionError> {
        if memory.len() <= HEADER_LEN {
            return Err(RegionError::TooSmall);
        }

        if memory.as_ptr() as usize % core::mem::align_of::<RegionHeader>() != 0 {
            return Err(RegionError::Misaligned);
        }

        // Safety: length and alignment were checked above, `RegionHeader` consists
        // of atomics only, and the pointee is initialized caller-owned memory. The
        // `'static` block keeps the reference valid.
        let header = unsafe { &*(memory.as_ptr() as *const RegionHeader) };

        Ok(LogRegion {
            block: memory,
            header,
        })
    }

    pub fn capacity(&self) -> u64 {
        self.header.capacity.load(Ordering::Relaxed)
    }

    /// Committed bytes; monotonically non-decreasing within one boot.
    pub fn used(&self) -> u64 {
        self.header.used.load(Ordering::Acquire)
    }

    /// Whether an entry has been dropped because the region was full. Sticky until
    /// the region is reinitialized at the next boot.
    pub fn overflowed(&self) -> bool {
        self.header.flags.load(Ordering::Relaxed) & FLAG_OVERFLOW != 0
    }

    /// Entries dropped after the region filled up.
    pub fn discarded(&self) -> u64 {
        self.header.discarded.load(Ordering::Relaxed)
    }

    pub fn version(&self) -> u32 {
        self.header.version.load(Ordering::Relaxed)
    }

    pub fn base_ticks(&self) -> u64 {
        self.header.base_ticks.load(Ordering::Relaxed)
    }

    /// Absolute address of the block, stable for the rest of the boot attempt.
    pub fn base_address(&self) -> u64 {
        self.block.as_ptr() as u64
    }

    /// Length of the whole block, header included.
    pub fn total_len(&self) -> usize {
        self.block.len()
    }

    /// Copy the whole block into an owned buffer, committed entries first.
    ///
    /// The result is a valid region image for [`LogRegion::attach`] or an offline
    /// dump tool. Entries committed while the copy runs may be cut off at the
    /// image's recorded cursor, never torn.
    pub fn image(&self) -> alloc::vec::Vec<u8> {
        let mut out = alloc::vec![0u8; self.block.len()];
        for (byte, slot) in out.iter_mut().zip(self.block) {
            *byte = slot.load(Ordering::Relaxed);
        }
        // The cursor snapshot decides which entries the image admits to. A write
        // still in flight during the copy is cut off here, so both cursors of the
        // image collapse to the committed one.
        let used = self.used();
        let reserved_at = core::mem::offset_of!(RegionHeader, reserved);
        let used_at = core::mem::offset_of!(RegionHeader, used);
        out[reserved_at..reserved_at + 8].copy_from_slice(&used.to_le_bytes());
        out[used_at..used_at + 8].copy_from_slice(&used.to_le_bytes());
        out
    }

    pub(crate) fn header(&self) -> &RegionHeader {
        self.header
    }

    pub(crate) fn store_bytes(&self, offset: u64, bytes: &[u8]) {
        let start = HEADER_LEN + offset as usize;
        for (slot, &byte) in self.block[start..start + bytes.len()].iter().zip(bytes) {
            slot.store(byte, Ordering::Relaxed);
        }
    }

    pub(crate) fn load_bytes(&self, offset: u64, out: &mut [u8]) {
        let start = HEADER_LEN + offset as usize;
        for (slot, byte) in self.block[start..start + out.len()].iter().zip(out) {
            *byte = slot.load(Ordering::Relaxed);
        }
    }
}

/// Reserve a block of backing memory for the rest of the process.
///
/// The hosted equivalent of carving the region out of a boot-time memory map: the
/// allocation is leaked so the address never moves. Aligned for [`RegionHeader`].
pub fn reserve_block(len: usize) -> &'static [AtomicU8] {
    let words = alloc::vec![0u64; len.div_ceil(8)].into_boxed_slice();
    let ptr = alloc::boxed::Box::leak(words).as_mut_ptr() as *mut AtomicU8;
    // Safety: the leaked allocation holds at least `len` bytes, all initialized to
    // zero, and `AtomicU8` has the layout of `u8`.
    unsafe { &*core::ptr::slice_from_raw_parts(ptr, len) }
}

impl core::fmt::Display for RegionError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RegionError::TooSmall => write!(f, "block too small for a log region"),
            RegionError::Misaligned => write!(f, "block misaligned for the region header"),
            RegionError::BadSignature => write!(f, "missing region signature"),
            RegionError::BadVersion => write!(f, "unsupported region header version"),
            RegionError::BadCapacity => write!(f, "recorded capacity does not match the block"),
            RegionError::BadCursor => write!(f, "write cursors out of bounds"),
        }
    }
}

#[test]
fn init_then_attach() {
    let memory = reserve_block(HEADER_LEN + 128);

    let region = LogRegion::init(memory, 77).unwrap();
    assert_eq!(region.capacity(), 128);
    assert_eq!(region.used(), 0);
    assert_eq!(region.base_ticks(), 77);
    assert!(!region.overflowed());

    let again = LogRegion::attach(memory).unwrap();
    assert_eq!(again.base_address(), region.base_address());
    assert_eq!(again.capacity(), 128);
}

#[test]
fn attach_rejects_garbage() {
    let memory = reserve_block(HEADER_LEN + 128);
    assert_eq!(LogRegion::attach(memory), Err(RegionError::BadSignature));

    let region = LogRegion::init(memory, 0).unwrap();
    memory[0].fetch_xor(0xff, Ordering::Relaxed);
    assert_eq!(LogRegion::attach(memory), Err(RegionError::BadSignature));
    memory[0].fetch_xor(0xff, Ordering::Relaxed);

    region.header().version.store(99, Ordering::Relaxed);
    assert_eq!(LogRegion::attach(memory), Err(RegionError::BadVersion));
}

#[test]
fn attach_rejects_bad_cursors() {
    let memory = reserve_block(HEADER_LEN + 128);
    let region = LogRegion::init(memory, 0).unwrap();

    region.header().used.store(4096, Ordering::Relaxed);
    assert_eq!(LogRegion::attach(memory), Err(RegionError::BadCursor));
}

#[test]
fn too_small_blocks() {
    assert_eq!(
        LogRegion::init(reserve_block(HEADER_LEN), 0),
        Err(RegionError::TooSmall)
    );
}

impl PartialEq for LogRegion {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.block, other.block)
    }
}

impl core::fmt::Debug for LogRegion {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LogRegion")
            .field("base", &self.block.as_ptr())
            .field("capacity", &self.capacity())
            .field("used", &self.used())
            .finish()
    }
}
