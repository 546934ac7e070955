//! Edge counter mailbox
//!
//! Hand-off between the edge-detection interrupt side and the scheduler.
//! The interrupt side only posts; the scheduler drains pending edges into
//! the counter state and owns the debounce window.

use portable_atomic::{AtomicBool, AtomicU32, Ordering};

/// Number of bit positions a mailbox tracks
pub const EDGE_BITS: usize = 32;

/// ISR-safe per-pin edge counters
pub struct EdgeMailbox {
    counter_mask: AtomicU32,
    pending: [AtomicU32; EDGE_BITS],
    fired: AtomicBool,
}

impl Default for EdgeMailbox {
    fn default() -> Self {
        Self::new()
    }
}

impl EdgeMailbox {
    pub const fn new() -> Self {
        Self {
            counter_mask: AtomicU32::new(0),
            pending: [const { AtomicU32::new(0) }; EDGE_BITS],
            fired: AtomicBool::new(false),
        }
    }

    /// Declare which bits belong to counter pins
    pub fn set_counter_mask(&self, mask: u32) {
        self.counter_mask.store(mask, Ordering::Release);
    }

    pub fn counter_mask(&self) -> u32 {
        self.counter_mask.load(Ordering::Acquire)
    }

    /// Record an edge interrupt
    ///
    /// `changed` is the bitmask of pins whose level changed. Bits outside
    /// the counter mask are ignored. Returns the counted bits; the caller
    /// disarms edge detection for them until the scheduler re-arms it.
    pub fn post(&self, changed: u32) -> u32 {
        let counted = changed & self.counter_mask();
        let mut bits = counted;
        while bits != 0 {
            let bit = bits.trailing_zeros() as usize;
            self.pending[bit].fetch_add(1, Ordering::AcqRel);
            bits &= bits - 1;
        }
        if counted != 0 {
            self.fired.store(true, Ordering::Release);
        }
        counted
    }

    /// Take the pending edge count of one bit
    pub fn take(&self, bit: u8) -> u32 {
        self.pending
            .get(usize::from(bit))
            .map_or(0, |pending| pending.swap(0, Ordering::AcqRel))
    }

    /// Take and clear the fired flag
    pub fn take_fired(&self) -> bool {
        self.fired.swap(false, Ordering::AcqRel)
    }
}
