use crate::policy::HeapRegion;
use crate::util::Address;
use atomic::Atomic;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Per-region results of the last concurrent marking cycle.
///
/// The tracking policy only reads these numbers. They are written by the marking subsystem
/// through [`ConcurrentMark::update_liveness`] and [`ConcurrentMark::set_top_at_mark_start`].
pub struct ConcurrentMark {
    live_bytes: Vec<AtomicUsize>,
    top_at_mark_start: Vec<Atomic<Address>>,
}

impl ConcurrentMark {
    pub fn new(max_regions: usize) -> Self {
        Self {
            live_bytes: (0..max_regions).map(|_| AtomicUsize::new(0)).collect(),
            top_at_mark_start: (0..max_regions)
                .map(|_| Atomic::new(Address::ZERO))
                .collect(),
        }
    }

    /// Live bytes found in the region by the last marking.
    pub fn live_bytes(&self, region_index: usize) -> usize {
        self.live_bytes[region_index].load(Ordering::Relaxed)
    }

    /// The allocation top of the region when marking started. Objects above it are
    /// implicitly live.
    pub fn top_at_mark_start(&self, r: &HeapRegion) -> Address {
        self.top_at_mark_start[r.index()].load(Ordering::Relaxed)
    }

    pub fn set_top_at_mark_start(&self, r: &HeapRegion, tams: Address) {
        debug_assert!(
            tams.is_zero() || (tams >= r.bottom() && tams <= r.end()),
            "TAMS {} out of region {} [{}, {})",
            tams,
            r.index(),
            r.bottom(),
            r.end()
        );
        self.top_at_mark_start[r.index()].store(tams, Ordering::Relaxed);
    }

    /// Publish the live bytes marking found in a region.
    pub fn update_liveness(&self, r: &HeapRegion, live_bytes: usize) {
        debug_assert!(
            live_bytes <= r.capacity(),
            "Region {} cannot have {} live bytes",
            r.index(),
            live_bytes
        );
        self.live_bytes[r.index()].store(live_bytes, Ordering::Relaxed);
        r.set_live_bytes(live_bytes);
    }

    /// Forget the marking results of a region, e.g. when it is freed.
    pub fn clear_statistics(&self, r: &HeapRegion) {
        self.live_bytes[r.index()].store(0, Ordering::Relaxed);
        self.top_at_mark_start[r.index()].store(Address::ZERO, Ordering::Relaxed);
        r.set_live_bytes(0);
    }
}
