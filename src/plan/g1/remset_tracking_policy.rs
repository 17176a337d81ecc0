//! The remembered-set tracking policy decides, for every region, whether the collector
//! maintains a remembered set for it.
//!
//! A remembered set costs write-barrier work and memory, and only pays off for regions that
//! may be evacuated in an incremental collection. The policy is consulted at four points:
//!
//! * when a region is allocated ([`RemSetTrackingPolicy::update_at_allocate`]),
//! * when a region is freed ([`RemSetTrackingPolicy::update_at_free`]),
//! * after marking, to select regions whose remembered sets will be rebuilt
//!   ([`RemSetTrackingPolicy::update_humongous_before_rebuild`] and
//!   [`RemSetTrackingPolicy::update_old_before_rebuild`]),
//! * after the rebuild ([`RemSetTrackingPolicy::update_after_rebuild`]).
//!
//! The policy keeps no state of its own. All state lives in the regions' remembered sets, so
//! the policy can be re-entered for every rebuild without synchronization. Everything except
//! allocation and free runs at a safepoint.

use super::heap::G1Heap;
use crate::policy::HeapRegion;

#[derive(Debug, Default, Clone, Copy)]
pub struct RemSetTrackingPolicy;

impl RemSetTrackingPolicy {
    pub fn new() -> Self {
        Self
    }

    /// Set up the tracking state of a newly allocated region. The region is not yet visible to
    /// other threads.
    pub fn update_at_allocate(&self, r: &HeapRegion) {
        debug_assert!(
            r.is_young() || r.is_humongous() || r.is_old(),
            "Region {} with unexpected heap region type {}",
            r.index(),
            r.get_type_str()
        );
        if r.is_old() {
            // Most new old regions are never collected incrementally before the next marking
            // cycle, so do not track them by default.
            r.rem_set().set_state_untracked();
            return;
        }
        // Young regions are collected in every pause. Humongous regions need a remembered set
        // for eager reclaim.
        r.rem_set().set_state_complete();
    }

    /// Called when a region is returned to the free pool. The remembered set itself is
    /// released by the region manager.
    pub fn update_at_free(&self, _r: &HeapRegion) {
        /* nothing to do */
    }

    /// Decide whether to rebuild the remembered set of the humongous object starting at `r`.
    /// Returns true if the object was selected, in which case every region of the object is
    /// now `Updating`.
    pub fn update_humongous_before_rebuild(&self, heap: &G1Heap, r: &HeapRegion) -> bool {
        debug_assert!(heap.is_at_safepoint(), "should be at safepoint");
        debug_assert!(
            r.is_starts_humongous(),
            "Region {} should be Humongous",
            r.index()
        );
        debug_assert!(
            !r.rem_set().is_updating(),
            "Remembered set of region {} is updating before rebuild",
            r.index()
        );

        // Humongous primitive arrays are tracked to support eager reclaim, but their tracking
        // may have been reset by a full collection. Try to track them again.
        // Object arrays have outgoing references and are never eagerly reclaimed.
        if !r.humongous_object_kind().is_type_array() || r.rem_set().is_tracked() {
            return false;
        }
        for hr in heap.humongous_obj_regions(r) {
            hr.rem_set().set_state_updating();
        }
        #[cfg(feature = "extreme_assertions")]
        for hr in heap.humongous_obj_regions(r) {
            assert!(
                hr.rem_set().is_updating(),
                "Region {} of humongous object {} is {} after selection",
                hr.index(),
                r.index(),
                hr.rem_set().get_state_str()
            );
        }
        true
    }

    /// Decide whether to rebuild the remembered set of the old region `r`. Returns true if the
    /// region was selected, in which case it is now `Updating`.
    pub fn update_old_before_rebuild(&self, heap: &G1Heap, r: &HeapRegion) -> bool {
        debug_assert!(heap.is_at_safepoint(), "should be at safepoint");
        debug_assert!(r.is_old(), "Region {} should be Old", r.index());
        debug_assert!(
            !r.rem_set().is_updating(),
            "Remembered set of region {} is updating before rebuild",
            r.index()
        );

        if heap
            .cset_chooser()
            .region_occupancy_low_enough_for_evac(r.live_bytes())
            && !r.rem_set().is_tracked()
        {
            r.rem_set().set_state_updating();
            return true;
        }
        false
    }

    /// Finish the rebuild for region `r`: complete its remembered set, drop the card sets of
    /// humongous objects that will not be eagerly reclaimed, and log the result.
    pub fn update_after_rebuild(&self, heap: &G1Heap, r: &HeapRegion) {
        debug_assert!(heap.is_at_safepoint(), "should be at safepoint");
        if !r.is_old_or_humongous() {
            return;
        }

        if r.rem_set().is_updating() {
            r.rem_set().set_state_complete();
        }
        // A humongous object that is not an eager reclaim candidate will not be reclaimed or
        // moved before the next marking cycle, and its card set would only keep growing.
        // The continuation regions are handled together with the start region.
        if r.is_starts_humongous() && !heap.is_potential_eager_reclaim_candidate(r) {
            for hr in heap.humongous_obj_regions(r) {
                debug_assert!(
                    !hr.is_continues_humongous() || hr.rem_set().is_empty(),
                    "Continues humongous region {} remset should be empty",
                    hr.index()
                );
                hr.rem_set().clear(true);
            }
        }

        let (remset_bytes, occupied) = Self::remset_stats(r);
        let cm = heap.concurrent_mark();
        trace!(
            "After rebuild region {} (tams {} liveness {} remset occ {} size {})",
            r.index(),
            cm.top_at_mark_start(r),
            cm.live_bytes(r.index()),
            occupied,
            remset_bytes
        );
    }

    /// The memory size in bytes and the number of remembered cards of the remembered set of
    /// `r`. The card set only counts if `r` is its sole member.
    fn remset_stats(r: &HeapRegion) -> (usize, usize) {
        let mut remset_bytes = r.rem_set().mem_size();
        let mut occupied = 0;
        if let Some(group) = r.rem_set().cset_group() {
            if group.length() == 1 {
                remset_bytes += group.card_set().mem_size();
                occupied = group.card_set().occupied();
            }
        }
        (remset_bytes, occupied)
    }
}
