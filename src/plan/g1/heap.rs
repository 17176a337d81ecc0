use super::concurrent_mark::ConcurrentMark;
use super::cset_chooser::{CollectionSetChooser, LiveThresholdChooser};
use super::eager_reclaim::{EagerReclaimPredicate, RemSetOccupancyPredicate};
use super::remset_tracking_policy::RemSetTrackingPolicy;
use crate::policy::{HeapRegion, HeapRegionManager, HumongousRegions, ObjectKind, RegionType};
use crate::util::constants::DEFAULT_HEAP_START;
use crate::util::options::Options;
use crate::util::safepoint::SafepointSynchronizer;
use crate::util::Address;

/// The collector state the tracking policy works against: the region table, the safepoint
/// state, marking results and the heuristics the policy consults.
///
/// The policy never looks any of these up globally. Every policy call receives the heap it
/// should work on.
pub struct G1Heap {
    options: Options,
    regions: HeapRegionManager,
    safepoint: SafepointSynchronizer,
    concurrent_mark: ConcurrentMark,
    remset_tracker: RemSetTrackingPolicy,
    cset_chooser: Box<dyn CollectionSetChooser>,
    eager_reclaim: Box<dyn EagerReclaimPredicate>,
}

impl G1Heap {
    pub fn new(options: Options) -> Self {
        // DEFAULT_HEAP_START is aligned to the largest region size.
        let heap_start = unsafe { Address::from_usize(DEFAULT_HEAP_START) };
        Self::with_heap_start(options, heap_start)
    }

    pub fn with_heap_start(options: Options, heap_start: Address) -> Self {
        assert!(
            heap_start.is_aligned_to(options.region_size),
            "Heap start {} is not aligned to the region size {}",
            heap_start,
            options.region_size
        );
        info!(
            "Creating heap of {} regions of {} bytes at {}",
            options.max_regions, options.region_size, heap_start
        );
        Self {
            regions: HeapRegionManager::new(heap_start, options.region_size, options.max_regions),
            safepoint: SafepointSynchronizer::new(),
            concurrent_mark: ConcurrentMark::new(options.max_regions),
            remset_tracker: RemSetTrackingPolicy::new(),
            cset_chooser: Box::new(LiveThresholdChooser::new(&options)),
            eager_reclaim: Box::new(RemSetOccupancyPredicate::new(&options)),
            options,
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn regions(&self) -> &HeapRegionManager {
        &self.regions
    }

    pub fn region_at(&self, index: usize) -> &HeapRegion {
        self.regions.at(index)
    }

    pub fn safepoint(&self) -> &SafepointSynchronizer {
        &self.safepoint
    }

    pub fn is_at_safepoint(&self) -> bool {
        self.safepoint.is_at_safepoint()
    }

    pub fn concurrent_mark(&self) -> &ConcurrentMark {
        &self.concurrent_mark
    }

    pub fn remset_tracker(&self) -> &RemSetTrackingPolicy {
        &self.remset_tracker
    }

    pub fn cset_chooser(&self) -> &dyn CollectionSetChooser {
        self.cset_chooser.as_ref()
    }

    /// Replace the evacuation-cost heuristic.
    pub fn set_cset_chooser(&mut self, chooser: Box<dyn CollectionSetChooser>) {
        self.cset_chooser = chooser;
    }

    /// Replace the eager-reclaim candidate predicate.
    pub fn set_eager_reclaim_predicate(&mut self, predicate: Box<dyn EagerReclaimPredicate>) {
        self.eager_reclaim = predicate;
    }

    pub fn is_potential_eager_reclaim_candidate(&self, r: &HeapRegion) -> bool {
        self.eager_reclaim.is_potential_eager_reclaim_candidate(r)
    }

    /// Visit the start region and all continuation regions of a humongous object.
    pub fn humongous_obj_regions(&self, start: &HeapRegion) -> HumongousRegions<'_> {
        self.regions.humongous_obj_regions(start)
    }

    /// Allocate a young or old region and set up its remembered-set tracking.
    pub fn new_region(&self, region_type: RegionType) -> Option<&HeapRegion> {
        let r = self.regions.allocate_free_region(region_type)?;
        self.remset_tracker.update_at_allocate(r);
        Some(r)
    }

    /// Allocate the regions for a humongous object of `bytes` bytes. Returns the start region.
    pub fn humongous_obj_allocate(&self, bytes: usize, kind: ObjectKind) -> Option<&HeapRegion> {
        let region_size = self.options.region_size;
        let num_regions = bytes.div_ceil(region_size).max(1);
        let start = self.regions.allocate_humongous(num_regions, kind)?;
        let mut remaining = bytes;
        for r in self.regions.humongous_obj_regions(start) {
            r.set_used(remaining.min(region_size));
            remaining = remaining.saturating_sub(region_size);
            self.remset_tracker.update_at_allocate(r);
        }
        Some(start)
    }

    /// Turn a young region into an old one in place. Like a newly allocated old region, it is
    /// not tracked until a rebuild selects it.
    pub fn promote_to_old(&self, r: &HeapRegion) {
        self.regions.promote_to_old(r);
        self.remset_tracker.update_at_allocate(r);
    }

    /// Return a young or old region to the free pool.
    pub fn free_region(&self, r: &HeapRegion) {
        debug_assert!(
            !r.is_humongous(),
            "Use free_humongous_obj() for humongous region {}",
            r.index()
        );
        self.free_region_internal(r);
    }

    /// Return all regions of a humongous object to the free pool.
    pub fn free_humongous_obj(&self, start: &HeapRegion) {
        // Collect first. Freeing a region unlinks it from the group.
        let group: Vec<&HeapRegion> = self.humongous_obj_regions(start).collect();
        for r in group.into_iter().rev() {
            self.free_region_internal(r);
        }
    }

    fn free_region_internal(&self, r: &HeapRegion) {
        self.remset_tracker.update_at_free(r);
        self.concurrent_mark.clear_statistics(r);
        self.regions.free_region(r);
    }

    /// After a full collection, no old or humongous remembered set is valid any more. Young
    /// regions stay tracked since they are scanned in every collection anyway.
    pub fn reset_remsets_after_full_gc(&self) {
        debug_assert!(self.is_at_safepoint(), "should be at safepoint");
        let mut reset = 0;
        for r in self.regions.committed_regions() {
            if r.is_young() {
                r.rem_set().set_state_complete();
            } else {
                r.rem_set().clear(false);
                // Groups of non-young regions only hold non-young regions, and all of them
                // are reset here.
                if let Some(group) = r.rem_set().cset_group() {
                    group.card_set().clear();
                }
                reset += 1;
            }
        }
        debug!("Reset the remembered sets of {} regions after full GC", reset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::RemSetState;
    use crate::util::test_util::fixtures::test_options;

    #[test]
    fn humongous_allocation_sets_used_bytes() {
        let heap = G1Heap::new(test_options(8));
        let region_size = heap.options().region_size;
        let hs = heap
            .humongous_obj_allocate(2 * region_size + 100, ObjectKind::TypeArray)
            .unwrap();
        let used: Vec<usize> = heap.humongous_obj_regions(hs).map(|r| r.used()).collect();
        assert_eq!(used, vec![region_size, region_size, 100]);
    }

    #[test]
    fn free_humongous_obj_frees_group() {
        let heap = G1Heap::new(test_options(8));
        let hs = heap
            .humongous_obj_allocate(3 * heap.options().region_size, ObjectKind::ObjArray)
            .unwrap();
        assert_eq!(heap.regions().num_free_regions(), 5);
        heap.free_humongous_obj(hs);
        assert_eq!(heap.regions().num_free_regions(), 8);
        assert!(heap.regions().iter().all(|r| !r.rem_set().is_tracked()));
    }

    #[test]
    fn free_region_clears_marking() {
        let heap = G1Heap::new(test_options(2));
        let r = heap.new_region(RegionType::Old).unwrap();
        heap.concurrent_mark().update_liveness(r, 1024);
        heap.free_region(r);
        assert!(r.is_free());
        assert_eq!(heap.concurrent_mark().live_bytes(r.index()), 0);
    }

    #[test]
    fn full_gc_reset() {
        let heap = G1Heap::new(test_options(8));
        let y = heap.new_region(RegionType::Young).unwrap();
        let o = heap.new_region(RegionType::Old).unwrap();
        o.rem_set().set_state_complete();
        let hs = heap
            .humongous_obj_allocate(2 * heap.options().region_size, ObjectKind::TypeArray)
            .unwrap();
        {
            let _safepoint = heap.safepoint().scope();
            heap.reset_remsets_after_full_gc();
        }
        assert_eq!(y.rem_set().state(), RemSetState::Complete);
        assert_eq!(o.rem_set().state(), RemSetState::Untracked);
        assert!(heap
            .humongous_obj_regions(hs)
            .all(|r| r.rem_set().state() == RemSetState::Untracked));
    }

    #[test]
    fn freeing_young_region_keeps_other_young_entries() {
        let heap = G1Heap::new(test_options(4));
        let y1 = heap.new_region(RegionType::Young).unwrap();
        let y2 = heap.new_region(RegionType::Young).unwrap();
        let o = heap.new_region(RegionType::Old).unwrap();
        assert!(heap.regions().add_reference(o.bottom(), y1.bottom()));
        heap.free_region(y2);
        assert!(y1.rem_set().is_complete());
        assert_eq!(y1.rem_set().occupied(), 1);
    }

    #[test]
    fn promoted_region_is_untracked_and_reset_keeps_young_entries() {
        let heap = G1Heap::new(test_options(4));
        let y1 = heap.new_region(RegionType::Young).unwrap();
        let y2 = heap.new_region(RegionType::Young).unwrap();
        let o = heap.new_region(RegionType::Old).unwrap();
        assert!(heap.regions().add_reference(o.bottom(), y1.bottom()));
        heap.promote_to_old(y2);
        assert!(y2.is_old());
        assert_eq!(y2.rem_set().state(), RemSetState::Untracked);
        assert_eq!(y2.rem_set().occupied(), 0);
        {
            let _safepoint = heap.safepoint().scope();
            heap.reset_remsets_after_full_gc();
        }
        assert!(y1.rem_set().is_complete());
        assert_eq!(y1.rem_set().occupied(), 1);
    }

    #[test]
    fn full_gc_reset_clears_shared_old_group() {
        let heap = G1Heap::new(test_options(4));
        let y = heap.new_region(RegionType::Young).unwrap();
        let a = heap.new_region(RegionType::Old).unwrap();
        let b = heap.new_region(RegionType::Old).unwrap();
        a.rem_set().set_state_complete();
        b.rem_set().set_state_complete();
        let group = heap.regions().form_cset_group(&[a, b]);
        assert!(heap.regions().add_reference(y.bottom(), a.bottom()));
        {
            let _safepoint = heap.safepoint().scope();
            heap.reset_remsets_after_full_gc();
        }
        assert!(!a.rem_set().is_tracked() && !b.rem_set().is_tracked());
        assert!(group.card_set().is_empty());
    }

    #[test]
    #[should_panic(expected = "is not aligned to the region size")]
    fn misaligned_heap_start() {
        let options = test_options(2);
        let start = unsafe { Address::from_usize(DEFAULT_HEAP_START + 4096) };
        let _heap = G1Heap::with_heap_start(options, start);
    }
}
