use super::card_set::CardSetGroup;
use super::region::{HeapRegion, ObjectKind, RegionType};
use crate::util::Address;
use spin::Mutex;
use std::sync::Arc;

/// The table of all heap regions. Regions are laid out contiguously from `heap_start`, and
/// a region's index is its position in the table.
///
/// The manager hands out free regions, links humongous groups together and decides which
/// card set group a region's remembered set joins. It does not decide remembered-set tracking
/// states; that is up to [`crate::plan::g1::RemSetTrackingPolicy`].
pub struct HeapRegionManager {
    regions: Vec<HeapRegion>,
    heap_start: Address,
    region_size: usize,
    log_region_size: usize,
    /// All young regions are collected together, so they share one card set.
    young_group: Arc<CardSetGroup>,
    /// Serializes allocation and free.
    lock: Mutex<()>,
}

impl HeapRegionManager {
    pub fn new(heap_start: Address, region_size: usize, num_regions: usize) -> Self {
        debug_assert!(region_size.is_power_of_two());
        debug_assert!(heap_start.is_aligned_to(region_size));
        let regions = (0..num_regions)
            .map(|i| HeapRegion::new(i, heap_start + i * region_size, region_size))
            .collect();
        Self {
            regions,
            heap_start,
            region_size,
            log_region_size: region_size.trailing_zeros() as usize,
            young_group: Arc::new(CardSetGroup::new()),
            lock: Mutex::new(()),
        }
    }

    pub fn num_regions(&self) -> usize {
        self.regions.len()
    }

    pub fn region_size(&self) -> usize {
        self.region_size
    }

    pub fn heap_start(&self) -> Address {
        self.heap_start
    }

    pub fn heap_end(&self) -> Address {
        self.heap_start + self.regions.len() * self.region_size
    }

    /// Get a region by index.
    pub fn at(&self, index: usize) -> &HeapRegion {
        &self.regions[index]
    }

    /// Get the region containing an address, if the address is in the heap.
    pub fn addr_to_region(&self, addr: Address) -> Option<&HeapRegion> {
        if addr < self.heap_start || addr >= self.heap_end() {
            return None;
        }
        Some(&self.regions[(addr - self.heap_start) >> self.log_region_size])
    }

    /// Iterate over all regions, free or not.
    pub fn iter(&self) -> impl Iterator<Item = &HeapRegion> {
        self.regions.iter()
    }

    /// Iterate over all regions that are in use.
    pub fn committed_regions(&self) -> impl Iterator<Item = &HeapRegion> {
        self.regions.iter().filter(|r| !r.is_free())
    }

    pub fn num_free_regions(&self) -> usize {
        self.regions.iter().filter(|r| r.is_free()).count()
    }

    /// The card set group shared by all young regions.
    pub fn young_cset_group(&self) -> &Arc<CardSetGroup> {
        &self.young_group
    }

    /// Take a free region and turn it into a young or an old region. Returns `None` if the
    /// heap is full.
    pub fn allocate_free_region(&self, region_type: RegionType) -> Option<&HeapRegion> {
        debug_assert!(
            matches!(region_type, RegionType::Young | RegionType::Old),
            "Use allocate_humongous() for humongous regions"
        );
        let _guard = self.lock.lock();
        let r = self.regions.iter().find(|r| r.is_free())?;
        if region_type == RegionType::Young {
            r.set_young();
            r.rem_set().install_cset_group(self.young_group.clone());
        } else {
            r.set_old();
            r.rem_set().install_cset_group(Arc::new(CardSetGroup::new()));
        }
        debug!(
            "Allocated region {} as {}",
            r.index(),
            r.get_type_str()
        );
        Some(r)
    }

    /// Reclassify a young region as old in place, e.g. when its objects are promoted. The
    /// region leaves the shared young card set group and gets a card set of its own, which
    /// starts out empty.
    pub fn promote_to_old(&self, r: &HeapRegion) {
        let _guard = self.lock.lock();
        debug_assert!(
            r.is_young(),
            "Region {} should be Young but is {}",
            r.index(),
            r.get_type_str()
        );
        r.rem_set().uninstall_cset_group();
        r.set_old();
        r.rem_set().install_cset_group(Arc::new(CardSetGroup::new()));
        debug!("Promoted region {} to OLD", r.index());
    }

    /// Take `num_regions` contiguous free regions for a humongous object of the given kind.
    /// Returns the starts-humongous region, or `None` if there is no such run of free regions.
    ///
    /// Entries for the whole object are recorded in the start region's card set, so only the
    /// start region joins a card set group.
    pub fn allocate_humongous(&self, num_regions: usize, kind: ObjectKind) -> Option<&HeapRegion> {
        debug_assert!(num_regions > 0);
        let _guard = self.lock.lock();
        let first = self.find_contiguous_free(num_regions)?;
        let start = &self.regions[first];
        start.set_starts_humongous(kind);
        start.rem_set().install_cset_group(Arc::new(CardSetGroup::new()));
        for r in &self.regions[first + 1..first + num_regions] {
            r.set_continues_humongous(start);
        }
        debug!(
            "Allocated humongous object ({:?}) in regions [{}, {})",
            kind,
            first,
            first + num_regions
        );
        Some(start)
    }

    fn find_contiguous_free(&self, num_regions: usize) -> Option<usize> {
        let mut run = 0;
        for (i, r) in self.regions.iter().enumerate() {
            if r.is_free() {
                run += 1;
                if run == num_regions {
                    return Some(i + 1 - num_regions);
                }
            } else {
                run = 0;
            }
        }
        None
    }

    /// Return a region to the free pool. Its remembered set is dropped and it leaves its card
    /// set group.
    pub(crate) fn free_region(&self, r: &HeapRegion) {
        let _guard = self.lock.lock();
        debug_assert!(!r.is_free(), "Region {} is already free", r.index());
        r.rem_set().uninstall_cset_group();
        r.rem_set().clear(false);
        r.set_free();
        debug!("Freed region {}", r.index());
    }

    /// Iterate over all regions of the humongous object starting at `start`: the start region
    /// first, then its continuation regions in address order.
    pub fn humongous_obj_regions<'a>(&'a self, start: &HeapRegion) -> HumongousRegions<'a> {
        debug_assert!(
            start.is_starts_humongous(),
            "Region {} should be Humongous but is {}",
            start.index(),
            start.get_type_str()
        );
        HumongousRegions {
            manager: self,
            start: start.index(),
            next: start.index(),
        }
    }

    /// Put a set of old regions into one card set group, so they share a card set. Entries
    /// already remembered by the regions' previous groups are merged into the new group.
    pub fn form_cset_group(&self, members: &[&HeapRegion]) -> Arc<CardSetGroup> {
        let group = Arc::new(CardSetGroup::new());
        for r in members {
            debug_assert!(
                r.is_old(),
                "Region {} should be Old but is {}",
                r.index(),
                r.get_type_str()
            );
            if let Some(previous) = r.rem_set().uninstall_cset_group() {
                group.card_set().merge(previous.card_set());
            }
            r.rem_set().install_cset_group(group.clone());
        }
        debug!("Formed a card set group of {} regions", group.length());
        group
    }

    /// Record a reference from the card of `from` into the region containing `to`.
    /// References into humongous continuation regions are recorded with the start region.
    /// References within one region are never recorded.
    pub fn add_reference(&self, from: Address, to: Address) -> bool {
        let Some(mut target) = self.addr_to_region(to) else {
            return false;
        };
        if target.contains(from) {
            return false;
        }
        if target.is_continues_humongous() {
            if let Some(start) = target.humongous_start_index() {
                target = self.at(start);
            }
        }
        target.rem_set().add_reference(from)
    }
}

/// Iterator over the regions of one humongous object.
pub struct HumongousRegions<'a> {
    manager: &'a HeapRegionManager,
    start: usize,
    next: usize,
}

impl<'a> Iterator for HumongousRegions<'a> {
    type Item = &'a HeapRegion;

    fn next(&mut self) -> Option<&'a HeapRegion> {
        if self.next >= self.manager.num_regions() {
            return None;
        }
        let r = self.manager.at(self.next);
        if self.next != self.start
            && !(r.is_continues_humongous() && r.humongous_start_index() == Some(self.start))
        {
            return None;
        }
        self.next += 1;
        Some(r)
    }
}
