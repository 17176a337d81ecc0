use crate::plan::g1::G1Heap;
use crate::policy::{HeapRegion, ObjectKind, RegionType};
use crate::util::options::Options;

/// Options with built-in defaults and a small heap. Environment variables are ignored so
/// tests do not depend on the caller's environment.
pub fn test_options(max_regions: usize) -> Options {
    let mut options = Options::builtin();
    options.max_regions = max_regions;
    options
}

/// A heap with one region of each kind: young, old, and a humongous primitive array spanning
/// three regions.
pub struct MixedHeapFixture {
    pub heap: G1Heap,
}

impl MixedHeapFixture {
    pub const YOUNG: usize = 0;
    pub const OLD: usize = 1;
    pub const HUMONGOUS_START: usize = 2;
    pub const HUMONGOUS_REGIONS: usize = 3;

    pub fn create() -> Self {
        let heap = G1Heap::new(test_options(16));
        let region_size = heap.options().region_size;
        heap.new_region(RegionType::Young).unwrap();
        heap.new_region(RegionType::Old).unwrap();
        heap.humongous_obj_allocate(Self::HUMONGOUS_REGIONS * region_size, ObjectKind::TypeArray)
            .unwrap();
        Self { heap }
    }

    pub fn young(&self) -> &HeapRegion {
        self.heap.region_at(Self::YOUNG)
    }

    pub fn old(&self) -> &HeapRegion {
        self.heap.region_at(Self::OLD)
    }

    pub fn humongous_start(&self) -> &HeapRegion {
        self.heap.region_at(Self::HUMONGOUS_START)
    }
}
