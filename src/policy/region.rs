use super::remset::HeapRegionRemSet;
use crate::util::Address;
use atomic::Atomic;
use bytemuck::NoUninit;
use std::sync::atomic::{AtomicUsize, Ordering};

/// The generation kind of a heap region.
#[repr(u8)]
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    NoUninit,
    enum_map::Enum,
    strum_macros::IntoStaticStr,
    strum_macros::EnumString,
)]
pub enum RegionType {
    /// Not allocated.
    #[strum(serialize = "FREE")]
    Free,
    #[strum(serialize = "EDEN")]
    Young,
    #[strum(serialize = "OLD")]
    Old,
    /// The first region of a humongous object.
    #[strum(serialize = "HUMS")]
    StartsHumongous,
    /// A following region of a humongous object.
    #[strum(serialize = "HUMC")]
    ContinuesHumongous,
}

/// What kind of object occupies a humongous region group. Only primitive (type) arrays
/// are candidates for eager reclaim.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, NoUninit)]
pub enum ObjectKind {
    /// An array of primitives. It holds no outgoing references.
    TypeArray,
    /// An array of references.
    ObjArray,
    /// A plain object instance.
    Instance,
}

impl ObjectKind {
    pub fn is_type_array(&self) -> bool {
        matches!(self, ObjectKind::TypeArray)
    }
}

/// Marks a region that is not part of a humongous object.
const NO_HUMONGOUS_START: usize = usize::MAX;

/// A fixed size slice of the heap, together with its remembered set.
///
/// All fields are updated through shared references. Allocation and free are serialized by
/// the [`super::HeapRegionManager`]; everything else happens at safepoints.
#[derive(Debug)]
pub struct HeapRegion {
    index: usize,
    bottom: Address,
    end: Address,
    region_type: Atomic<RegionType>,
    /// For humongous regions, the index of the starting region of the object.
    humongous_start: AtomicUsize,
    /// For starts-humongous regions, the kind of the humongous object.
    humongous_object: Atomic<ObjectKind>,
    used: AtomicUsize,
    /// Live bytes as of the last marking. Maintained by concurrent mark.
    live_bytes: AtomicUsize,
    rem_set: HeapRegionRemSet,
}

impl HeapRegion {
    pub fn new(index: usize, bottom: Address, size: usize) -> Self {
        Self {
            index,
            bottom,
            end: bottom + size,
            region_type: Atomic::new(RegionType::Free),
            humongous_start: AtomicUsize::new(NO_HUMONGOUS_START),
            humongous_object: Atomic::new(ObjectKind::Instance),
            used: AtomicUsize::new(0),
            live_bytes: AtomicUsize::new(0),
            rem_set: HeapRegionRemSet::new(index),
        }
    }

    /// The index of the region in the heap region table.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn bottom(&self) -> Address {
        self.bottom
    }

    pub fn end(&self) -> Address {
        self.end
    }

    pub fn capacity(&self) -> usize {
        self.end - self.bottom
    }

    pub fn contains(&self, addr: Address) -> bool {
        addr >= self.bottom && addr < self.end
    }

    pub fn rem_set(&self) -> &HeapRegionRemSet {
        &self.rem_set
    }

    pub fn region_type(&self) -> RegionType {
        self.region_type.load(Ordering::SeqCst)
    }

    /// A short name of the region type for logging.
    pub fn get_type_str(&self) -> &'static str {
        self.region_type().into()
    }

    pub fn is_free(&self) -> bool {
        self.region_type() == RegionType::Free
    }

    pub fn is_young(&self) -> bool {
        self.region_type() == RegionType::Young
    }

    pub fn is_old(&self) -> bool {
        self.region_type() == RegionType::Old
    }

    pub fn is_starts_humongous(&self) -> bool {
        self.region_type() == RegionType::StartsHumongous
    }

    pub fn is_continues_humongous(&self) -> bool {
        self.region_type() == RegionType::ContinuesHumongous
    }

    pub fn is_humongous(&self) -> bool {
        self.is_starts_humongous() || self.is_continues_humongous()
    }

    pub fn is_old_or_humongous(&self) -> bool {
        self.is_old() || self.is_humongous()
    }

    /// The index of the first region of the humongous object this region belongs to.
    pub fn humongous_start_index(&self) -> Option<usize> {
        match self.humongous_start.load(Ordering::SeqCst) {
            NO_HUMONGOUS_START => None,
            start => Some(start),
        }
    }

    /// The kind of object a starts-humongous region holds.
    pub fn humongous_object_kind(&self) -> ObjectKind {
        debug_assert!(
            self.is_starts_humongous(),
            "Region {} should be Humongous but is {}",
            self.index,
            self.get_type_str()
        );
        self.humongous_object.load(Ordering::SeqCst)
    }

    pub fn used(&self) -> usize {
        self.used.load(Ordering::Relaxed)
    }

    pub fn set_used(&self, bytes: usize) {
        debug_assert!(bytes <= self.capacity());
        self.used.store(bytes, Ordering::Relaxed);
    }

    pub fn live_bytes(&self) -> usize {
        self.live_bytes.load(Ordering::Relaxed)
    }

    pub(crate) fn set_live_bytes(&self, bytes: usize) {
        self.live_bytes.store(bytes, Ordering::Relaxed);
    }

    pub(crate) fn set_young(&self) {
        self.set_type(RegionType::Young);
    }

    pub(crate) fn set_old(&self) {
        debug_assert!(
            !self.is_humongous(),
            "Humongous region {} cannot become old",
            self.index
        );
        self.set_type(RegionType::Old);
    }

    pub(crate) fn set_starts_humongous(&self, kind: ObjectKind) {
        self.humongous_start.store(self.index, Ordering::SeqCst);
        self.humongous_object.store(kind, Ordering::SeqCst);
        self.set_type(RegionType::StartsHumongous);
    }

    pub(crate) fn set_continues_humongous(&self, start: &HeapRegion) {
        debug_assert!(start.is_starts_humongous());
        debug_assert!(start.index < self.index);
        self.humongous_start.store(start.index, Ordering::SeqCst);
        self.set_type(RegionType::ContinuesHumongous);
    }

    pub(crate) fn set_free(&self) {
        self.humongous_start
            .store(NO_HUMONGOUS_START, Ordering::SeqCst);
        self.humongous_object
            .store(ObjectKind::Instance, Ordering::SeqCst);
        self.used.store(0, Ordering::Relaxed);
        self.live_bytes.store(0, Ordering::Relaxed);
        self.set_type(RegionType::Free);
    }

    fn set_type(&self, new_type: RegionType) {
        let old_type = self.region_type.swap(new_type, Ordering::SeqCst);
        trace!(
            "Region {}: {} -> {}",
            self.index,
            <&'static str>::from(old_type),
            <&'static str>::from(new_type)
        );
    }
}
