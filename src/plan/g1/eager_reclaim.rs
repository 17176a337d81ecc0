use crate::policy::HeapRegion;
use crate::util::options::Options;

/// Decides whether a humongous object may still be reclaimed eagerly, i.e. outside of a full
/// marking cycle, once it is found unreferenced. A humongous group that is not a candidate
/// does not need its card set until the next marking cycle.
pub trait EagerReclaimPredicate: Sync + Send {
    /// `r` is the starts-humongous region of the object.
    fn is_potential_eager_reclaim_candidate(&self, r: &HeapRegion) -> bool;
}

/// Nominate humongous objects with few remembered cards. Objects with many incoming
/// references are likely still live, and scanning their card sets would not pay off.
#[derive(Debug, Clone, Copy)]
pub struct RemSetOccupancyPredicate {
    enabled: bool,
    remset_threshold: usize,
}

impl RemSetOccupancyPredicate {
    pub fn new(options: &Options) -> Self {
        Self {
            enabled: options.eager_reclaim_humongous_objects,
            remset_threshold: options.eager_reclaim_remset_threshold,
        }
    }
}

impl EagerReclaimPredicate for RemSetOccupancyPredicate {
    fn is_potential_eager_reclaim_candidate(&self, r: &HeapRegion) -> bool {
        debug_assert!(
            r.is_starts_humongous(),
            "Region {} should be Humongous but is {}",
            r.index(),
            r.get_type_str()
        );
        self.enabled && r.rem_set().occupied() <= self.remset_threshold
    }
}
