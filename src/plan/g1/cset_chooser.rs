use crate::util::options::Options;

/// Decides whether an old region is cheap enough to evacuate in an incremental collection.
/// Only such regions are worth maintaining a remembered set for.
pub trait CollectionSetChooser: Sync + Send {
    /// Is a region with `live_bytes` live bytes a realistic evacuation candidate?
    fn region_occupancy_low_enough_for_evac(&self, live_bytes: usize) -> bool;
}

/// Accept regions whose live bytes are below a fixed percentage of the region size.
#[derive(Debug, Clone, Copy)]
pub struct LiveThresholdChooser {
    live_threshold_bytes: usize,
}

impl LiveThresholdChooser {
    pub fn new(options: &Options) -> Self {
        Self::with_threshold_percent(options.region_size, options.mixed_gc_live_threshold_percent)
    }

    pub fn with_threshold_percent(region_size: usize, percent: usize) -> Self {
        debug_assert!(percent <= 100);
        Self {
            live_threshold_bytes: region_size * percent / 100,
        }
    }

    /// Regions with fewer live bytes than this are evacuation candidates.
    pub fn mixed_gc_live_threshold_bytes(&self) -> usize {
        self.live_threshold_bytes
    }
}

impl CollectionSetChooser for LiveThresholdChooser {
    fn region_occupancy_low_enough_for_evac(&self, live_bytes: usize) -> bool {
        live_bytes < self.live_threshold_bytes
    }
}
