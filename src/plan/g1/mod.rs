//! Remembered-set tracking for a G1-style regional collector.

mod concurrent_mark;
mod cset_chooser;
mod eager_reclaim;
mod heap;
mod rebuild;
mod remset_tracking_policy;
mod summary;

pub use self::concurrent_mark::ConcurrentMark;
pub use self::cset_chooser::{CollectionSetChooser, LiveThresholdChooser};
pub use self::eager_reclaim::{EagerReclaimPredicate, RemSetOccupancyPredicate};
pub use self::heap::G1Heap;
pub use self::rebuild::{RebuildSelection, RemSetRebuild};
pub use self::remset_tracking_policy::RemSetTrackingPolicy;
pub use self::summary::RemSetSummary;
