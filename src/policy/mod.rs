//! Heap regions and their remembered sets.
//!
//! These are the collaborators of the remembered-set tracking policy: the region table with
//! its type queries and humongous group iteration, the per-region remembered set with its
//! tracking state, and the card sets that hold the remembered entries.

pub mod card_set;
mod region;
mod region_manager;
mod remset;

pub use self::card_set::{CardSet, CardSetGroup};
pub use self::region::{HeapRegion, ObjectKind, RegionType};
pub use self::region_manager::{HeapRegionManager, HumongousRegions};
pub use self::remset::{HeapRegionRemSet, RemSetState};
