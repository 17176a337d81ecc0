//! Remembered-set tracking for region-based, incremental garbage collectors.
//!
//! A regional collector evacuates a few regions at a time. To do so without scanning the whole
//! heap, it keeps a *remembered set* for each region it may evacuate: the cards elsewhere in
//! the heap that may hold pointers into the region. Maintaining a remembered set is not free,
//! so the collector needs to decide which regions deserve one. This crate implements that
//! decision:
//!
//! * [`plan::g1::RemSetTrackingPolicy`] is the stateless policy that moves each region's
//!   remembered set through `Untracked -> Updating -> Complete`.
//! * [`plan::g1::G1Heap`] is the collector state the policy works against.
//! * [`plan::g1::RemSetRebuild`] runs the policy over the whole heap around a rebuild.
//! * [`policy`] has the regions, remembered sets and card sets.
//!
//! Logging goes through the [`log`] crate. Call [`util::logger::try_init`] to install the
//! built-in `env_logger`.

#[macro_use]
extern crate log;
#[cfg(test)]
#[macro_use]
extern crate lazy_static;

pub mod plan;
pub mod policy;
pub mod util;

pub use crate::plan::g1::{G1Heap, RemSetRebuild, RemSetTrackingPolicy};
pub use crate::policy::{HeapRegion, ObjectKind, RegionType, RemSetState};
pub use crate::util::options::Options;
