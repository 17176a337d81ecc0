//! Collector plans built on top of the region and remembered-set policies.
//!
//! A plan owns the collector-wide state (the region table, the safepoint state and marking
//! results) and drives the remembered-set tracking policy at the right points of its cycle.

pub mod g1;
