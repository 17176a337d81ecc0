use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Records whether all mutator and concurrent helper threads are stopped.
///
/// The collector that embeds the tracking policy owns one of these and brings the world to a
/// safepoint before it asks the policy to make rebuild decisions. The policy only reads it to
/// check its precondition; it never blocks on it.
#[derive(Debug, Default)]
pub struct SafepointSynchronizer {
    at_safepoint: AtomicBool,
    /// The number of safepoints started so far. Useful to correlate log lines.
    safepoint_id: AtomicUsize,
}

impl SafepointSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Are all threads stopped?
    pub fn is_at_safepoint(&self) -> bool {
        self.at_safepoint.load(Ordering::SeqCst)
    }

    /// The id of the current (or the last) safepoint.
    pub fn safepoint_id(&self) -> usize {
        self.safepoint_id.load(Ordering::Relaxed)
    }

    /// Mark the world as stopped. Safepoints do not nest.
    pub fn begin(&self) {
        let was_at_safepoint = self.at_safepoint.swap(true, Ordering::SeqCst);
        assert!(!was_at_safepoint, "Safepoints do not nest");
        let id = self.safepoint_id.fetch_add(1, Ordering::Relaxed) + 1;
        trace!("Safepoint {} begins", id);
    }

    /// Mark the world as running again.
    pub fn end(&self) {
        let was_at_safepoint = self.at_safepoint.swap(false, Ordering::SeqCst);
        assert!(was_at_safepoint, "Not at a safepoint");
        trace!("Safepoint {} ends", self.safepoint_id());
    }

    /// Begin a safepoint that ends when the returned scope is dropped.
    pub fn scope(&self) -> SafepointScope<'_> {
        self.begin();
        SafepointScope { sync: self }
    }
}

/// A stopped world. The safepoint ends when this is dropped.
#[must_use]
pub struct SafepointScope<'a> {
    sync: &'a SafepointSynchronizer,
}

impl Drop for SafepointScope<'_> {
    fn drop(&mut self) {
        self.sync.end();
    }
}
