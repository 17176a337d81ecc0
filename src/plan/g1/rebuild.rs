use super::heap::G1Heap;
use super::summary::RemSetSummary;

/// The number of regions selected for remembered-set rebuild in one pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RebuildSelection {
    /// Humongous objects selected (counted once per object, by start region).
    pub humongous: usize,
    /// Old regions selected.
    pub old: usize,
}

impl RebuildSelection {
    pub fn total(&self) -> usize {
        self.humongous + self.old
    }
}

/// Drives the policy over the whole heap at the two safepoints that bracket a remembered-set
/// rebuild: selection after marking, and finalization after the rebuild.
pub struct RemSetRebuild;

impl RemSetRebuild {
    /// Ask the policy which regions need their remembered set rebuilt. Continuation regions
    /// are handled with their start region. Must be called at a safepoint.
    pub fn select_for_rebuild(heap: &G1Heap) -> RebuildSelection {
        assert!(
            heap.is_at_safepoint(),
            "Rebuild selection must run at a safepoint"
        );
        let policy = heap.remset_tracker();
        let mut selection = RebuildSelection::default();
        for r in heap.regions().committed_regions() {
            if r.is_starts_humongous() {
                if policy.update_humongous_before_rebuild(heap, r) {
                    selection.humongous += 1;
                }
            } else if r.is_old() && policy.update_old_before_rebuild(heap, r) {
                selection.old += 1;
            }
        }
        debug!(
            "Selected {} regions for remembered set rebuild ({} humongous objects, {} old regions) at safepoint {}",
            selection.total(),
            selection.humongous,
            selection.old,
            heap.safepoint().safepoint_id()
        );
        selection
    }

    /// Complete the remembered sets of all rebuilt regions and summarize the result. Must be
    /// called at a safepoint, after [`RemSetRebuild::select_for_rebuild`] in the same cycle.
    pub fn finalize_rebuild(heap: &G1Heap) -> RemSetSummary {
        assert!(
            heap.is_at_safepoint(),
            "Rebuild finalization must run at a safepoint"
        );
        let policy = heap.remset_tracker();
        for r in heap.regions().committed_regions() {
            policy.update_after_rebuild(heap, r);
        }
        let summary = RemSetSummary::collect(heap);
        info!("Remembered sets after rebuild: {}", summary);
        summary
    }
}
