use super::heap::G1Heap;
use crate::policy::RemSetState;
use crate::policy::CardSetGroup;
use enum_map::EnumMap;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// A snapshot of remembered-set tracking across the committed regions of a heap.
#[derive(Debug, Default, Clone)]
pub struct RemSetSummary {
    regions_by_state: EnumMap<RemSetState, usize>,
    /// Remembered cards, counting each card set group once.
    occupied_cards: usize,
    /// Memory of all remembered set structures and card sets, counting each group once.
    mem_size: usize,
}

impl RemSetSummary {
    pub fn collect(heap: &G1Heap) -> Self {
        let mut summary = RemSetSummary::default();
        let mut seen_groups: HashSet<*const CardSetGroup> = HashSet::new();
        for r in heap.regions().committed_regions() {
            let rem_set = r.rem_set();
            summary.regions_by_state[rem_set.state()] += 1;
            summary.mem_size += rem_set.mem_size();
            if let Some(group) = rem_set.cset_group() {
                if seen_groups.insert(Arc::as_ptr(&group)) {
                    summary.occupied_cards += group.card_set().occupied();
                    summary.mem_size += group.card_set().mem_size();
                }
            }
        }
        summary
    }

    pub fn regions_in(&self, state: RemSetState) -> usize {
        self.regions_by_state[state]
    }

    pub fn occupied_cards(&self) -> usize {
        self.occupied_cards
    }

    pub fn mem_size(&self) -> usize {
        self.mem_size
    }
}

impl fmt::Display for RemSetSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (state, count) in self.regions_by_state.iter() {
            write!(f, "{}: {} regions, ", state, count)?;
        }
        write!(
            f,
            "{} cards, {} bytes",
            self.occupied_cards, self.mem_size
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::RegionType;
    use crate::util::test_util::fixtures::test_options;

    #[test]
    fn shared_groups_counted_once() {
        let heap = G1Heap::new(test_options(4));
        let y1 = heap.new_region(RegionType::Young).unwrap();
        heap.new_region(RegionType::Young).unwrap();
        let o = heap.new_region(RegionType::Old).unwrap();
        o.rem_set().set_state_complete();
        heap.regions().add_reference(y1.bottom(), o.bottom());
        // Both young regions share one card set.
        heap.regions().add_reference(o.bottom(), y1.bottom());

        let summary = RemSetSummary::collect(&heap);
        assert_eq!(summary.regions_in(RemSetState::Complete), 3);
        assert_eq!(summary.regions_in(RemSetState::Untracked), 0);
        assert_eq!(summary.occupied_cards(), 2);
        assert!(summary.mem_size() > 0);
        let text = summary.to_string();
        assert!(text.starts_with("Untracked: 0 regions, Updating: 0 regions, Complete: 3 regions"));
        assert!(text.ends_with(&format!("2 cards, {} bytes", summary.mem_size())));
    }
}
