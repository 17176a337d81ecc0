use super::card_set::{card_index_of, CardSetGroup};
use crate::util::Address;
use atomic::Atomic;
use atomic_refcell::AtomicRefCell;
use bytemuck::NoUninit;
use spin::Mutex;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// The remembered-set tracking state of a region.
///
/// Within one rebuild cycle a region only moves forward: `Untracked -> Updating -> Complete`.
/// It goes back to `Untracked` only when its remembered set is reset, e.g. when the region is
/// freed, after a full collection, or when an old region is allocated.
#[repr(u8)]
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    NoUninit,
    enum_map::Enum,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::IntoStaticStr,
)]
pub enum RemSetState {
    /// No remembered set is maintained. Writes into the region are not recorded.
    Untracked,
    /// The remembered set is being rebuilt and may be incomplete. The region must not be evacuated.
    Updating,
    /// The remembered set reflects all incoming pointers.
    Complete,
}

/// The remembered set of a region: its tracking state, the card set entries (held in a
/// possibly shared [`CardSetGroup`]) and the code roots pointing into the region.
#[derive(Debug)]
pub struct HeapRegionRemSet {
    /// The index of the owning region. Only used for diagnostics.
    region_index: usize,
    state: Atomic<RemSetState>,
    cset_group: AtomicRefCell<Option<Arc<CardSetGroup>>>,
    code_roots: Mutex<Vec<Address>>,
}

impl HeapRegionRemSet {
    pub fn new(region_index: usize) -> Self {
        Self {
            region_index,
            state: Atomic::new(RemSetState::Untracked),
            cset_group: AtomicRefCell::new(None),
            code_roots: Mutex::new(vec![]),
        }
    }

    pub fn state(&self) -> RemSetState {
        self.state.load(Ordering::SeqCst)
    }

    pub fn get_state_str(&self) -> &'static str {
        self.state().into()
    }

    /// Is the remembered set maintained, i.e. either being rebuilt or complete?
    pub fn is_tracked(&self) -> bool {
        self.state() != RemSetState::Untracked
    }

    pub fn is_updating(&self) -> bool {
        self.state() == RemSetState::Updating
    }

    pub fn is_complete(&self) -> bool {
        self.state() == RemSetState::Complete
    }

    pub fn set_state_untracked(&self) {
        if self.state() == RemSetState::Untracked {
            return;
        }
        self.transition(RemSetState::Untracked);
    }

    /// Start rebuilding the remembered set. Only a region that is not tracked can be selected.
    pub fn set_state_updating(&self) {
        debug_assert!(
            !self.is_tracked(),
            "Should only set to Updating from Untracked but region {} is {}",
            self.region_index,
            self.get_state_str()
        );
        self.transition(RemSetState::Updating);
    }

    pub fn set_state_complete(&self) {
        self.transition(RemSetState::Complete);
    }

    fn transition(&self, new_state: RemSetState) {
        let old_state = self.state.swap(new_state, Ordering::SeqCst);
        trace!(
            "Remembered set of region {}: {} -> {}",
            self.region_index,
            old_state,
            new_state
        );
    }

    /// Join a card set group. A region is in at most one group at a time.
    pub fn install_cset_group(&self, group: Arc<CardSetGroup>) {
        let mut slot = self.cset_group.borrow_mut();
        debug_assert!(
            slot.is_none(),
            "Region {} is already in a card set group",
            self.region_index
        );
        group.add_member();
        *slot = Some(group);
    }

    /// Leave the current card set group, if any, and return it.
    pub fn uninstall_cset_group(&self) -> Option<Arc<CardSetGroup>> {
        let group = self.cset_group.borrow_mut().take();
        if let Some(ref group) = group {
            group.remove_member();
        }
        group
    }

    pub fn is_added_to_cset_group(&self) -> bool {
        self.cset_group.borrow().is_some()
    }

    pub fn cset_group(&self) -> Option<Arc<CardSetGroup>> {
        self.cset_group.borrow().clone()
    }

    /// The number of cards remembered for this region's group.
    pub fn occupied(&self) -> usize {
        self.cset_group
            .borrow()
            .as_ref()
            .map_or(0, |group| group.card_set().occupied())
    }

    fn card_set_is_empty(&self) -> bool {
        self.cset_group
            .borrow()
            .as_ref()
            .map_or(true, |group| group.card_set().is_empty())
    }

    /// Does the remembered set hold no entries and no code roots?
    pub fn is_empty(&self) -> bool {
        self.code_roots_list_length() == 0 && self.card_set_is_empty()
    }

    /// Record that the card containing `from` may point into this region. Returns false
    /// if the reference was not recorded because the remembered set is not tracked, the
    /// region is not in a card set group, or the card was already remembered.
    pub fn add_reference(&self, from: Address) -> bool {
        if !self.is_tracked() {
            return false;
        }
        match self.cset_group.borrow().as_ref() {
            Some(group) => group.card_set().add_card(card_index_of(from)),
            None => false,
        }
    }

    pub fn add_code_root(&self, code: Address) {
        let mut roots = self.code_roots.lock();
        if !roots.contains(&code) {
            roots.push(code);
        }
    }

    pub fn remove_code_root(&self, code: Address) {
        self.code_roots.lock().retain(|c| *c != code);
    }

    pub fn code_roots_list_length(&self) -> usize {
        self.code_roots.lock().len()
    }

    /// Drop the card set entries. Unless `only_cardset` is set, also drop the code roots and
    /// stop tracking the region.
    ///
    /// A card set shared with other regions is left alone: its entries belong to the other
    /// members as well. Leave the group first to drop this region's view of it.
    pub fn clear(&self, only_cardset: bool) {
        if !only_cardset {
            self.code_roots.lock().clear();
        }
        if let Some(group) = self.cset_group.borrow().as_ref() {
            if group.length() == 1 {
                group.card_set().clear();
            }
        }
        if !only_cardset {
            self.set_state_untracked();
        }
    }

    /// The memory used by the remembered set structure itself, excluding the card set.
    pub fn mem_size(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.code_roots.lock().capacity() * std::mem::size_of::<Address>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn addr(raw: usize) -> Address {
        unsafe { Address::from_usize(raw) }
    }

    #[test]
    fn state_transitions() {
        let rs = HeapRegionRemSet::new(0);
        assert_eq!(rs.state(), RemSetState::Untracked);
        assert!(!rs.is_tracked());
        rs.set_state_updating();
        assert!(rs.is_updating());
        assert!(rs.is_tracked());
        rs.set_state_complete();
        assert!(rs.is_complete());
        assert_eq!(rs.get_state_str(), "Complete");
        rs.set_state_untracked();
        assert!(!rs.is_tracked());
    }

    #[test]
    fn state_names() {
        assert_eq!(RemSetState::Updating.to_string(), "Updating");
        assert_eq!(
            RemSetState::from_str("Complete").unwrap(),
            RemSetState::Complete
        );
        assert!(RemSetState::from_str("Bogus").is_err());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "Should only set to Updating from Untracked")]
    fn updating_from_complete() {
        let rs = HeapRegionRemSet::new(7);
        rs.set_state_complete();
        rs.set_state_updating();
    }

    #[test]
    fn references_only_recorded_when_tracked() {
        let rs = HeapRegionRemSet::new(0);
        rs.install_cset_group(Arc::new(CardSetGroup::new()));
        assert!(!rs.add_reference(addr(0x10000)));
        assert!(rs.is_empty());
        rs.set_state_complete();
        assert!(rs.add_reference(addr(0x10000)));
        assert!(!rs.add_reference(addr(0x10008)));
        assert_eq!(rs.occupied(), 1);
        assert!(!rs.is_empty());
    }

    #[test]
    fn references_without_group() {
        let rs = HeapRegionRemSet::new(0);
        rs.set_state_complete();
        assert!(!rs.add_reference(addr(0x10000)));
        assert_eq!(rs.occupied(), 0);
        assert!(rs.is_empty());
    }

    #[test]
    fn clear_only_cardset_keeps_state_and_code_roots() {
        let rs = HeapRegionRemSet::new(0);
        rs.install_cset_group(Arc::new(CardSetGroup::new()));
        rs.set_state_complete();
        rs.add_reference(addr(0x20000));
        rs.add_code_root(addr(0x30000));
        rs.clear(true);
        assert_eq!(rs.occupied(), 0);
        assert_eq!(rs.code_roots_list_length(), 1);
        assert!(rs.is_complete());
    }

    #[test]
    fn full_clear_resets_tracking() {
        let rs = HeapRegionRemSet::new(0);
        rs.install_cset_group(Arc::new(CardSetGroup::new()));
        rs.set_state_complete();
        rs.add_reference(addr(0x20000));
        rs.add_code_root(addr(0x30000));
        rs.add_code_root(addr(0x30000));
        assert_eq!(rs.code_roots_list_length(), 1);
        rs.clear(false);
        assert!(rs.is_empty());
        assert_eq!(rs.state(), RemSetState::Untracked);
    }

    #[test]
    fn group_install_and_uninstall() {
        let group = Arc::new(CardSetGroup::new());
        let a = HeapRegionRemSet::new(0);
        let b = HeapRegionRemSet::new(1);
        a.install_cset_group(group.clone());
        b.install_cset_group(group.clone());
        assert_eq!(group.length(), 2);
        assert!(a.is_added_to_cset_group());
        a.set_state_complete();
        a.add_reference(addr(0x40000));
        // Members share the entries.
        assert_eq!(b.occupied(), 1);
        let removed = b.uninstall_cset_group().unwrap();
        assert!(Arc::ptr_eq(&removed, &group));
        assert_eq!(group.length(), 1);
        assert!(!b.is_added_to_cset_group());
        assert_eq!(b.occupied(), 0);
    }

    #[test]
    fn clear_keeps_shared_card_set() {
        let group = Arc::new(CardSetGroup::new());
        let a = HeapRegionRemSet::new(0);
        let b = HeapRegionRemSet::new(1);
        a.install_cset_group(group.clone());
        b.install_cset_group(group.clone());
        a.set_state_complete();
        b.set_state_complete();
        a.add_reference(addr(0x40000));
        b.clear(false);
        assert_eq!(b.state(), RemSetState::Untracked);
        assert!(a.is_complete());
        assert_eq!(a.occupied(), 1);
        // Once b has left, a owns the card set alone.
        b.uninstall_cset_group();
        a.clear(true);
        assert_eq!(a.occupied(), 0);
        assert!(a.is_complete());
    }

    #[test]
    fn mem_size_grows_with_code_roots() {
        let rs = HeapRegionRemSet::new(0);
        let empty = rs.mem_size();
        rs.add_code_root(addr(0x1000));
        assert!(rs.mem_size() > empty);
        rs.remove_code_root(addr(0x1000));
        assert_eq!(rs.code_roots_list_length(), 0);
    }
}
