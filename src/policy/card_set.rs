//! Card sets hold the entries of a remembered set: the cards outside a region that may
//! contain pointers into it. A card set is owned by a [`CardSetGroup`], which can be shared
//! by several regions that are always collected together.

use crate::util::constants::LOG_BYTES_IN_CARD;
use crate::util::Address;
use spin::Mutex;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A card is identified by its global index, i.e. its start address shifted by the card size.
pub type CardIndex = usize;

/// Get the index of the card covering an address.
pub fn card_index_of(addr: Address) -> CardIndex {
    addr >> LOG_BYTES_IN_CARD
}

/// A set of remembered cards.
#[derive(Debug, Default)]
pub struct CardSet {
    cards: Mutex<BTreeSet<CardIndex>>,
}

impl CardSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a card. Returns true if the card was not in the set before.
    pub fn add_card(&self, card: CardIndex) -> bool {
        self.cards.lock().insert(card)
    }

    pub fn contains_card(&self, card: CardIndex) -> bool {
        self.cards.lock().contains(&card)
    }

    /// The number of remembered cards.
    pub fn occupied(&self) -> usize {
        self.cards.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.lock().is_empty()
    }

    /// Drop all entries.
    pub fn clear(&self) {
        self.cards.lock().clear();
    }

    /// Add all cards from `other` into this set.
    pub fn merge(&self, other: &CardSet) {
        if std::ptr::eq(self, other) {
            return;
        }
        let theirs: Vec<CardIndex> = other.cards.lock().iter().copied().collect();
        self.cards.lock().extend(theirs);
    }

    /// An approximation of the memory used by this card set.
    pub fn mem_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.occupied() * std::mem::size_of::<CardIndex>()
    }

    /// A sorted snapshot of the remembered cards.
    pub fn cards(&self) -> Vec<CardIndex> {
        self.cards.lock().iter().copied().collect()
    }
}

/// A card set shared by a group of regions. Regions hold the group through an `Arc` and
/// register themselves with [`CardSetGroup::add_member`] so that the number of regions
/// sharing the card set can be queried without walking region metadata.
#[derive(Debug, Default)]
pub struct CardSetGroup {
    card_set: CardSet,
    length: AtomicUsize,
}

impl CardSetGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn card_set(&self) -> &CardSet {
        &self.card_set
    }

    /// The number of regions in this group.
    pub fn length(&self) -> usize {
        self.length.load(Ordering::Relaxed)
    }

    pub(crate) fn add_member(&self) {
        self.length.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn remove_member(&self) {
        let old = self.length.fetch_sub(1, Ordering::Relaxed);
        debug_assert!(old > 0, "Card set group has no members");
    }
}
