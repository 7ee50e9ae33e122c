//! # Mutation Journal
//!
//! Undo log for ledger mutations. Every write the engine makes to the store
//! or the ownership layer is recorded here first, so an operation that fails
//! part-way (including one whose payment send fails after nested re-entrant
//! calls) can be unwound to the exact state it started from.
//!
//! ```text
//! checkpoint ──record──record──record──┬── commit  (drop entries)
//!                                      └── revert  (undo newest first)
//! ```

use crate::domain::entities::Parcel;
use crate::domain::value_objects::{Address, ParcelId};

/// A single reversible mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JournalEntry {
    /// A parcel record was inserted. Undo: remove it.
    ParcelCreated {
        /// Inserted parcel.
        parcel_id: ParcelId,
    },
    /// A parcel record was overwritten. Undo: restore `previous`.
    ParcelUpdated {
        /// Record as it was before the write.
        previous: Parcel,
    },
    /// The next-id counter advanced. Undo: reset it.
    CounterAdvanced {
        /// Counter value before the advance.
        previous: u64,
    },
    /// An ownership token was minted. Undo: discard it.
    OwnershipMinted {
        /// Minted parcel.
        parcel_id: ParcelId,
    },
    /// Ownership moved between accounts. Undo: hand it back to `from`.
    OwnershipTransferred {
        /// Transferred parcel.
        parcel_id: ParcelId,
        /// Owner before the transfer.
        from: Address,
    },
}

/// Position in the journal and the event buffer at the start of an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Checkpoint {
    /// Journal length when the checkpoint was taken.
    pub journal_len: usize,
    /// Event buffer length when the checkpoint was taken.
    pub events_len: usize,
}

/// Ordered undo log.
#[derive(Clone, Debug, Default)]
pub struct Journal {
    entries: Vec<JournalEntry>,
}

impl Journal {
    /// Creates an empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    pub fn record(&mut self, entry: JournalEntry) {
        self.entries.push(entry);
    }

    /// Number of uncommitted entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes and returns every entry recorded after `len`, newest first.
    pub fn unwind_to(&mut self, len: usize) -> Vec<JournalEntry> {
        if len >= self.entries.len() {
            return Vec::new();
        }
        let mut undone = self.entries.split_off(len);
        undone.reverse();
        undone
    }

    /// Forgets all entries; the recorded mutations become permanent.
    pub fn commit(&mut self) {
        self.entries.clear();
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwind_returns_newest_first() {
        let mut journal = Journal::new();
        journal.record(JournalEntry::CounterAdvanced { previous: 0 });
        journal.record(JournalEntry::ParcelCreated {
            parcel_id: ParcelId(0),
        });
        journal.record(JournalEntry::OwnershipMinted {
            parcel_id: ParcelId(0),
        });

        let undone = journal.unwind_to(1);
        assert_eq!(
            undone,
            vec![
                JournalEntry::OwnershipMinted {
                    parcel_id: ParcelId(0)
                },
                JournalEntry::ParcelCreated {
                    parcel_id: ParcelId(0)
                },
            ]
        );
        assert_eq!(journal.len(), 1);
    }

    #[test]
    fn test_unwind_past_end_is_noop() {
        let mut journal = Journal::new();
        journal.record(JournalEntry::CounterAdvanced { previous: 4 });
        assert!(journal.unwind_to(5).is_empty());
        assert_eq!(journal.len(), 1);
    }

    #[test]
    fn test_commit_clears() {
        let mut journal = Journal::new();
        journal.record(JournalEntry::CounterAdvanced { previous: 0 });
        journal.commit();
        assert!(journal.is_empty());
    }
}
