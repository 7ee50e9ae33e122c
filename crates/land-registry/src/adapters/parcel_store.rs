//! # Parcel Store Adapter
//!
//! In-memory ledger store. Records are kept in a `BTreeMap`, so iteration is
//! already in ascending id order.

use crate::domain::entities::Parcel;
use crate::domain::value_objects::ParcelId;
use crate::errors::StoreError;
use crate::ports::outbound::ParcelStore;
use std::collections::BTreeMap;

/// In-memory parcel store.
#[derive(Debug, Default, Clone)]
pub struct InMemoryParcelStore {
    parcels: BTreeMap<ParcelId, Parcel>,
    next_id: u64,
}

impl InMemoryParcelStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parcels.len()
    }

    /// True when no parcel is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parcels.is_empty()
    }
}

impl ParcelStore for InMemoryParcelStore {
    fn get(&self, parcel_id: ParcelId) -> Option<Parcel> {
        self.parcels.get(&parcel_id).cloned()
    }

    fn all(&self) -> Vec<Parcel> {
        self.parcels.values().cloned().collect()
    }

    fn next_id(&self) -> u64 {
        self.next_id
    }

    fn insert(&mut self, parcel: Parcel) -> Result<(), StoreError> {
        if self.parcels.contains_key(&parcel.id) {
            return Err(StoreError::DuplicateParcel(parcel.id));
        }
        self.parcels.insert(parcel.id, parcel);
        Ok(())
    }

    fn update(&mut self, parcel: Parcel) -> Result<(), StoreError> {
        match self.parcels.get_mut(&parcel.id) {
            Some(slot) => {
                *slot = parcel;
                Ok(())
            }
            None => Err(StoreError::NotFound(parcel.id)),
        }
    }

    fn set_next_id(&mut self, next_id: u64) {
        self.next_id = next_id;
    }

    fn restore(&mut self, parcel: Parcel) {
        self.parcels.insert(parcel.id, parcel);
    }

    fn remove(&mut self, parcel_id: ParcelId) -> Option<Parcel> {
        self.parcels.remove(&parcel_id)
    }
}

// =============================================================================
// TESTS
// =============================================================================
