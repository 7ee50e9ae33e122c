//! # Ownership Adapter
//!
//! In-memory ownership layer in the style of a non-fungible token ledger:
//! one owner per token, a metadata URI per token, and a per-owner index so
//! `balance_of` and `tokens_of` do not scan every token.

use crate::domain::value_objects::{Address, ParcelId};
use crate::errors::OwnershipError;
use crate::ports::outbound::OwnershipRegistry;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// In-memory ownership registry.
#[derive(Debug, Default, Clone)]
pub struct InMemoryOwnership {
    owners: BTreeMap<ParcelId, Address>,
    uris: HashMap<ParcelId, String>,
    holdings: HashMap<Address, BTreeSet<ParcelId>>,
}

impl InMemoryOwnership {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn index_add(&mut self, owner: Address, parcel_id: ParcelId) {
        self.holdings.entry(owner).or_default().insert(parcel_id);
    }

    fn index_remove(&mut self, owner: Address, parcel_id: ParcelId) {
        if let Some(held) = self.holdings.get_mut(&owner) {
            held.remove(&parcel_id);
            if held.is_empty() {
                self.holdings.remove(&owner);
            }
        }
    }
}

impl OwnershipRegistry for InMemoryOwnership {
    fn owner_of(&self, parcel_id: ParcelId) -> Option<Address> {
        self.owners.get(&parcel_id).copied()
    }

    fn token_uri(&self, parcel_id: ParcelId) -> Option<String> {
        self.uris.get(&parcel_id).cloned()
    }

    fn balance_of(&self, owner: Address) -> u64 {
        self.holdings
            .get(&owner)
            .map_or(0, |held| held.len() as u64)
    }

    fn tokens_of(&self, owner: Address) -> Vec<ParcelId> {
        self.holdings
            .get(&owner)
            .map(|held| held.iter().copied().collect())
            .unwrap_or_default()
    }

    fn tokens(&self) -> Vec<(ParcelId, Address)> {
        self.owners.iter().map(|(id, owner)| (*id, *owner)).collect()
    }

    fn mint(
        &mut self,
        parcel_id: ParcelId,
        owner: Address,
        token_uri: String,
    ) -> Result<(), OwnershipError> {
        if self.owners.contains_key(&parcel_id) {
            return Err(OwnershipError::AlreadyMinted(parcel_id));
        }
        self.owners.insert(parcel_id, owner);
        self.uris.insert(parcel_id, token_uri);
        self.index_add(owner, parcel_id);
        Ok(())
    }

    fn transfer(
        &mut self,
        parcel_id: ParcelId,
        from: Address,
        to: Address,
    ) -> Result<(), OwnershipError> {
        let current = self
            .owners
            .get(&parcel_id)
            .copied()
            .ok_or(OwnershipError::UnknownToken(parcel_id))?;
        if current != from {
            return Err(OwnershipError::NotOwner {
                parcel_id,
                expected: from,
                actual: current,
            });
        }
        self.reassign(parcel_id, to);
        Ok(())
    }

    fn reassign(&mut self, parcel_id: ParcelId, owner: Address) {
        if let Some(previous) = self.owners.insert(parcel_id, owner) {
            self.index_remove(previous, parcel_id);
        }
        self.index_add(owner, parcel_id);
    }

    fn discard(&mut self, parcel_id: ParcelId) {
        if let Some(owner) = self.owners.remove(&parcel_id) {
            self.index_remove(owner, parcel_id);
        }
        self.uris.remove(&parcel_id);
    }
}

// =============================================================================
// TESTS
// =============================================================================
