//! # Event Schema
//!
//! Events emitted by committed registry operations.
//!
//! Events are buffered by the engine alongside the mutation journal: an
//! operation that rolls back discards the events it produced, so consumers
//! only ever see events for committed state.
//!
//! | Operation | Events (in order) |
//! |-----------|-------------------|
//! | `register` | `OwnershipTransferred { from: None }`, `ParcelRegistered` |
//! | `buy` | `OwnershipTransferred { from: Some(seller) }`, `ParcelSold` |

use crate::domain::value_objects::{Address, ParcelId, U256};
use serde::{Deserialize, Serialize};

/// A committed ledger event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RegistryEvent {
    /// A parcel was registered and listed for sale.
    #[serde(rename_all = "camelCase")]
    ParcelRegistered {
        /// New parcel id.
        parcel_id: ParcelId,
        /// Registrant and first owner.
        owner: Address,
        /// Location as supplied.
        location: String,
        /// Asking price.
        price: U256,
        /// Metadata URI as supplied.
        token_uri: String,
    },

    /// Ownership of a parcel moved. `from` is `None` for the initial mint.
    #[serde(rename_all = "camelCase")]
    OwnershipTransferred {
        /// Parcel whose owner changed.
        parcel_id: ParcelId,
        /// Previous owner.
        from: Option<Address>,
        /// New owner.
        to: Address,
    },

    /// A listed parcel was purchased.
    #[serde(rename_all = "camelCase")]
    ParcelSold {
        /// Purchased parcel.
        parcel_id: ParcelId,
        /// Previous owner, who received the payment.
        seller: Address,
        /// New owner.
        buyer: Address,
        /// Listed price.
        price: U256,
        /// Value forwarded to the seller.
        paid: U256,
    },
}

impl RegistryEvent {
    /// Parcel the event refers to.
    #[must_use]
    pub fn parcel_id(&self) -> ParcelId {
        match self {
            Self::ParcelRegistered { parcel_id, .. }
            | Self::OwnershipTransferred { parcel_id, .. }
            | Self::ParcelSold { parcel_id, .. } => *parcel_id,
        }
    }

    /// Short topic name for logging.
    #[must_use]
    pub fn topic(&self) -> &'static str {
        match self {
            Self::ParcelRegistered { .. } => topics::PARCEL_REGISTERED,
            Self::OwnershipTransferred { .. } => topics::OWNERSHIP_TRANSFERRED,
            Self::ParcelSold { .. } => topics::PARCEL_SOLD,
        }
    }
}

/// Event topic names.
pub mod topics {
    /// Topic for [`super::RegistryEvent::ParcelRegistered`].
    pub const PARCEL_REGISTERED: &str = "registry.parcel_registered";
    /// Topic for [`super::RegistryEvent::OwnershipTransferred`].
    pub const OWNERSHIP_TRANSFERRED: &str = "registry.ownership_transferred";
    /// Topic for [`super::RegistryEvent::ParcelSold`].
    pub const PARCEL_SOLD: &str = "registry.parcel_sold";
}

// =============================================================================
// TESTS
// =============================================================================
