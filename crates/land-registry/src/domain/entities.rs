//! # Core Domain Entities
//!
//! Main business entities of the land ledger: the parcel record, the
//! per-operation call context and the purchase receipt.

use crate::domain::value_objects::{Address, ParcelId, U256};
use serde::{Deserialize, Serialize};

// =============================================================================
// PARCEL
// =============================================================================

/// A registered unit of land.
///
/// Fixed-shape record. Ownership is tracked separately by the ownership
/// layer; `seller` is the last recorded counterparty, not a live owner pointer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parcel {
    /// Sequential id, immutable once assigned.
    pub id: ParcelId,
    /// Opaque description (free text or encoded coordinates).
    pub location: String,
    /// Asking price in the smallest settlement unit.
    pub price: U256,
    /// True from registration until the first successful purchase.
    pub is_for_sale: bool,
    /// Account that receives consideration; the buyer after a purchase.
    pub seller: Address,
}

impl Parcel {
    /// Creates a freshly registered parcel, listed for sale by `registrant`.
    #[must_use]
    pub fn listed(id: ParcelId, location: impl Into<String>, price: U256, registrant: Address) -> Self {
        Self {
            id,
            location: location.into(),
            price,
            is_for_sale: true,
            seller: registrant,
        }
    }

    /// Current position in the sale state machine.
    #[must_use]
    pub fn status(&self) -> ParcelStatus {
        if self.is_for_sale {
            ParcelStatus::ListedForSale
        } else {
            ParcelStatus::Sold
        }
    }

    /// Returns a copy of this parcel in the terminal `Sold` state.
    #[must_use]
    pub fn sold_to(&self, buyer: Address) -> Self {
        Self {
            is_for_sale: false,
            seller: buyer,
            ..self.clone()
        }
    }
}

/// Sale state of a parcel.
///
/// ```text
/// [ListedForSale] ──buy──→ [Sold]
/// ```
///
/// `Sold` is terminal: there is no re-listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParcelStatus {
    /// Registered and purchasable.
    ListedForSale,
    /// Purchased once; no further sales.
    Sold,
}

// =============================================================================
// CALL CONTEXT
// =============================================================================

/// Per-operation context supplied by the execution environment.
///
/// `caller` is the authenticated identity of the invoker; `value` is the
/// payment attached to the call. Neither is a trusted operation argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallContext {
    /// Authenticated caller.
    pub caller: Address,
    /// Attached value in the smallest settlement unit.
    pub value: U256,
}

impl CallContext {
    /// Context for a call without attached value.
    #[must_use]
    pub fn new(caller: Address) -> Self {
        Self {
            caller,
            value: U256::zero(),
        }
    }

    /// Context for a call carrying `value`.
    #[must_use]
    pub fn with_value(caller: Address, value: U256) -> Self {
        Self { caller, value }
    }
}

// =============================================================================
// PURCHASE RECEIPT
// =============================================================================

/// Outcome of a committed purchase.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseReceipt {
    /// Parcel that changed hands.
    pub parcel_id: ParcelId,
    /// Previous owner, recipient of the payment.
    pub seller: Address,
    /// New owner.
    pub buyer: Address,
    /// Listed price at the time of purchase.
    pub price: U256,
    /// Full attached value forwarded to the seller.
    pub paid: U256,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listed_parcel_defaults() {
        let alice = Address::from_label("alice");
        let parcel = Parcel::listed(ParcelId(0), "Plot 1", U256::from(100), alice);

        assert!(parcel.is_for_sale);
        assert_eq!(parcel.seller, alice);
        assert_eq!(parcel.status(), ParcelStatus::ListedForSale);
    }

    #[test]
    fn test_sold_to_keeps_identity_fields() {
        let alice = Address::from_label("alice");
        let bob = Address::from_label("bob");
        let parcel = Parcel::listed(ParcelId(3), "Plot 3", U256::from(10), alice);

        let sold = parcel.sold_to(bob);
        assert_eq!(sold.id, parcel.id);
        assert_eq!(sold.location, parcel.location);
        assert_eq!(sold.price, parcel.price);
        assert_eq!(sold.seller, bob);
        assert_eq!(sold.status(), ParcelStatus::Sold);
    }

    #[test]
    fn test_parcel_json_shape() {
        let alice = Address::new([0x11; 20]);
        let parcel = Parcel::listed(ParcelId(0), "Plot 1", U256::from(100), alice);
        let json = serde_json::to_value(&parcel).unwrap();

        assert_eq!(json["id"], 0);
        assert_eq!(json["isForSale"], true);
        assert_eq!(json["location"], "Plot 1");
        assert_eq!(json["seller"], alice.to_hex());
    }
}
