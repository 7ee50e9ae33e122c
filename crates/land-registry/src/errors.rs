//! # Error Types
//!
//! All error types for the land ledger.
//!
//! Every registry failure is local, synchronous and all-or-nothing: a failed
//! operation leaves the ledger exactly as it was. The engine never retries.

use crate::domain::value_objects::{Address, ParcelId, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// REGISTRY ERRORS
// =============================================================================

/// Errors returned by registry operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Parcel does not exist or has already been sold.
    #[error("parcel {parcel_id} is not for sale")]
    NotForSale { parcel_id: ParcelId },

    /// Attached value is below the asking price.
    #[error("insufficient funds: required {required}, provided {provided}")]
    InsufficientFunds { required: U256, provided: U256 },

    /// Caller already owns the parcel.
    #[error("caller already owns parcel {parcel_id}")]
    AlreadyOwner { parcel_id: ParcelId },

    /// Payment to the previous owner failed; the purchase was rolled back.
    #[error("payment for parcel {parcel_id} failed: {reason}")]
    PaymentTransferFailed { parcel_id: ParcelId, reason: String },

    /// Environment-level rejection (malformed input, exhausted resources,
    /// storage failure).
    #[error("execution rejected: {0}")]
    ExecutionRejected(String),

    /// Read of a parcel that was never registered.
    #[error("unknown parcel {parcel_id}")]
    UnknownParcel { parcel_id: ParcelId },
}

impl RegistryError {
    /// Stable classification for callers that must react per failure kind.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotForSale { .. } => ErrorKind::NotForSale,
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::AlreadyOwner { .. } => ErrorKind::AlreadyOwner,
            Self::PaymentTransferFailed { .. } => ErrorKind::PaymentTransferFailed,
            Self::ExecutionRejected(_) => ErrorKind::ExecutionRejected,
            Self::UnknownParcel { .. } => ErrorKind::UnknownParcel,
        }
    }
}

/// Discriminant of [`RegistryError`], suitable for metrics and wire formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErrorKind {
    /// See [`RegistryError::NotForSale`].
    NotForSale,
    /// See [`RegistryError::InsufficientFunds`].
    InsufficientFunds,
    /// See [`RegistryError::AlreadyOwner`].
    AlreadyOwner,
    /// See [`RegistryError::PaymentTransferFailed`].
    PaymentTransferFailed,
    /// See [`RegistryError::ExecutionRejected`].
    ExecutionRejected,
    /// See [`RegistryError::UnknownParcel`].
    UnknownParcel,
}

// =============================================================================
// STORE ERRORS
// =============================================================================

/// Errors from the parcel store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Insert of an id that already has a record.
    #[error("parcel {0} already exists")]
    DuplicateParcel(ParcelId),

    /// Update of an id without a record.
    #[error("parcel {0} not found")]
    NotFound(ParcelId),

    /// Backend unavailable or failed.
    #[error("store error: {0}")]
    Other(String),
}

impl From<StoreError> for RegistryError {
    fn from(err: StoreError) -> Self {
        RegistryError::ExecutionRejected(err.to_string())
    }
}

// =============================================================================
// OWNERSHIP ERRORS
// =============================================================================

/// Errors from the ownership layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OwnershipError {
    /// Mint of an id that already has an owner.
    #[error("token {0} already minted")]
    AlreadyMinted(ParcelId),

    /// Transfer of an id without an owner.
    #[error("token {0} does not exist")]
    UnknownToken(ParcelId),

    /// Transfer where `from` is not the current owner.
    #[error("token {parcel_id} is owned by {actual}, not {expected}")]
    NotOwner {
        parcel_id: ParcelId,
        expected: Address,
        actual: Address,
    },
}

impl From<OwnershipError> for RegistryError {
    fn from(err: OwnershipError) -> Self {
        RegistryError::ExecutionRejected(err.to_string())
    }
}

// =============================================================================
// PAYMENT ERRORS
// =============================================================================

/// Errors reported by the payment channel.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PaymentError {
    /// Recipient refused the payment.
    #[error("recipient {0} rejected the payment")]
    Rejected(Address),

    /// Payer cannot cover the amount.
    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: U256, available: U256 },

    /// Recipient balance would overflow.
    #[error("balance overflow for {0}")]
    Overflow(Address),

    /// Channel failure.
    #[error("payment channel error: {0}")]
    Channel(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_error_display() {
        let err = RegistryError::NotForSale {
            parcel_id: ParcelId(3),
        };
        assert_eq!(err.to_string(), "parcel #3 is not for sale");

        let err = RegistryError::InsufficientFunds {
            required: U256::from(100),
            provided: U256::from(99),
        };
        assert_eq!(
            err.to_string(),
            "insufficient funds: required 100, provided 99"
        );
    }

    #[test]
    fn test_error_kinds_are_distinct() {
        let errors = [
            RegistryError::NotForSale {
                parcel_id: ParcelId(0),
            },
            RegistryError::InsufficientFunds {
                required: U256::one(),
                provided: U256::zero(),
            },
            RegistryError::AlreadyOwner {
                parcel_id: ParcelId(0),
            },
            RegistryError::PaymentTransferFailed {
                parcel_id: ParcelId(0),
                reason: "rejected".to_string(),
            },
            RegistryError::ExecutionRejected("bad input".to_string()),
        ];
        let kinds: std::collections::BTreeSet<_> = errors.iter().map(RegistryError::kind).collect();
        assert_eq!(kinds.len(), errors.len());
    }

    #[test]
    fn test_store_error_conversion() {
        let err: RegistryError = StoreError::Other("disk full".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::ExecutionRejected);
    }

    #[test]
    fn test_ownership_error_conversion() {
        let err: RegistryError = OwnershipError::UnknownToken(ParcelId(9)).into();
        assert!(matches!(err, RegistryError::ExecutionRejected(msg) if msg.contains("#9")));
    }
}
