//! # Domain Invariants
//!
//! Properties that MUST hold for every committed ledger state.
//! The engine never relies on these checks for correctness; they exist so
//! tests and operators can audit a ledger after the fact.
//!
//! | Invariant | Check |
//! |-----------|-------|
//! | Ids are sequential from zero and never reused | `check_sequential_ids` |
//! | Every parcel has exactly one owner | `check_single_ownership` |
//! | No ownership token without a parcel | `check_no_orphan_tokens` |
//! | A sold parcel's `seller` is its owner | `check_sold_seller_is_owner` |

use crate::domain::entities::Parcel;
use crate::domain::value_objects::{Address, ParcelId};
use std::collections::BTreeMap;

/// Read-only view of committed ledger state used by the checks.
#[derive(Clone, Copy, Debug)]
pub struct LedgerView<'a> {
    /// All parcel records, ascending by id.
    pub parcels: &'a [Parcel],
    /// Every (token, holder) pair, ascending by id. A token listed under
    /// more than one holder appears once per holder.
    pub owners: &'a [(ParcelId, Address)],
    /// Next id the registry will assign.
    pub next_id: u64,
}

// =============================================================================
// INVARIANT CHECKS
// =============================================================================

/// Ids form the contiguous range `0..next_id` in ascending order.
#[must_use]
pub fn check_sequential_ids(view: &LedgerView<'_>) -> Option<InvariantViolation> {
    let expected = usize::try_from(view.next_id).unwrap_or(usize::MAX);
    if view.parcels.len() != expected {
        return Some(InvariantViolation::CounterMismatch {
            next_id: view.next_id,
            parcels: view.parcels.len(),
        });
    }
    view.parcels
        .iter()
        .zip(0u64..)
        .find(|(parcel, index)| parcel.id.get() != *index)
        .map(|(parcel, index)| InvariantViolation::IdGap {
            expected: ParcelId(index),
            found: parcel.id,
        })
}

/// Every parcel id maps to exactly one owner.
#[must_use]
pub fn check_single_ownership(view: &LedgerView<'_>) -> Vec<InvariantViolation> {
    let mut counts: BTreeMap<ParcelId, usize> = BTreeMap::new();
    for (id, _) in view.owners {
        *counts.entry(*id).or_default() += 1;
    }
    view.parcels
        .iter()
        .filter_map(|parcel| match counts.get(&parcel.id).copied().unwrap_or(0) {
            1 => None,
            0 => Some(InvariantViolation::MissingOwner(parcel.id)),
            n => Some(InvariantViolation::MultipleOwners {
                parcel_id: parcel.id,
                owners: n,
            }),
        })
        .collect()
}

/// Every ownership token refers to a registered parcel.
#[must_use]
pub fn check_no_orphan_tokens(view: &LedgerView<'_>) -> Vec<InvariantViolation> {
    view.owners
        .iter()
        .filter(|(id, _)| view.parcels.binary_search_by_key(id, |p| p.id).is_err())
        .map(|(id, _)| InvariantViolation::OrphanToken(*id))
        .collect()
}

/// Once sold, the `seller` field records the buyer, who is also the owner.
#[must_use]
pub fn check_sold_seller_is_owner(view: &LedgerView<'_>) -> Vec<InvariantViolation> {
    let owners: BTreeMap<ParcelId, Address> = view.owners.iter().copied().collect();
    view.parcels
        .iter()
        .filter(|p| !p.is_for_sale)
        .filter_map(|p| match owners.get(&p.id) {
            Some(owner) if *owner != p.seller => Some(InvariantViolation::SellerNotOwner {
                parcel_id: p.id,
                seller: p.seller,
                owner: *owner,
            }),
            _ => None,
        })
        .collect()
}

/// Check all invariants at once.
#[must_use]
pub fn check_all_invariants(view: &LedgerView<'_>) -> InvariantCheckResult {
    let mut violations = Vec::new();
    violations.extend(check_sequential_ids(view));
    violations.extend(check_single_ownership(view));
    violations.extend(check_no_orphan_tokens(view));
    violations.extend(check_sold_seller_is_owner(view));

    if violations.is_empty() {
        InvariantCheckResult::Valid
    } else {
        InvariantCheckResult::Invalid(violations)
    }
}

// =============================================================================
// INVARIANT TYPES
// =============================================================================

/// Result of checking all invariants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantCheckResult {
    /// All invariants hold.
    Valid,
    /// One or more invariants violated.
    Invalid(Vec<InvariantViolation>),
}

impl InvariantCheckResult {
    /// Returns true if all invariants hold.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Specific invariant violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    /// Number of parcels differs from the id counter.
    CounterMismatch { next_id: u64, parcels: usize },
    /// Ids are not contiguous.
    IdGap { expected: ParcelId, found: ParcelId },
    /// Parcel has no owner.
    MissingOwner(ParcelId),
    /// Parcel has more than one owner entry.
    MultipleOwners { parcel_id: ParcelId, owners: usize },
    /// Ownership token without a parcel record.
    OrphanToken(ParcelId),
    /// Sold parcel whose seller is not its owner.
    SellerNotOwner {
        parcel_id: ParcelId,
        seller: Address,
        owner: Address,
    },
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CounterMismatch { next_id, parcels } => {
                write!(f, "counter mismatch: next id {next_id}, {parcels} parcels")
            }
            Self::IdGap { expected, found } => {
                write!(f, "id gap: expected {expected}, found {found}")
            }
            Self::MissingOwner(id) => write!(f, "parcel {id} has no owner"),
            Self::MultipleOwners { parcel_id, owners } => {
                write!(f, "parcel {parcel_id} has {owners} owners")
            }
            Self::OrphanToken(id) => write!(f, "ownership token {id} has no parcel"),
            Self::SellerNotOwner {
                parcel_id,
                seller,
                owner,
            } => write!(
                f,
                "sold parcel {parcel_id}: seller {seller} is not owner {owner}"
            ),
        }
    }
}

// =============================================================================
// LIMIT CONSTANTS
// =============================================================================

/// Default input and execution limits.
pub mod limits {
    /// Maximum nesting of mutating operations (re-entrant calls included).
    pub const MAX_CALL_DEPTH: u16 = 64;

    /// Maximum location length in bytes.
    pub const MAX_LOCATION_LEN: usize = 1024;

    /// Maximum metadata URI length in bytes.
    pub const MAX_TOKEN_URI_LEN: usize = 2048;
}

// =============================================================================
// TESTS
// =============================================================================
