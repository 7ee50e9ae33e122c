//! # Land Registry - Land Title Ledger
//!
//! ## Purpose
//!
//! A ledger of land parcels. Anyone may register a parcel, which mints a
//! unique ownership token to the registrant and lists the parcel for sale at
//! a fixed price. Anyone else may buy a listed parcel by attaching at least
//! the asking price; ownership moves to the buyer and the full attached value
//! is forwarded to the previous owner. A parcel is sold exactly once.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | Ids are sequential from 0 and never reused | `engine.rs` - `apply_register()` |
//! | Each parcel has exactly one owner | `adapters/ownership.rs` - `InMemoryOwnership` |
//! | A sold parcel's seller is its owner | `engine.rs` - `apply_purchase()` |
//! | Failed operations leave no trace | `engine.rs` - `revert_to()` |
//! | Re-entrant calls see the parcel as sold | `engine.rs` - effects before `send` |
//!
//! All of them are auditable with `domain/invariants.rs` - `check_all_invariants()`.
//!
//! ## Operations
//!
//! | Operation | Errors |
//! |-----------|--------|
//! | `register` | `ExecutionRejected` |
//! | `buy` | `NotForSale`, `InsufficientFunds`, `AlreadyOwner`, `PaymentTransferFailed` |
//! | `list_all` | none |
//! | `parcel`, `owner_of`, `token_uri` | `UnknownParcel` |
//!
//! ## Outbound Dependencies
//!
//! | Trait | Purpose | In-memory adapter |
//! |-------|---------|-------------------|
//! | `ParcelStore` | Parcel records and the id counter | `InMemoryParcelStore` |
//! | `OwnershipRegistry` | Ownership tokens and metadata URIs | `InMemoryOwnership` |
//! | `PaymentChannel` | Value transfer to the seller | `InMemoryPayments` |
//! | `ValueEscrow` | Custody of attached value | `InMemoryPayments` |
//! | `EventSink` | Delivery of committed events | `InMemoryEventLog`, `TracingEventSink` |
//!
//! ## Usage Example
//!
//! ```
//! use land_registry::prelude::*;
//!
//! let mut engine = RegistryEngine::in_memory();
//! let alice = Address::from_label("alice");
//! let bob = Address::from_label("bob");
//!
//! let id = engine
//!     .register(&CallContext::new(alice), "Plot 1", U256::from(100), "ipfs://plot")
//!     .unwrap();
//!
//! let mut payments = InMemoryPayments::new();
//! payments.fund(bob, U256::from(150)).unwrap();
//! payments.hold(bob, U256::from(150)).unwrap();
//!
//! engine
//!     .buy(&CallContext::with_value(bob, U256::from(150)), id, &mut payments)
//!     .unwrap();
//! assert_eq!(engine.owner_of(id).unwrap(), bob);
//! assert_eq!(payments.balance_of(alice), U256::from(150));
//! ```

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod config;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod events;
pub mod ports;
pub mod service;

// =============================================================================
// PRELUDE
// =============================================================================

/// Commonly used types.
pub mod prelude {
    // Domain
    pub use crate::domain::entities::{CallContext, Parcel, ParcelStatus, PurchaseReceipt};
    pub use crate::domain::invariants::{
        check_all_invariants, limits, InvariantCheckResult, InvariantViolation, LedgerView,
    };
    pub use crate::domain::value_objects::{Address, ParcelId, U256};

    // Ports
    pub use crate::ports::inbound::LandRegistryApi;
    pub use crate::ports::outbound::{
        EventSink, OwnershipRegistry, ParcelStore, PaymentChannel, PaymentSavepoint, ValueEscrow,
    };

    // Errors and events
    pub use crate::errors::{ErrorKind, OwnershipError, PaymentError, RegistryError, StoreError};
    pub use crate::events::RegistryEvent;

    // Adapters
    pub use crate::adapters::{
        InMemoryEventLog, InMemoryOwnership, InMemoryParcelStore, InMemoryPayments, Payout,
        TracingEventSink,
    };

    // Engine and service
    pub use crate::config::{RegistryConfig, ServiceConfig};
    pub use crate::engine::RegistryEngine;
    pub use crate::service::{
        create_in_memory_service, create_in_memory_service_with_events, InMemoryRegistryService,
        LandRegistryService, ServiceStats,
    };
}

// =============================================================================
// CRATE INFO
// =============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// TESTS
// =============================================================================
