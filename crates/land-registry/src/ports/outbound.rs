//! # Driven Ports (SPI - Outbound)
//!
//! Interfaces the registry engine depends on. Adapters implement these to
//! provide:
//! - The ledger store (parcel records + id counter)
//! - The ownership layer (who owns which parcel, metadata URIs)
//! - The payment channel (send-and-report value transfer)
//! - Event delivery
//!
//! Only the engine writes to `ParcelStore` and `OwnershipRegistry`. The
//! `restore`/`remove`/`discard`/`reassign` methods exist solely so the engine
//! can unwind its own journal; they perform no validation.

use crate::domain::entities::Parcel;
use crate::domain::value_objects::{Address, ParcelId, U256};
use crate::errors::{OwnershipError, PaymentError, StoreError};
use crate::events::RegistryEvent;
use crate::ports::inbound::LandRegistryApi;

// =============================================================================
// LEDGER STORE
// =============================================================================

/// Durable mapping of parcel id to parcel record.
pub trait ParcelStore {
    /// Record for `parcel_id`, if registered.
    fn get(&self, parcel_id: ParcelId) -> Option<Parcel>;

    /// All records, ascending by id.
    fn all(&self) -> Vec<Parcel>;

    /// Next id to assign.
    fn next_id(&self) -> u64;

    /// Inserts a new record.
    ///
    /// # Errors
    /// - `DuplicateParcel` if the id already has a record.
    fn insert(&mut self, parcel: Parcel) -> Result<(), StoreError>;

    /// Overwrites an existing record.
    ///
    /// # Errors
    /// - `NotFound` if the id has no record.
    fn update(&mut self, parcel: Parcel) -> Result<(), StoreError>;

    /// Sets the id counter.
    fn set_next_id(&mut self, next_id: u64);

    /// Unconditionally writes `parcel` (journal unwind only).
    fn restore(&mut self, parcel: Parcel);

    /// Deletes a record (journal unwind only).
    fn remove(&mut self, parcel_id: ParcelId) -> Option<Parcel>;
}

// =============================================================================
// OWNERSHIP LAYER
// =============================================================================

/// Parcel id to owner relation, independent of the parcel record.
pub trait OwnershipRegistry {
    /// Current owner, if the token exists.
    fn owner_of(&self, parcel_id: ParcelId) -> Option<Address>;

    /// Metadata URI stored at mint time.
    fn token_uri(&self, parcel_id: ParcelId) -> Option<String>;

    /// Number of tokens owned by `owner`.
    fn balance_of(&self, owner: Address) -> u64;

    /// Tokens owned by `owner`, ascending.
    fn tokens_of(&self, owner: Address) -> Vec<ParcelId>;

    /// Every token with its owner, ascending by id.
    fn tokens(&self) -> Vec<(ParcelId, Address)>;

    /// Creates a token owned by `owner`.
    ///
    /// # Errors
    /// - `AlreadyMinted` if the token exists.
    fn mint(
        &mut self,
        parcel_id: ParcelId,
        owner: Address,
        token_uri: String,
    ) -> Result<(), OwnershipError>;

    /// Moves a token from `from` to `to`.
    ///
    /// # Errors
    /// - `UnknownToken` if the token does not exist
    /// - `NotOwner` if `from` is not the current owner
    fn transfer(
        &mut self,
        parcel_id: ParcelId,
        from: Address,
        to: Address,
    ) -> Result<(), OwnershipError>;

    /// Sets the owner without checks (journal unwind only).
    fn reassign(&mut self, parcel_id: ParcelId, owner: Address);

    /// Deletes a token (journal unwind only).
    fn discard(&mut self, parcel_id: ParcelId);
}

// =============================================================================
// PAYMENT CHANNEL
// =============================================================================

/// Position in a payment channel's settlement history.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct PaymentSavepoint(pub usize);

/// Synchronous send-and-report value transfer.
///
/// The channel is invoked by the engine inside `buy`, after all ledger
/// effects are applied. An implementation may run arbitrary counterparty
/// logic, including calls back into `registry`; those calls execute inside
/// the same atomic operation and observe its post-mutation state. Nested
/// calls must be given this same channel so their settlement is covered by
/// the enclosing savepoint.
///
/// Settlement belongs to the atomic unit: before sending, the engine takes a
/// `savepoint`, and when the purchase fails it calls `rollback_to`, which
/// must undo every payout made since, nested ones included.
pub trait PaymentChannel {
    /// Pays `amount` to `recipient` out of value held for `payer`.
    ///
    /// # Errors
    /// Any `PaymentError`; the engine maps it to `PaymentTransferFailed`.
    fn send(
        &mut self,
        registry: &mut dyn LandRegistryApi,
        payer: Address,
        recipient: Address,
        amount: U256,
    ) -> Result<(), PaymentError>;

    /// Marks the current settlement state.
    fn savepoint(&self) -> PaymentSavepoint;

    /// Undoes every payout made after `savepoint`, newest first.
    fn rollback_to(&mut self, savepoint: PaymentSavepoint);
}

/// Custody of value attached to a call, held per payer by the execution
/// environment until the operation settles.
pub trait ValueEscrow {
    /// Takes `amount` from `payer` for the duration of an operation.
    ///
    /// # Errors
    /// - `InsufficientBalance` if `payer` cannot cover `amount`.
    fn hold(&mut self, payer: Address, amount: U256) -> Result<(), PaymentError>;

    /// Returns held value to `payer` after a failed operation.
    ///
    /// # Errors
    /// - `InsufficientBalance` if less than `amount` is held for `payer`.
    fn refund(&mut self, payer: Address, amount: U256) -> Result<(), PaymentError>;
}

// =============================================================================
// EVENT SINK
// =============================================================================

/// Destination for committed registry events.
pub trait EventSink: Send + Sync {
    /// Delivers one event. Delivery failures must not affect the ledger.
    fn publish(&self, event: &RegistryEvent);
}
