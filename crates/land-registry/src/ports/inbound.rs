//! # Driving Ports (API - Inbound)
//!
//! The public surface of the land ledger.
//!
//! | Operation | Caller requirement | Failure modes |
//! |-----------|--------------------|---------------|
//! | `register` | any authenticated identity | `ExecutionRejected` |
//! | `buy` | any identity other than the owner | `NotForSale`, `InsufficientFunds`, `AlreadyOwner`, `PaymentTransferFailed`, `ExecutionRejected` |
//! | `list_all` and reads | any | `UnknownParcel` for single-parcel reads |
//!
//! The trait is object safe: the payment channel receives the registry as
//! `&mut dyn LandRegistryApi`, which is how counterparty logic triggered by a
//! payment re-enters the ledger inside the same atomic operation.

use crate::domain::entities::{CallContext, Parcel, PurchaseReceipt};
use crate::domain::value_objects::{Address, ParcelId, U256};
use crate::errors::RegistryError;
use crate::ports::outbound::PaymentChannel;

/// Primary API of the land ledger.
pub trait LandRegistryApi {
    /// Registers a new parcel owned by and listed for sale by `ctx.caller`.
    ///
    /// Each successful call allocates a fresh sequential id; there is no
    /// deduplication. Any value attached to `ctx` is ignored.
    ///
    /// # Errors
    /// - `ExecutionRejected`: malformed input, exhausted id space or a
    ///   storage failure.
    fn register(
        &mut self,
        ctx: &CallContext,
        location: &str,
        price: U256,
        token_uri: &str,
    ) -> Result<ParcelId, RegistryError>;

    /// Buys `parcel_id` for `ctx.caller`, forwarding the full `ctx.value` to
    /// the previous owner through `payments`.
    ///
    /// Ownership and sale state change before the payment is sent; if the
    /// send fails every mutation since the call began is rolled back.
    ///
    /// # Errors
    /// Checked in this order, first failure wins:
    /// - `NotForSale`: parcel missing or already sold
    /// - `InsufficientFunds`: `ctx.value` below the price
    /// - `AlreadyOwner`: caller owns the parcel
    ///
    /// Then `PaymentTransferFailed` if the send fails, or `ExecutionRejected`
    /// on storage failure or excessive re-entrant nesting.
    fn buy(
        &mut self,
        ctx: &CallContext,
        parcel_id: ParcelId,
        payments: &mut dyn PaymentChannel,
    ) -> Result<PurchaseReceipt, RegistryError>;

    /// Every parcel ever registered, ascending by id, with current values.
    fn list_all(&self) -> Vec<Parcel>;

    /// A single parcel record.
    ///
    /// # Errors
    /// - `UnknownParcel`: id never registered
    fn parcel(&self, parcel_id: ParcelId) -> Result<Parcel, RegistryError>;

    /// Current owner of a parcel.
    ///
    /// # Errors
    /// - `UnknownParcel`: id never registered
    fn owner_of(&self, parcel_id: ParcelId) -> Result<Address, RegistryError>;

    /// Metadata URI recorded at registration.
    ///
    /// # Errors
    /// - `UnknownParcel`: id never registered
    fn token_uri(&self, parcel_id: ParcelId) -> Result<String, RegistryError>;

    /// Number of parcels currently owned by `owner`.
    fn balance_of(&self, owner: Address) -> u64;

    /// Parcels currently owned by `owner`, ascending by id.
    fn parcels_owned_by(&self, owner: Address) -> Vec<Parcel>;

    /// Number of parcels ever registered.
    fn parcel_count(&self) -> u64;
}
