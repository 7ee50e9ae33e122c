//! # Registry Engine
//!
//! The ledger state machine. Validates and applies `register`, `buy` and the
//! read API against an injected `ParcelStore` and `OwnershipRegistry`.
//!
//! ## Purchase protocol
//!
//! ```text
//! check: for sale ─→ value >= price ─→ caller != owner      (no mutation)
//!    │
//!    ▼ checkpoint
//! transfer ownership ─→ mark sold ─→ buffer events           (effects)
//!    │
//!    ▼
//! payments.send(previous owner, full value)                  (external call)
//!    │
//!    ├── Ok  ─→ commit (outermost operation only)
//!    └── Err ─→ roll settlement back to its savepoint,
//!               unwind journal to checkpoint, PaymentTransferFailed
//! ```
//!
//! Every ledger effect of `buy` is applied before the payment is sent. A
//! counterparty that re-enters the engine from inside `send` therefore sees
//! the parcel as sold and is rejected with `NotForSale`. Anything a nested
//! call manages to do is journaled under the outer checkpoint, and any payout
//! it makes lies past the outer payment savepoint; both are undone if the
//! outer send fails.

use crate::adapters::{InMemoryOwnership, InMemoryParcelStore};
use crate::config::RegistryConfig;
use crate::domain::entities::{CallContext, Parcel, PurchaseReceipt};
use crate::domain::invariants::{check_all_invariants, InvariantCheckResult, LedgerView};
use crate::domain::journal::{Checkpoint, Journal, JournalEntry};
use crate::domain::value_objects::{Address, ParcelId, U256};
use crate::errors::{RegistryError, StoreError};
use crate::events::RegistryEvent;
use crate::ports::inbound::LandRegistryApi;
use crate::ports::outbound::{OwnershipRegistry, ParcelStore, PaymentChannel};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// The land ledger state machine.
///
/// Owns its store and ownership layer exclusively; nothing else writes them.
pub struct RegistryEngine<S: ParcelStore, O: OwnershipRegistry> {
    config: RegistryConfig,
    store: S,
    ownership: O,
    journal: Journal,
    events: Vec<RegistryEvent>,
    depth: u16,
}

impl RegistryEngine<InMemoryParcelStore, InMemoryOwnership> {
    /// Engine over empty in-memory adapters with default limits.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(
            InMemoryParcelStore::new(),
            InMemoryOwnership::new(),
            RegistryConfig::default(),
        )
    }
}

impl<S: ParcelStore, O: OwnershipRegistry> RegistryEngine<S, O> {
    /// Create an engine over the given store and ownership layer.
    ///
    /// `max_call_depth` is raised to 1 so the outermost operation can run.
    pub fn new(store: S, ownership: O, mut config: RegistryConfig) -> Self {
        config.max_call_depth = config.max_call_depth.max(1);
        Self {
            config,
            store,
            ownership,
            journal: Journal::new(),
            events: Vec::new(),
            depth: 0,
        }
    }

    /// Engine limits.
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Read access to the ledger store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read access to the ownership layer.
    #[must_use]
    pub fn ownership(&self) -> &O {
        &self.ownership
    }

    /// Number of mutating operations currently in progress.
    #[must_use]
    pub fn depth(&self) -> u16 {
        self.depth
    }

    /// Drains committed events.
    ///
    /// Returns nothing while an operation is in progress: events buffered
    /// then may still be rolled back.
    pub fn take_events(&mut self) -> Vec<RegistryEvent> {
        if self.depth > 0 {
            return Vec::new();
        }
        std::mem::take(&mut self.events)
    }

    /// Audits the committed state against the ledger invariants.
    ///
    /// Ownership is read through the per-owner holdings of every account
    /// that owns a token or sold a parcel, so a token listed under two
    /// holders shows up as a duplicate.
    #[must_use]
    pub fn verify_invariants(&self) -> InvariantCheckResult {
        let parcels = self.store.all();
        let holders: BTreeSet<Address> = self
            .ownership
            .tokens()
            .into_iter()
            .map(|(_, owner)| owner)
            .chain(parcels.iter().map(|p| p.seller))
            .collect();
        let mut owners: Vec<(ParcelId, Address)> = holders
            .into_iter()
            .flat_map(|holder| {
                self.ownership
                    .tokens_of(holder)
                    .into_iter()
                    .map(move |id| (id, holder))
            })
            .collect();
        owners.sort();
        check_all_invariants(&LedgerView {
            parcels: &parcels,
            owners: &owners,
            next_id: self.store.next_id(),
        })
    }

    // =========================================================================
    // OPERATION FRAME
    // =========================================================================

    fn begin(&mut self) -> Result<Checkpoint, RegistryError> {
        if self.depth >= self.config.max_call_depth {
            return Err(RegistryError::ExecutionRejected(format!(
                "call depth limit {} reached",
                self.config.max_call_depth
            )));
        }
        self.depth += 1;
        Ok(Checkpoint {
            journal_len: self.journal.len(),
            events_len: self.events.len(),
        })
    }

    fn finish<T>(
        &mut self,
        checkpoint: Checkpoint,
        result: Result<T, RegistryError>,
    ) -> Result<T, RegistryError> {
        match &result {
            Ok(_) if self.depth == 1 => self.journal.commit(),
            Ok(_) => {}
            Err(_) => self.revert_to(checkpoint),
        }
        self.depth -= 1;
        result
    }

    fn revert_to(&mut self, checkpoint: Checkpoint) {
        for entry in self.journal.unwind_to(checkpoint.journal_len) {
            self.undo(entry);
        }
        self.events.truncate(checkpoint.events_len);
    }

    fn undo(&mut self, entry: JournalEntry) {
        match entry {
            JournalEntry::ParcelCreated { parcel_id } => {
                self.store.remove(parcel_id);
            }
            JournalEntry::ParcelUpdated { previous } => self.store.restore(previous),
            JournalEntry::CounterAdvanced { previous } => self.store.set_next_id(previous),
            JournalEntry::OwnershipMinted { parcel_id } => self.ownership.discard(parcel_id),
            JournalEntry::OwnershipTransferred { parcel_id, from } => {
                self.ownership.reassign(parcel_id, from);
            }
        }
    }

    // =========================================================================
    // JOURNALED MUTATIONS
    // =========================================================================

    fn create_parcel(&mut self, parcel: Parcel) -> Result<(), RegistryError> {
        let parcel_id = parcel.id;
        self.store.insert(parcel)?;
        self.journal.record(JournalEntry::ParcelCreated { parcel_id });
        Ok(())
    }

    fn write_parcel(&mut self, parcel: Parcel) -> Result<(), RegistryError> {
        let previous = self
            .store
            .get(parcel.id)
            .ok_or(StoreError::NotFound(parcel.id))?;
        self.store.update(parcel)?;
        self.journal.record(JournalEntry::ParcelUpdated { previous });
        Ok(())
    }

    fn advance_counter(&mut self, next_id: u64) {
        let previous = self.store.next_id();
        self.store.set_next_id(next_id);
        self.journal.record(JournalEntry::CounterAdvanced { previous });
    }

    fn mint_ownership(
        &mut self,
        parcel_id: ParcelId,
        owner: Address,
        token_uri: String,
    ) -> Result<(), RegistryError> {
        self.ownership.mint(parcel_id, owner, token_uri)?;
        self.journal.record(JournalEntry::OwnershipMinted { parcel_id });
        Ok(())
    }

    fn transfer_ownership(
        &mut self,
        parcel_id: ParcelId,
        from: Address,
        to: Address,
    ) -> Result<(), RegistryError> {
        self.ownership.transfer(parcel_id, from, to)?;
        self.journal
            .record(JournalEntry::OwnershipTransferred { parcel_id, from });
        Ok(())
    }

    // =========================================================================
    // REGISTER
    // =========================================================================

    fn validate_registration(&self, location: &str, token_uri: &str) -> Result<(), RegistryError> {
        if location.trim().is_empty() {
            return Err(RegistryError::ExecutionRejected(
                "location must not be empty".to_string(),
            ));
        }
        if location.len() > self.config.max_location_len {
            return Err(RegistryError::ExecutionRejected(format!(
                "location is {} bytes, limit is {}",
                location.len(),
                self.config.max_location_len
            )));
        }
        if token_uri.len() > self.config.max_token_uri_len {
            return Err(RegistryError::ExecutionRejected(format!(
                "token URI is {} bytes, limit is {}",
                token_uri.len(),
                self.config.max_token_uri_len
            )));
        }
        Ok(())
    }

    fn apply_register(
        &mut self,
        ctx: &CallContext,
        location: &str,
        price: U256,
        token_uri: &str,
    ) -> Result<ParcelId, RegistryError> {
        let parcel_id = ParcelId(self.store.next_id());
        let next = parcel_id.next().ok_or_else(|| {
            RegistryError::ExecutionRejected("parcel id space exhausted".to_string())
        })?;

        self.create_parcel(Parcel::listed(parcel_id, location, price, ctx.caller))?;
        self.mint_ownership(parcel_id, ctx.caller, token_uri.to_string())?;
        self.advance_counter(next.get());

        self.events.push(RegistryEvent::OwnershipTransferred {
            parcel_id,
            from: None,
            to: ctx.caller,
        });
        self.events.push(RegistryEvent::ParcelRegistered {
            parcel_id,
            owner: ctx.caller,
            location: location.to_string(),
            price,
            token_uri: token_uri.to_string(),
        });

        debug!(%parcel_id, owner = %ctx.caller, %price, "Parcel registered");
        Ok(parcel_id)
    }

    // =========================================================================
    // BUY
    // =========================================================================

    /// Preconditions in their fixed order. Reads only.
    fn check_purchase(
        &self,
        ctx: &CallContext,
        parcel_id: ParcelId,
    ) -> Result<(Parcel, Address), RegistryError> {
        let parcel = self
            .store
            .get(parcel_id)
            .filter(|p| p.is_for_sale)
            .ok_or(RegistryError::NotForSale { parcel_id })?;

        if ctx.value < parcel.price {
            return Err(RegistryError::InsufficientFunds {
                required: parcel.price,
                provided: ctx.value,
            });
        }

        let owner = self.ownership.owner_of(parcel_id).ok_or_else(|| {
            RegistryError::ExecutionRejected(format!("parcel {parcel_id} has no owner"))
        })?;
        if owner == ctx.caller {
            return Err(RegistryError::AlreadyOwner { parcel_id });
        }

        Ok((parcel, owner))
    }

    fn apply_purchase(
        &mut self,
        ctx: &CallContext,
        parcel: Parcel,
        previous_owner: Address,
        payments: &mut dyn PaymentChannel,
    ) -> Result<PurchaseReceipt, RegistryError> {
        let parcel_id = parcel.id;
        let receipt = PurchaseReceipt {
            parcel_id,
            seller: previous_owner,
            buyer: ctx.caller,
            price: parcel.price,
            paid: ctx.value,
        };

        self.transfer_ownership(parcel_id, previous_owner, ctx.caller)?;
        self.write_parcel(parcel.sold_to(ctx.caller))?;
        self.events.push(RegistryEvent::OwnershipTransferred {
            parcel_id,
            from: Some(previous_owner),
            to: ctx.caller,
        });
        self.events.push(RegistryEvent::ParcelSold {
            parcel_id,
            seller: previous_owner,
            buyer: ctx.caller,
            price: receipt.price,
            paid: receipt.paid,
        });

        // External call last: the counterparty may re-enter.
        payments
            .send(self, ctx.caller, previous_owner, ctx.value)
            .map_err(|e| RegistryError::PaymentTransferFailed {
                parcel_id,
                reason: e.to_string(),
            })?;

        debug!(%parcel_id, seller = %previous_owner, buyer = %ctx.caller, paid = %ctx.value, "Parcel sold");
        Ok(receipt)
    }
}

// =============================================================================
// INBOUND PORT
// =============================================================================

impl<S: ParcelStore, O: OwnershipRegistry> LandRegistryApi for RegistryEngine<S, O> {
    fn register(
        &mut self,
        ctx: &CallContext,
        location: &str,
        price: U256,
        token_uri: &str,
    ) -> Result<ParcelId, RegistryError> {
        self.validate_registration(location, token_uri)?;
        let checkpoint = self.begin()?;
        let result = self.apply_register(ctx, location, price, token_uri);
        self.finish(checkpoint, result)
    }

    fn buy(
        &mut self,
        ctx: &CallContext,
        parcel_id: ParcelId,
        payments: &mut dyn PaymentChannel,
    ) -> Result<PurchaseReceipt, RegistryError> {
        let (parcel, previous_owner) = self.check_purchase(ctx, parcel_id)?;
        let checkpoint = self.begin()?;
        let savepoint = payments.savepoint();
        let result = self.apply_purchase(ctx, parcel, previous_owner, payments);
        if let Err(e) = &result {
            payments.rollback_to(savepoint);
            warn!(%parcel_id, buyer = %ctx.caller, error = %e, "Purchase rolled back");
        }
        self.finish(checkpoint, result)
    }

    fn list_all(&self) -> Vec<Parcel> {
        self.store.all()
    }

    fn parcel(&self, parcel_id: ParcelId) -> Result<Parcel, RegistryError> {
        self.store
            .get(parcel_id)
            .ok_or(RegistryError::UnknownParcel { parcel_id })
    }

    fn owner_of(&self, parcel_id: ParcelId) -> Result<Address, RegistryError> {
        self.ownership
            .owner_of(parcel_id)
            .ok_or(RegistryError::UnknownParcel { parcel_id })
    }

    fn token_uri(&self, parcel_id: ParcelId) -> Result<String, RegistryError> {
        self.ownership
            .token_uri(parcel_id)
            .ok_or(RegistryError::UnknownParcel { parcel_id })
    }

    fn balance_of(&self, owner: Address) -> u64 {
        self.ownership.balance_of(owner)
    }

    fn parcels_owned_by(&self, owner: Address) -> Vec<Parcel> {
        self.ownership
            .tokens_of(owner)
            .into_iter()
            .filter_map(|id| self.store.get(id))
            .collect()
    }

    fn parcel_count(&self) -> u64 {
        self.store.next_id()
    }
}

// =============================================================================
// TESTS
// =============================================================================
