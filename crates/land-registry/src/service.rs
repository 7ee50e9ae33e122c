//! # Land Registry Service
//!
//! Async front of the registry engine. Serializes mutating calls, lets reads
//! run concurrently, escrows attached value and delivers committed events.
//!
//! ## Call flow for `buy`
//!
//! 1. Take the ledger write lock
//! 2. `hold` the attached value from the buyer
//! 3. Run the engine's `buy` with the payment adapter as the channel
//! 4. On failure `refund` the held value; the engine has already rolled back
//! 5. Publish committed events to the sink, update statistics

use crate::adapters::{InMemoryEventLog, InMemoryOwnership, InMemoryParcelStore, InMemoryPayments};
use crate::config::ServiceConfig;
use crate::domain::entities::{CallContext, Parcel, PurchaseReceipt};
use crate::domain::invariants::InvariantCheckResult;
use crate::domain::value_objects::{Address, ParcelId, U256};
use crate::engine::RegistryEngine;
use crate::errors::{ErrorKind, RegistryError};
use crate::ports::inbound::LandRegistryApi;
use crate::ports::outbound::{EventSink, OwnershipRegistry, ParcelStore, PaymentChannel, ValueEscrow};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, field, info, instrument, warn, Span};
use uuid::Uuid;

/// Statistics for the land registry service.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStats {
    /// Successful registrations.
    pub registrations: u64,
    /// Successful purchases.
    pub purchases: u64,
    /// Failed operations, by kind.
    pub failures: BTreeMap<ErrorKind, u64>,
    /// Purchases undone because the payment failed.
    pub rollbacks: u64,
    /// Events delivered to the sink.
    pub events_published: u64,
    /// Total value forwarded to sellers.
    pub value_settled: U256,
}

impl ServiceStats {
    /// Total failed operations.
    #[must_use]
    pub fn failed_operations(&self) -> u64 {
        self.failures.values().sum()
    }
}

/// Engine plus the settlement ledger it pays through. Guarded together so a
/// purchase and its payment are one critical section.
struct Ledger<S: ParcelStore, O: OwnershipRegistry, P> {
    engine: RegistryEngine<S, O>,
    payments: P,
}

/// The land registry service.
pub struct LandRegistryService<S, O, P, E>
where
    S: ParcelStore,
    O: OwnershipRegistry,
    P: PaymentChannel + ValueEscrow,
    E: EventSink,
{
    config: ServiceConfig,
    ledger: Arc<RwLock<Ledger<S, O, P>>>,
    events: Arc<E>,
    stats: Arc<RwLock<ServiceStats>>,
}

/// Service over the in-memory adapters.
pub type InMemoryRegistryService =
    LandRegistryService<InMemoryParcelStore, InMemoryOwnership, InMemoryPayments, InMemoryEventLog>;

/// Service over empty in-memory adapters, with the engine limits from
/// `config`.
#[must_use]
pub fn create_in_memory_service(config: ServiceConfig) -> InMemoryRegistryService {
    create_in_memory_service_with_events(config, Arc::new(InMemoryEventLog::new()))
}

/// Service over empty in-memory adapters delivering events to `events`.
#[must_use]
pub fn create_in_memory_service_with_events<E: EventSink>(
    config: ServiceConfig,
    events: Arc<E>,
) -> LandRegistryService<InMemoryParcelStore, InMemoryOwnership, InMemoryPayments, E> {
    let engine = RegistryEngine::new(
        InMemoryParcelStore::new(),
        InMemoryOwnership::new(),
        config.registry.clone(),
    );
    LandRegistryService::new(engine, InMemoryPayments::new(), events, config)
}

impl<S, O, P, E> LandRegistryService<S, O, P, E>
where
    S: ParcelStore,
    O: OwnershipRegistry,
    P: PaymentChannel + ValueEscrow,
    E: EventSink,
{
    /// Create a new service.
    pub fn new(engine: RegistryEngine<S, O>, payments: P, events: Arc<E>, config: ServiceConfig) -> Self {
        Self {
            config,
            ledger: Arc::new(RwLock::new(Ledger { engine, payments })),
            events,
            stats: Arc::new(RwLock::new(ServiceStats::default())),
        }
    }

    /// Service configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// The event sink committed events are delivered to.
    pub fn events(&self) -> &Arc<E> {
        &self.events
    }

    /// Get current service statistics.
    pub async fn stats(&self) -> ServiceStats {
        self.stats.read().await.clone()
    }

    /// Register a new parcel owned by `caller` and list it for sale.
    ///
    /// # Errors
    /// - `ExecutionRejected` on malformed input or exhausted ids.
    #[instrument(skip(self, token_uri), fields(correlation_id = field::Empty))]
    pub async fn register(
        &self,
        caller: Address,
        location: &str,
        price: U256,
        token_uri: &str,
    ) -> Result<ParcelId, RegistryError> {
        let correlation_id = Uuid::new_v4();
        Span::current().record("correlation_id", field::display(correlation_id));

        let mut ledger = self.ledger.write().await;
        let result = ledger
            .engine
            .register(&CallContext::new(caller), location, price, token_uri);
        let published = self.publish_committed(&mut ledger.engine);
        drop(ledger);

        let mut stats = self.stats.write().await;
        stats.events_published += published;
        match &result {
            Ok(parcel_id) => {
                stats.registrations += 1;
                info!(%parcel_id, owner = %caller, %price, "Parcel registered");
            }
            Err(e) => {
                *stats.failures.entry(e.kind()).or_default() += 1;
                warn!(error = %e, "Registration rejected");
            }
        }
        result
    }

    /// Buy `parcel_id` for `caller`, attaching `value`.
    ///
    /// The full `value` is forwarded to the previous owner. When the call
    /// fails the held value is returned to the caller.
    ///
    /// # Errors
    /// - `ExecutionRejected` if the caller cannot fund `value`.
    /// - Any purchase error from the engine.
    #[instrument(skip(self), fields(correlation_id = field::Empty))]
    pub async fn buy(
        &self,
        caller: Address,
        parcel_id: ParcelId,
        value: U256,
    ) -> Result<PurchaseReceipt, RegistryError> {
        let correlation_id = Uuid::new_v4();
        Span::current().record("correlation_id", field::display(correlation_id));

        let mut guard = self.ledger.write().await;
        let ledger = &mut *guard;

        let result = match ledger.payments.hold(caller, value) {
            Ok(()) => {
                let ctx = CallContext::with_value(caller, value);
                let result = ledger.engine.buy(&ctx, parcel_id, &mut ledger.payments);
                if result.is_err() {
                    if let Err(e) = ledger.payments.refund(caller, value) {
                        error!(%caller, %value, error = %e, "Refund of held value failed");
                    }
                }
                result
            }
            Err(e) => Err(RegistryError::ExecutionRejected(format!(
                "cannot attach value: {e}"
            ))),
        };
        let published = self.publish_committed(&mut ledger.engine);
        drop(guard);

        let mut stats = self.stats.write().await;
        stats.events_published += published;
        match &result {
            Ok(receipt) => {
                stats.purchases += 1;
                stats.value_settled = stats.value_settled.saturating_add(receipt.paid);
                info!(
                    %parcel_id,
                    seller = %receipt.seller,
                    buyer = %receipt.buyer,
                    paid = %receipt.paid,
                    "Parcel sold"
                );
            }
            Err(e) => {
                *stats.failures.entry(e.kind()).or_default() += 1;
                if e.kind() == ErrorKind::PaymentTransferFailed {
                    stats.rollbacks += 1;
                }
                warn!(error = %e, "Purchase rejected");
            }
        }
        result
    }

    /// Snapshot of every parcel in id order.
    pub async fn list_all(&self) -> Vec<Parcel> {
        self.ledger.read().await.engine.list_all()
    }

    /// Parcel by id.
    ///
    /// # Errors
    /// - `UnknownParcel` if the id was never registered.
    pub async fn parcel(&self, parcel_id: ParcelId) -> Result<Parcel, RegistryError> {
        self.ledger.read().await.engine.parcel(parcel_id)
    }

    /// Current owner of a parcel.
    ///
    /// # Errors
    /// - `UnknownParcel` if the id was never registered.
    pub async fn owner_of(&self, parcel_id: ParcelId) -> Result<Address, RegistryError> {
        self.ledger.read().await.engine.owner_of(parcel_id)
    }

    /// Metadata URI of a parcel.
    ///
    /// # Errors
    /// - `UnknownParcel` if the id was never registered.
    pub async fn token_uri(&self, parcel_id: ParcelId) -> Result<String, RegistryError> {
        self.ledger.read().await.engine.token_uri(parcel_id)
    }

    /// Number of parcels owned by `owner`.
    pub async fn balance_of(&self, owner: Address) -> u64 {
        self.ledger.read().await.engine.balance_of(owner)
    }

    /// Parcels owned by `owner`, in id order.
    pub async fn parcels_owned_by(&self, owner: Address) -> Vec<Parcel> {
        self.ledger.read().await.engine.parcels_owned_by(owner)
    }

    /// Number of parcels ever registered.
    pub async fn parcel_count(&self) -> u64 {
        self.ledger.read().await.engine.parcel_count()
    }

    /// Audit the committed ledger.
    pub async fn verify_invariants(&self) -> InvariantCheckResult {
        self.ledger.read().await.engine.verify_invariants()
    }

    fn publish_committed(&self, engine: &mut RegistryEngine<S, O>) -> u64 {
        let events = engine.take_events();
        for event in &events {
            self.events.publish(event);
        }
        if !events.is_empty() {
            debug!(count = events.len(), "Published registry events");
        }
        events.len() as u64
    }
}

impl<S, O, E> LandRegistryService<S, O, InMemoryPayments, E>
where
    S: ParcelStore,
    O: OwnershipRegistry,
    E: EventSink,
{
    /// Credit `amount` to `account` in the settlement ledger.
    ///
    /// # Errors
    /// - `ExecutionRejected` if the balance would overflow.
    pub async fn fund(&self, account: Address, amount: U256) -> Result<(), RegistryError> {
        self.ledger
            .write()
            .await
            .payments
            .fund(account, amount)
            .map_err(|e| RegistryError::ExecutionRejected(e.to_string()))
    }

    /// Spendable settlement balance of `account`.
    pub async fn account_balance(&self, account: Address) -> U256 {
        self.ledger.read().await.payments.balance_of(account)
    }

    /// Makes every later payment to `account` fail.
    pub async fn reject_payments_to(&self, account: Address) {
        self.ledger.write().await.payments.reject_payments_to(account);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RegistryEvent;

    fn alice() -> Address {
        Address::from_label("alice")
    }

    fn bob() -> Address {
        Address::from_label("bob")
    }

    fn carol() -> Address {
        Address::from_label("carol")
    }

    async fn service_with_plot(price: u64) -> (InMemoryRegistryService, ParcelId) {
        let service = create_in_memory_service(ServiceConfig::default());
        let id = service
            .register(alice(), "Plot 1", U256::from(price), "ipfs://plot")
            .await
            .unwrap();
        (service, id)
    }

    #[tokio::test]
    async fn test_register_and_list() {
        let (service, id) = service_with_plot(100).await;

        let parcels = service.list_all().await;
        assert_eq!(parcels.len(), 1);
        assert_eq!(parcels[0].id, id);
        assert_eq!(service.owner_of(id).await.unwrap(), alice());
        assert_eq!(service.token_uri(id).await.unwrap(), "ipfs://plot");
        assert_eq!(service.stats().await.registrations, 1);
        assert_eq!(service.events().len(), 2);
    }

    #[tokio::test]
    async fn test_buy_settles_payment() {
        let (service, id) = service_with_plot(100).await;
        service.fund(bob(), U256::from(200)).await.unwrap();

        let receipt = service.buy(bob(), id, U256::from(150)).await.unwrap();
        assert_eq!(receipt.seller, alice());
        assert_eq!(service.account_balance(alice()).await, U256::from(150));
        assert_eq!(service.account_balance(bob()).await, U256::from(50));
        assert_eq!(service.owner_of(id).await.unwrap(), bob());
        assert_eq!(service.balance_of(bob()).await, 1);

        let stats = service.stats().await;
        assert_eq!(stats.purchases, 1);
        assert_eq!(stats.value_settled, U256::from(150));
        assert_eq!(stats.events_published, 4);
    }

    #[tokio::test]
    async fn test_failed_buy_refunds_value() {
        let (service, id) = service_with_plot(100).await;
        service.fund(bob(), U256::from(100)).await.unwrap();

        let err = service.buy(bob(), id, U256::from(50)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
        assert_eq!(service.account_balance(bob()).await, U256::from(100));

        let stats = service.stats().await;
        assert_eq!(stats.failed_operations(), 1);
        assert_eq!(stats.failures.get(&ErrorKind::InsufficientFunds), Some(&1));
    }

    #[tokio::test]
    async fn test_rejected_payment_rolls_back_and_refunds() {
        let (service, id) = service_with_plot(100).await;
        service.fund(bob(), U256::from(100)).await.unwrap();
        service.reject_payments_to(alice()).await;
        let before = service.list_all().await;

        let err = service.buy(bob(), id, U256::from(100)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PaymentTransferFailed);
        assert_eq!(service.list_all().await, before);
        assert_eq!(service.owner_of(id).await.unwrap(), alice());
        assert_eq!(service.account_balance(bob()).await, U256::from(100));
        assert_eq!(service.account_balance(alice()).await, U256::zero());

        let stats = service.stats().await;
        assert_eq!(stats.rollbacks, 1);
        // Only the registration's events were delivered.
        assert_eq!(service.events().len(), 2);
        assert!(service
            .events()
            .events()
            .iter()
            .all(|e| !matches!(e, RegistryEvent::ParcelSold { .. })));
    }

    #[tokio::test]
    async fn test_unfunded_buyer_rejected() {
        let (service, id) = service_with_plot(100).await;

        let err = service.buy(carol(), id, U256::from(100)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExecutionRejected);
        assert!(service.parcel(id).await.unwrap().is_for_sale);
    }

    #[tokio::test]
    async fn test_second_buyer_gets_not_for_sale() {
        let (service, id) = service_with_plot(100).await;
        service.fund(bob(), U256::from(150)).await.unwrap();
        service.fund(carol(), U256::from(200)).await.unwrap();

        service.buy(bob(), id, U256::from(150)).await.unwrap();
        let err = service.buy(carol(), id, U256::from(200)).await.unwrap_err();
        assert_eq!(err, RegistryError::NotForSale { parcel_id: id });
        assert_eq!(service.account_balance(carol()).await, U256::from(200));
        assert!(service.verify_invariants().await.is_valid());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reads_and_writes() {
        let service = Arc::new(create_in_memory_service(ServiceConfig::default()));

        let mut handles = Vec::new();
        for i in 0..8u64 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                let owner = Address::from_label(&format!("owner-{i}"));
                service
                    .register(owner, &format!("Plot {i}"), U256::from(i + 1), "")
                    .await
                    .unwrap();
                service.list_all().await.len()
            }));
        }
        for handle in handles {
            let seen = handle.await.unwrap();
            assert!((1..=8).contains(&seen));
        }

        let ids: Vec<u64> = service.list_all().await.iter().map(|p| p.id.get()).collect();
        assert_eq!(ids, (0..8).collect::<Vec<_>>());
        assert!(service.verify_invariants().await.is_valid());
    }
}
