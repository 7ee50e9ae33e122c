//! # Scenarios
//!
//! A scenario is a JSON list of steps replayed in order against a fresh
//! in-memory registry. Accounts are referred to by name; each name maps to
//! a stable address through `Address::from_label`.
//!
//! ```json
//! {
//!   "reject": ["dave"],
//!   "steps": [
//!     { "op": "fund", "account": "bob", "amount": 150 },
//!     { "op": "register", "caller": "alice", "location": "Plot 1", "price": 100 },
//!     { "op": "buy", "caller": "bob", "parcelId": 0, "value": 150 }
//!   ]
//! }
//! ```
//!
//! A failing step is recorded in the report and replay moves on.

use anyhow::{Context, Result};
use land_registry::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// One replayed operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Step {
    /// Credit an account in the settlement ledger.
    Fund { account: String, amount: u128 },
    /// Register a parcel owned by `caller`.
    Register {
        caller: String,
        location: String,
        price: u128,
        #[serde(default)]
        token_uri: String,
    },
    /// Buy a parcel for `caller`, attaching `value`.
    Buy {
        caller: String,
        parcel_id: u64,
        value: u128,
    },
}

impl Step {
    fn op(&self) -> &'static str {
        match self {
            Self::Fund { .. } => "fund",
            Self::Register { .. } => "register",
            Self::Buy { .. } => "buy",
        }
    }

    fn account(&self) -> &str {
        match self {
            Self::Fund { account, .. } => account,
            Self::Register { caller, .. } | Self::Buy { caller, .. } => caller,
        }
    }
}

/// A replayable list of steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    /// Accounts whose incoming payments always fail.
    #[serde(default)]
    pub reject: Vec<String>,
    /// Steps, replayed in order.
    pub steps: Vec<Step>,
}

impl Scenario {
    /// Parse a scenario from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("invalid scenario JSON")
    }

    /// Read and parse a scenario file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read scenario {}", path.display()))?;
        Self::from_json(&text)
    }

    /// The purchase walk-through: Alice lists, Bob buys, Carol is too late.
    #[must_use]
    pub fn demo() -> Self {
        Self {
            reject: Vec::new(),
            steps: vec![
                Step::Fund {
                    account: "bob".to_string(),
                    amount: 150,
                },
                Step::Fund {
                    account: "carol".to_string(),
                    amount: 200,
                },
                Step::Register {
                    caller: "alice".to_string(),
                    location: "Plot 1".to_string(),
                    price: 100,
                    token_uri: "ipfs://plot-1".to_string(),
                },
                Step::Buy {
                    caller: "bob".to_string(),
                    parcel_id: 0,
                    value: 150,
                },
                Step::Buy {
                    caller: "carol".to_string(),
                    parcel_id: 0,
                    value: 200,
                },
            ],
        }
    }

    /// Every account name the scenario mentions, sorted.
    #[must_use]
    pub fn account_names(&self) -> BTreeSet<String> {
        self.steps
            .iter()
            .map(|step| step.account().to_string())
            .chain(self.reject.iter().cloned())
            .collect()
    }
}

/// Result of one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOutcome {
    /// Position in the scenario.
    pub index: usize,
    /// Operation name.
    pub op: &'static str,
    /// Parcel registered or bought, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parcel_id: Option<ParcelId>,
    /// Failure kind, if the step failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
    /// Failure message, if the step failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StepOutcome {
    fn new(index: usize, op: &'static str, result: Result<Option<ParcelId>, RegistryError>) -> Self {
        match result {
            Ok(parcel_id) => Self {
                index,
                op,
                parcel_id,
                error: None,
                message: None,
            },
            Err(e) => Self {
                index,
                op,
                parcel_id: None,
                error: Some(e.kind()),
                message: Some(e.to_string()),
            },
        }
    }

    /// True when the step succeeded.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Final state after a replay.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// One entry per step.
    pub outcomes: Vec<StepOutcome>,
    /// `list_all` after the last step.
    pub parcels: Vec<Parcel>,
    /// Parcels owned per account name.
    pub holdings: BTreeMap<String, Vec<ParcelId>>,
    /// Settlement balance per account name.
    pub balances: BTreeMap<String, U256>,
    /// Service counters.
    pub stats: ServiceStats,
}

/// Replay `scenario` against an in-memory `service`, whatever its event sink.
pub async fn replay<E: EventSink>(
    service: &LandRegistryService<InMemoryParcelStore, InMemoryOwnership, InMemoryPayments, E>,
    scenario: &Scenario,
) -> Report {
    for name in &scenario.reject {
        service.reject_payments_to(Address::from_label(name)).await;
    }

    let mut outcomes = Vec::with_capacity(scenario.steps.len());
    for (index, step) in scenario.steps.iter().enumerate() {
        let result = match step {
            Step::Fund { account, amount } => service
                .fund(Address::from_label(account), U256::from(*amount))
                .await
                .map(|()| None),
            Step::Register {
                caller,
                location,
                price,
                token_uri,
            } => service
                .register(
                    Address::from_label(caller),
                    location,
                    U256::from(*price),
                    token_uri,
                )
                .await
                .map(Some),
            Step::Buy {
                caller,
                parcel_id,
                value,
            } => service
                .buy(
                    Address::from_label(caller),
                    ParcelId(*parcel_id),
                    U256::from(*value),
                )
                .await
                .map(|receipt| Some(receipt.parcel_id)),
        };
        outcomes.push(StepOutcome::new(index, step.op(), result));
    }

    let mut holdings = BTreeMap::new();
    let mut balances = BTreeMap::new();
    for name in scenario.account_names() {
        let address = Address::from_label(&name);
        let owned = service
            .parcels_owned_by(address)
            .await
            .into_iter()
            .map(|p| p.id)
            .collect();
        holdings.insert(name.clone(), owned);
        balances.insert(name, service.account_balance(address).await);
    }

    Report {
        outcomes,
        parcels: service.list_all().await,
        holdings,
        balances,
        stats: service.stats().await,
    }
}

// =============================================================================
// TESTS
// =============================================================================
