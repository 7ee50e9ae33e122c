//! # Event Sink Adapters
//!
//! - `InMemoryEventLog`: keeps every committed event, for tests and replay.
//! - `TracingEventSink`: writes each event as a structured log line.

use crate::events::RegistryEvent;
use crate::ports::outbound::EventSink;
use parking_lot::RwLock;
use tracing::info;

/// Collects committed events in delivery order.
#[derive(Debug, Default)]
pub struct InMemoryEventLog {
    events: RwLock<Vec<RegistryEvent>>,
}

impl InMemoryEventLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every event delivered so far.
    #[must_use]
    pub fn events(&self) -> Vec<RegistryEvent> {
        self.events.read().clone()
    }

    /// Number of delivered events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// True when nothing has been delivered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}

impl EventSink for InMemoryEventLog {
    fn publish(&self, event: &RegistryEvent) {
        self.events.write().push(event.clone());
    }
}

/// Logs events through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn publish(&self, event: &RegistryEvent) {
        match serde_json::to_string(event) {
            Ok(payload) => info!(
                topic = event.topic(),
                parcel_id = event.parcel_id().get(),
                %payload,
                "Registry event"
            ),
            Err(e) => info!(
                topic = event.topic(),
                parcel_id = event.parcel_id().get(),
                error = %e,
                "Registry event (unserializable payload)"
            ),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
