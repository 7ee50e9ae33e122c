//! # Adapters Layer (Outer Hexagon)
//!
//! Adapters connect the land ledger to storage, settlement and event
//! delivery. All adapters here are in-memory; a durable backend implements
//! the same ports.

pub mod event_sink;
pub mod ownership;
pub mod parcel_store;
pub mod payments;

pub use event_sink::*;
pub use ownership::*;
pub use parcel_store::*;
pub use payments::*;
