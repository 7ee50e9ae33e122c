//! # Ports Layer (Middle Hexagon)
//!
//! Trait definitions for the land ledger.
//! These are the interfaces between the domain and the outside world.
//!
//! - **Driving Ports (Inbound)**: `LandRegistryApi`
//! - **Driven Ports (Outbound)**: `ParcelStore`, `OwnershipRegistry`,
//!   `PaymentChannel`, `ValueEscrow`, `EventSink`
//! - No concrete implementations in this module

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
