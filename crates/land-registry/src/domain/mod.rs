//! # Domain Layer (Inner Hexagon)
//!
//! Pure business types for the land ledger.
//! NO I/O, NO async, NO external dependencies.
//!
//! - This is the **inner layer** of the hexagonal architecture.
//! - Dependencies point INWARD only (adapters depend on this, not vice versa).

pub mod entities;
pub mod invariants;
pub mod journal;
pub mod value_objects;

pub use entities::*;
pub use invariants::*;
pub use journal::*;
pub use value_objects::*;
