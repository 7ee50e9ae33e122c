//! # Land Registry Node
//!
//! Command-line host for the land registry.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `scenario` | JSON scenarios and their replay against the service |
//! | `telemetry` | Tracing subscriber setup |

pub mod scenario;
pub mod telemetry;
