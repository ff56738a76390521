//! In-memory state for sitewatch.
//!
//! Holds the target registry and the per-target check history.

mod ledger;
mod models;
mod registry;
mod store;

pub use ledger::*;
pub use models::*;
pub use registry::*;
pub use store::*;
