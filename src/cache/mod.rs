//! Cache Module
//!
//! Expiring key-value storage with per-entry timers and lifecycle events.

mod entry;
mod order;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::Entry;
pub use order::InsertionOrder;
pub use stats::StoreStats;
pub use store::{EntrySnapshot, SetOutcome, TtlStore};
