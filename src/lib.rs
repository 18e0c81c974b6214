//! TTL Store - An embeddable expiring key-value store
//!
//! Every entry carries its own deadline, the store enforces an optional
//! maximum key count, and each state transition is published as a
//! lifecycle event (`hit`, `miss`, `set`, `del`, `expired`, `drop`).

pub mod cache;
pub mod config;
pub mod error;
pub mod events;
pub mod timer;

pub use cache::{SetOutcome, StoreStats, TtlStore};
pub use config::Config;
pub use error::{Result, StoreError};
pub use events::{Event, EventKind, SubscriptionId};
pub use timer::{ManualTimer, TimerService, TokioTimer};
