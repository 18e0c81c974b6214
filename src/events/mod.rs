//! Events Module
//!
//! Lifecycle notifications (`hit`, `miss`, `expired`, `drop`, `set`, `del`)
//! and the bus that delivers them to subscribers.

mod event;
mod notifier;

pub use event::{Event, EventKind};
pub use notifier::{Handler, Notifier, SubscriptionId};
