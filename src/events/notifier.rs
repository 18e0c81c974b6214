//! Notifier Module
//!
//! Typed publish/subscribe bus for store lifecycle events.

use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::warn;

use super::{Event, EventKind};

/// Subscriber callback invoked for every published event of its kind.
pub type Handler<V> = Arc<dyn Fn(&Event<V>) + Send + Sync + 'static>;

/// Identity of a registered subscriber, used to unsubscribe it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

// == Notifier ==
/// Per-kind ordered subscriber lists.
///
/// Dispatch works on a snapshot of the list, so handlers may subscribe or
/// unsubscribe while an event is being delivered; changes apply to the next
/// publish.
pub struct Notifier<V> {
    subscribers: RwLock<HashMap<EventKind, Vec<(SubscriptionId, Handler<V>)>>>,
    next_id: AtomicU64,
}

impl<V> Notifier<V> {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    // == Subscribe ==
    /// Registers `handler` for `kind`. Handlers of one kind run in
    /// registration order.
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&Event<V>) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers
            .write()
            .entry(kind)
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    // == Unsubscribe ==
    /// Removes a subscriber. Returns `false` if it was not registered for
    /// `kind`, including when it was already removed.
    pub fn unsubscribe(&self, kind: EventKind, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        let Some(list) = subscribers.get_mut(&kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|(sub, _)| *sub != id);
        before != list.len()
    }

    // == Publish ==
    /// Delivers `event` to every subscriber of its kind.
    ///
    /// A panicking handler is logged and skipped; the remaining handlers
    /// still run and the panic never reaches the caller.
    pub fn publish(&self, event: &Event<V>) {
        let handlers: Vec<Handler<V>> = match self.subscribers.read().get(&event.kind) {
            Some(list) => list.iter().map(|(_, handler)| handler.clone()).collect(),
            None => return,
        };

        for handler in handlers {
            if catch_unwind(AssertUnwindSafe(|| handler(event))).is_err() {
                warn!(kind = %event.kind, key = %event.key, "Event subscriber panicked");
            }
        }
    }

    /// Number of subscribers registered for `kind`.
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscribers.read().get(&kind).map_or(0, Vec::len)
    }
}

impl<V> Default for Notifier<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for Notifier<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<EventKind, usize> = self
            .subscribers
            .read()
            .iter()
            .map(|(kind, list)| (*kind, list.len()))
            .collect();
        f.debug_struct("Notifier").field("subscribers", &counts).finish()
    }
}
