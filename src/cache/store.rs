//! Cache Store Module
//!
//! Expiring key-value store: a key-to-entry map with per-entry expiration
//! timers, lazy expiration on read, capacity-based admission and lifecycle
//! events.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, ReentrantMutex};
use serde::Serialize;
use tracing::debug;

use crate::cache::{Entry, InsertionOrder, StoreStats};
use crate::config::Config;
use crate::error::Result;
use crate::events::{Event, EventKind, Notifier, SubscriptionId};
use crate::timer::{duration_ms, TimerService, Timestamp, TokioTimer};

// == Set Outcome ==
/// What a `set` did. The same information is published as events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SetOutcome {
    /// The entry was installed (`set` published)
    Stored,
    /// The key was new and the store was full (`drop` published)
    Dropped,
    /// The value was absent; nothing happened
    Skipped,
}

// == Entry Snapshot ==
/// Read-only view of one live entry.
#[derive(Debug, Clone, Serialize)]
pub struct EntrySnapshot<V> {
    pub key: String,
    pub value: V,
    pub expires_at: DateTime<Utc>,
    pub expires_in_ms: u64,
}

struct Inner<V> {
    entries: HashMap<String, Entry<V>>,
    order: InsertionOrder,
    stats: StoreStats,
    default_ttl: Duration,
    capacity: usize,
    next_id: u64,
}

impl<V> Inner<V> {
    /// Single removal routine shared by delete, clear, lazy and timed expiry.
    fn remove(&mut self, key: &str) -> Option<Entry<V>> {
        let entry = self.entries.remove(key)?;
        self.order.remove(key);
        self.stats.record_deletion();
        Some(entry)
    }
}

struct Shared<V> {
    /// Held from a mutation through the publication of its events, so
    /// events from different threads never interleave. Reentrant so a
    /// subscriber may call back into the store on the same thread.
    /// Always taken before `inner`.
    gate: ReentrantMutex<()>,
    inner: Mutex<Inner<V>>,
    notifier: Notifier<V>,
    timer: Arc<dyn TimerService>,
}

impl<V> Drop for Shared<V> {
    fn drop(&mut self) {
        let inner = self.inner.get_mut();
        for (_, entry) in inner.entries.drain() {
            entry.into_cancelled();
        }
    }
}

enum Lookup<V> {
    Missing,
    Expired,
    Live(V, Timestamp),
}

// == TTL Store ==
/// In-memory key-value store where every entry expires on its own deadline.
///
/// The handle is cheap to clone; clones share one store. Dropping the last
/// handle cancels every pending expiration timer.
///
/// Events are published after the map has been updated and its lock
/// released, so subscribers may call back into the store and will observe
/// the post-mutation state. Each operation holds a store-wide gate from its
/// mutation until its last event is delivered, so the event stream seen by
/// subscribers follows the order in which mutations were applied, including
/// those made by timer callbacks on other threads. A subscriber that blocks
/// on another thread which is itself using the store will deadlock.
pub struct TtlStore<V> {
    shared: Arc<Shared<V>>,
}

impl<V> Clone for TtlStore<V> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<V> TtlStore<V>
where
    V: Clone + Send + 'static,
{
    // == Constructors ==
    /// Creates a store whose timers run on the current tokio runtime.
    ///
    /// Fails with `StoreError::NoRuntime` outside of a runtime.
    pub fn new(default_ttl: Duration) -> Result<Self> {
        Ok(Self::with_timer(default_ttl, Arc::new(TokioTimer::current()?)))
    }

    /// Creates a store driven by the given clock and timer facility.
    pub fn with_timer(default_ttl: Duration, timer: Arc<dyn TimerService>) -> Self {
        Self {
            shared: Arc::new(Shared {
                gate: ReentrantMutex::new(()),
                inner: Mutex::new(Inner {
                    entries: HashMap::new(),
                    order: InsertionOrder::new(),
                    stats: StoreStats::new(),
                    default_ttl,
                    capacity: usize::MAX,
                    next_id: 0,
                }),
                notifier: Notifier::new(),
                timer,
            }),
        }
    }

    /// Creates a tokio-backed store with the configured TTL and capacity.
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = Self::new(config.default_ttl())?;
        store.set_capacity(config.capacity);
        Ok(store)
    }

    // == Get ==
    /// Returns the value for `key` if it is live.
    ///
    /// Publishes `hit` on success. An entry found past its deadline is
    /// removed first (`del`), then `miss` is published as for an absent key.
    pub fn get(&self, key: &str) -> Option<V> {
        let _gate = self.shared.gate.lock();
        let now = self.shared.timer.now();
        let mut inner = self.shared.inner.lock();

        let lookup = match inner.entries.get(key) {
            None => Lookup::Missing,
            Some(entry) if entry.is_expired_at(now) => Lookup::Expired,
            Some(entry) => Lookup::Live(entry.value.clone(), entry.expires_at),
        };

        match lookup {
            Lookup::Live(value, expires_at) => {
                inner.stats.record_hit();
                drop(inner);
                self.publish(Event::hit(key, value.clone(), expires_at));
                Some(value)
            }
            Lookup::Missing => {
                inner.stats.record_miss();
                drop(inner);
                self.publish(Event::miss(key));
                None
            }
            Lookup::Expired => {
                inner.stats.record_miss();
                let removed = inner.remove(key);
                drop(inner);
                if let Some(entry) = removed {
                    debug!(key, "Removed expired entry on read");
                    let (value, expires_at) = entry.into_cancelled();
                    self.publish(Event::del(key, value, expires_at));
                }
                self.publish(Event::miss(key));
                None
            }
        }
    }

    // == Has ==
    /// Checks whether `key` holds a live entry.
    ///
    /// Validates the deadline like `get`, but never removes anything and
    /// publishes no events.
    pub fn has(&self, key: &str) -> bool {
        let now = self.shared.timer.now();
        self.shared
            .inner
            .lock()
            .entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired_at(now))
    }

    // == Set ==
    /// Stores `value` under `key` with the default TTL.
    ///
    /// Passing `None` is a silent no-op. A new key arriving while the store
    /// is at capacity is rejected with a `drop` event; existing keys are
    /// never evicted. Replacing a key cancels the old entry's timer and
    /// publishes only `set`, not a `del` for the displaced value.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Option<V>>) -> SetOutcome {
        self.insert(key.into(), value.into(), None)
    }

    /// Stores `value` under `key`, expiring after `ttl`.
    ///
    /// A zero TTL is legal: the entry is installed and its timer fires on the
    /// next scheduler tick.
    pub fn set_with_ttl(
        &self,
        key: impl Into<String>,
        value: impl Into<Option<V>>,
        ttl: Duration,
    ) -> SetOutcome {
        self.insert(key.into(), value.into(), Some(ttl))
    }

    // == Multi Set ==
    /// Applies `set` to each item in order. A rejected item does not stop
    /// the ones after it.
    pub fn mset<I, K, T>(&self, items: I) -> Vec<SetOutcome>
    where
        I: IntoIterator<Item = (K, T, Option<Duration>)>,
        K: Into<String>,
        T: Into<Option<V>>,
    {
        items
            .into_iter()
            .map(|(key, value, ttl)| self.insert(key.into(), value.into(), ttl))
            .collect()
    }

    fn insert(&self, key: String, value: Option<V>, ttl: Option<Duration>) -> SetOutcome {
        let Some(value) = value else {
            debug!(key = %key, "Ignoring set with absent value");
            return SetOutcome::Skipped;
        };

        let _gate = self.shared.gate.lock();
        let mut inner = self.shared.inner.lock();

        if !inner.entries.contains_key(&key) && inner.entries.len() >= inner.capacity {
            inner.stats.record_drop();
            let capacity = inner.capacity;
            drop(inner);
            debug!(key = %key, capacity, "Store full, dropping new key");
            self.publish(Event::drop(&key, value));
            return SetOutcome::Dropped;
        }

        let previous = inner.entries.remove(&key);

        let ttl = ttl.unwrap_or(inner.default_ttl);
        let expires_at = self.shared.timer.now().saturating_add(duration_ms(ttl));
        let id = inner.next_id;
        inner.next_id += 1;

        let weak = Arc::downgrade(&self.shared);
        let timer_key = key.clone();
        let handle = self.shared.timer.schedule(
            ttl,
            Box::new(move || expire(&weak, &timer_key, id)),
        );

        inner
            .entries
            .insert(key.clone(), Entry::new(value.clone(), expires_at, id, handle));
        inner.order.push(&key);
        drop(inner);

        if let Some(previous) = previous {
            previous.into_cancelled();
        }

        debug!(key = %key, expires_at, "Stored entry");
        self.publish(Event::set(&key, value, expires_at));
        SetOutcome::Stored
    }

    // == Delete ==
    /// Removes `key`, returning its value. Publishes `del` if it existed.
    pub fn delete(&self, key: &str) -> Option<V> {
        let _gate = self.shared.gate.lock();
        let removed = self.shared.inner.lock().remove(key);
        let (value, expires_at) = removed?.into_cancelled();
        debug!(key, "Deleted entry");
        self.publish(Event::del(key, value.clone(), expires_at));
        Some(value)
    }

    // == Clear ==
    /// Deletes every key present at call time, one `del` event per key.
    pub fn clear(&self) {
        for key in self.keys() {
            self.delete(&key);
        }
    }

    // == Purge Expired ==
    /// Removes every entry already past its deadline whose timer has not run
    /// yet. Each removal publishes `del`.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&self) -> usize {
        let _gate = self.shared.gate.lock();
        let now = self.shared.timer.now();
        let removed: Vec<(String, Entry<V>)> = {
            let mut inner = self.shared.inner.lock();
            let expired: Vec<String> = inner
                .order
                .iter()
                .filter(|key| {
                    inner
                        .entries
                        .get(key.as_str())
                        .is_some_and(|entry| entry.is_expired_at(now))
                })
                .cloned()
                .collect();

            expired
                .into_iter()
                .filter_map(|key| inner.remove(&key).map(|entry| (key, entry)))
                .collect()
        };

        let count = removed.len();
        for (key, entry) in removed {
            let (value, expires_at) = entry.into_cancelled();
            self.publish(Event::del(&key, value, expires_at));
        }

        if count > 0 {
            debug!(count, "Purged expired entries");
        }
        count
    }

    // == Length ==
    /// Number of entries in the map, including ones past their deadline
    /// that nothing has removed yet.
    pub fn len(&self) -> usize {
        self.shared.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // == Capacity ==
    pub fn capacity(&self) -> usize {
        self.shared.inner.lock().capacity
    }

    /// Changes the admission limit for future inserts. Never evicts, even
    /// when the store already holds more than `capacity` keys.
    pub fn set_capacity(&self, capacity: usize) {
        self.shared.inner.lock().capacity = capacity;
    }

    pub fn default_ttl(&self) -> Duration {
        self.shared.inner.lock().default_ttl
    }

    // == Stats ==
    pub fn stats(&self) -> StoreStats {
        let inner = self.shared.inner.lock();
        let mut stats = inner.stats.clone();
        stats.set_total_entries(inner.entries.len());
        stats
    }

    // == Events ==
    /// Registers `handler` for one event kind. Handlers run synchronously,
    /// in registration order, before the triggering operation returns.
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&Event<V>) + Send + Sync + 'static,
    {
        self.shared.notifier.subscribe(kind, handler)
    }

    /// Removes a handler. Unknown or already removed ids are a no-op.
    pub fn unsubscribe(&self, kind: EventKind, id: SubscriptionId) -> bool {
        self.shared.notifier.unsubscribe(kind, id)
    }

    fn publish(&self, event: Event<V>) {
        self.shared.notifier.publish(&event);
    }

    // == Inspection ==
    /// Keys in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.shared.inner.lock().order.iter().cloned().collect()
    }

    /// Copies of every entry in insertion order. Entries past their deadline
    /// are included until something removes them.
    pub fn snapshot(&self) -> Vec<EntrySnapshot<V>> {
        let now = self.shared.timer.now();
        let inner = self.shared.inner.lock();
        inner
            .order
            .iter()
            .filter_map(|key| {
                inner.entries.get(key).map(|entry| EntrySnapshot {
                    key: key.clone(),
                    value: entry.value.clone(),
                    expires_at: to_datetime(entry.expires_at),
                    expires_in_ms: entry.ttl_remaining_ms(now),
                })
            })
            .collect()
    }

    /// Iterates over `(key, value)` pairs of a snapshot.
    pub fn iter(&self) -> impl Iterator<Item = (String, V)> {
        self.snapshot()
            .into_iter()
            .map(|snapshot| (snapshot.key, snapshot.value))
    }
}

/// Timer callback: removes the entry it was scheduled for, if it is still
/// the installed one, then publishes `expired` followed by `del`.
fn expire<V>(shared: &Weak<Shared<V>>, key: &str, id: u64)
where
    V: Clone + Send + 'static,
{
    let Some(shared) = shared.upgrade() else {
        return;
    };

    let _gate = shared.gate.lock();
    let removed = {
        let mut inner = shared.inner.lock();
        if inner.entries.get(key).map(|entry| entry.id) != Some(id) {
            return;
        }
        inner.stats.record_expiration();
        inner.remove(key)
    };

    if let Some(entry) = removed {
        debug!(key, "Entry expired");
        let (value, expires_at) = entry.into_fired();
        shared.notifier.publish(&Event::expired(key, value.clone()));
        shared.notifier.publish(&Event::del(key, value, expires_at));
    }
}

fn to_datetime(timestamp: Timestamp) -> DateTime<Utc> {
    i64::try_from(timestamp)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

impl<V> fmt::Debug for TtlStore<V>
where
    V: Clone + Send + fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TtlStore ")?;
        f.debug_list().entries(self.snapshot()).finish()
    }
}
