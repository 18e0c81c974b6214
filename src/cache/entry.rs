//! Cache Entry Module
//!
//! Defines the structure for individual entries with their expiration timer.

use crate::timer::{TimerHandle, Timestamp};

// == Entry ==
/// A stored value plus its expiration metadata.
#[derive(Debug)]
pub struct Entry<V> {
    /// The stored value
    pub value: V,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: Timestamp,
    /// Unique per installed entry; a timer only removes the entry it was
    /// scheduled for
    pub id: u64,
    /// Pending expiration callback, taken when the entry is removed
    timer: Option<TimerHandle>,
}

impl<V> Entry<V> {
    // == Constructor ==
    pub fn new(value: V, expires_at: Timestamp, id: u64, timer: TimerHandle) -> Self {
        Self {
            value,
            expires_at,
            id,
            timer: Some(timer),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// Boundary condition: an entry is expired once `now >= expires_at`, so
    /// a zero TTL is already expired at the instant it was set.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, `0` once expired.
    pub fn ttl_remaining_ms(&self, now: Timestamp) -> u64 {
        self.expires_at.saturating_sub(now)
    }

    // == Cancel Timer ==
    /// Cancels the pending expiration callback and hands back the value.
    pub fn into_cancelled(mut self) -> (V, Timestamp) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
        (self.value, self.expires_at)
    }

    /// Releases the entry after its own timer fired; nothing left to cancel.
    pub fn into_fired(self) -> (V, Timestamp) {
        (self.value, self.expires_at)
    }
}
