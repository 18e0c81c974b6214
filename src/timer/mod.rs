//! Timer Module
//!
//! Clock and deferred-callback facility the store schedules expirations on.
//!
//! # Services
//! - `TokioTimer`: one tokio task per timer, cancelled by aborting it
//! - `ManualTimer`: time only moves when told to, for deterministic tests

mod manual;
mod tokio_timer;

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub use manual::ManualTimer;
pub use tokio_timer::TokioTimer;

/// Absolute point in time, Unix milliseconds.
pub type Timestamp = u64;

/// Callback run once when a timer fires.
pub type TimerTask = Box<dyn FnOnce() + Send + 'static>;

// == Timer Service ==
/// Supplies the current time and schedules deferred callbacks.
pub trait TimerService: Send + Sync + 'static {
    /// Current time used for every expiration comparison.
    fn now(&self) -> Timestamp;

    /// Runs `task` once `delay` has elapsed, unless the returned handle is
    /// cancelled first.
    ///
    /// Called with the store's map locked: implementations must hand `task`
    /// to another execution context and never run it inline, even when
    /// `delay` is zero.
    fn schedule(&self, delay: Duration, task: TimerTask) -> TimerHandle;
}

// == Timer Handle ==
/// Owned handle to one pending callback.
///
/// Dropping the handle does not cancel the callback; call [`TimerHandle::cancel`].
pub struct TimerHandle {
    cancel: Box<dyn FnOnce() + Send + 'static>,
}

impl TimerHandle {
    /// Wraps the service-specific cancellation routine.
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Box::new(cancel),
        }
    }

    /// Cancels the pending callback. A no-op if it already ran.
    ///
    /// Must not wait for a callback that is already running: that callback
    /// may be blocked on the store which is cancelling it.
    pub fn cancel(self) {
        (self.cancel)()
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TimerHandle")
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
///
/// A clock set before the epoch reads as 0 rather than failing.
pub fn current_timestamp_ms() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as Timestamp)
        .unwrap_or(0)
}

/// Converts a delay to whole milliseconds, saturating at `Timestamp::MAX`.
pub(crate) fn duration_ms(delay: Duration) -> Timestamp {
    Timestamp::try_from(delay.as_millis()).unwrap_or(Timestamp::MAX)
}
