//! Tokio Timer Service
//!
//! Schedules each expiration as its own sleeping task on a tokio runtime.

use std::time::Duration;

use tokio::runtime::Handle;
use tracing::debug;

use super::{current_timestamp_ms, TimerHandle, TimerService, TimerTask, Timestamp};
use crate::error::Result;

/// Timer service backed by the tokio runtime it was created on.
///
/// Callbacks run on the runtime's worker threads, so the store they touch
/// must be shareable across threads.
#[derive(Debug, Clone)]
pub struct TokioTimer {
    runtime: Handle,
}

impl TokioTimer {
    /// Binds to the runtime of the calling context.
    ///
    /// Fails with `StoreError::NoRuntime` outside of a tokio runtime.
    pub fn current() -> Result<Self> {
        Ok(Self::with_handle(Handle::try_current()?))
    }

    /// Binds to an explicit runtime handle.
    pub fn with_handle(runtime: Handle) -> Self {
        Self { runtime }
    }
}

impl TimerService for TokioTimer {
    fn now(&self) -> Timestamp {
        current_timestamp_ms()
    }

    fn schedule(&self, delay: Duration, task: TimerTask) -> TimerHandle {
        let join = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });

        TimerHandle::new(move || {
            if !join.is_finished() {
                debug!("Aborting pending expiration timer");
            }
            join.abort();
        })
    }
}
