//! Manual Timer Service
//!
//! A fake clock whose time only moves through [`ManualTimer::advance`].

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::{duration_ms, TimerHandle, TimerService, TimerTask, Timestamp};

#[derive(Default)]
struct ManualState {
    now: Timestamp,
    next_seq: u64,
    /// Pending callbacks keyed by (deadline, scheduling order)
    pending: BTreeMap<(Timestamp, u64), TimerTask>,
}

/// Deterministic timer service for tests and simulations.
///
/// Cloning yields another handle onto the same clock.
#[derive(Clone, Default)]
pub struct ManualTimer {
    state: Arc<Mutex<ManualState>>,
}

impl ManualTimer {
    /// Creates a clock that starts at Unix time 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a clock that starts at `start`.
    pub fn starting_at(start: Timestamp) -> Self {
        let timer = Self::default();
        timer.state.lock().now = start;
        timer
    }

    /// Moves time forward and runs every callback that became due, in
    /// deadline order. Callbacks run without the clock locked, so they may
    /// schedule or cancel timers themselves.
    ///
    /// Returns the number of callbacks run.
    pub fn advance(&self, by: Duration) -> usize {
        let target = {
            let mut state = self.state.lock();
            state.now.saturating_add(duration_ms(by))
        };

        let mut fired = 0;
        loop {
            let task = {
                let mut state = self.state.lock();
                match state.pending.first_key_value() {
                    Some((&(deadline, _), _)) if deadline <= target => {
                        state.now = state.now.max(deadline);
                        state.pending.pop_first().map(|(_, task)| task)
                    }
                    _ => {
                        state.now = target;
                        None
                    }
                }
            };

            match task {
                Some(task) => {
                    task();
                    fired += 1;
                }
                None => return fired,
            }
        }
    }

    /// Number of callbacks still scheduled.
    pub fn pending(&self) -> usize {
        self.state.lock().pending.len()
    }
}

impl TimerService for ManualTimer {
    fn now(&self) -> Timestamp {
        self.state.lock().now
    }

    fn schedule(&self, delay: Duration, task: TimerTask) -> TimerHandle {
        let slot = {
            let mut state = self.state.lock();
            let deadline = state.now.saturating_add(duration_ms(delay));
            let seq = state.next_seq;
            state.next_seq += 1;
            state.pending.insert((deadline, seq), task);
            (deadline, seq)
        };

        let state = Arc::downgrade(&self.state);
        TimerHandle::new(move || {
            if let Some(state) = state.upgrade() {
                state.lock().pending.remove(&slot);
            }
        })
    }
}

impl std::fmt::Debug for ManualTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ManualTimer")
            .field("now", &state.now)
            .field("pending", &state.pending.len())
            .finish()
    }
}
