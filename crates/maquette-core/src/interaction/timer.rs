//! Scheduler abstraction for the keyboard auto-repeat timer.
//!
//! The engine is single-threaded and cooperative; the host environment owns
//! the event loop and decides when scheduled callbacks actually fire. The
//! controller only holds the cancel token and cancels it on every state
//! exit, so a repeat can never outlive its gesture.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

/// Cancellation handle for a scheduled repeat. Cancelling is idempotent.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

/// Repeating-callback scheduler: run `callback` once after `initial_delay`,
/// then every `interval`, until the returned token is cancelled.
pub trait Scheduler {
    fn schedule(
        &mut self,
        callback: Box<dyn FnMut()>,
        initial_delay: Duration,
        interval: Duration,
    ) -> CancelToken;
}

struct ScheduledRepeat {
    callback: Box<dyn FnMut()>,
    token: CancelToken,
    initial_delay: Duration,
    interval: Duration,
}

/// Test scheduler: records scheduled repeats and fires them on demand.
#[derive(Default)]
pub struct ManualScheduler {
    entries: Vec<ScheduledRepeat>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (not yet cancelled) repeats.
    pub fn live_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| !entry.token.is_cancelled())
            .count()
    }

    /// Delay and interval of the most recently scheduled repeat.
    pub fn last_schedule(&self) -> Option<(Duration, Duration)> {
        self.entries
            .last()
            .map(|entry| (entry.initial_delay, entry.interval))
    }

    /// Fire one tick of every live repeat, then drop cancelled entries.
    pub fn tick(&mut self) {
        for entry in &mut self.entries {
            if !entry.token.is_cancelled() {
                (entry.callback)();
            }
        }
        self.entries.retain(|entry| !entry.token.is_cancelled());
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(
        &mut self,
        callback: Box<dyn FnMut()>,
        initial_delay: Duration,
        interval: Duration,
    ) -> CancelToken {
        let token = CancelToken::new();
        self.entries.push(ScheduledRepeat {
            callback,
            token: token.clone(),
            initial_delay,
            interval,
        });
        token
    }
}
