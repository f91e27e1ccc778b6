#![forbid(unsafe_code)]

//! Tick-driven one-shot countdowns.
//!
//! Widgets never read the wall clock. Anything time-delayed — a fetch
//! debounce, a deferred clear after focus loss, a settle delay before
//! reconciling a batch of markup edits — is a [`Countdown`] advanced by the
//! host through `tick(dt)`, which keeps the state machines deterministic
//! under test.

use std::time::Duration;

/// A one-shot countdown timer.
///
/// Starts idle. [`Countdown::start`] arms it (restarting replaces any
/// pending deadline), [`Countdown::tick`] advances it and reports expiry
/// exactly once, [`Countdown::cancel`] disarms it without firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Countdown {
    remaining: Option<Duration>,
}

impl Countdown {
    /// Create an idle countdown.
    #[must_use]
    pub const fn idle() -> Self {
        Self { remaining: None }
    }

    /// Arm the countdown to fire after `duration`.
    ///
    /// A zero duration fires on the next tick. Restarting a running
    /// countdown replaces its deadline.
    pub fn start(&mut self, duration: Duration) {
        self.remaining = Some(duration);
    }

    /// Disarm without firing. No-op when idle.
    pub fn cancel(&mut self) {
        self.remaining = None;
    }

    /// Whether the countdown is armed.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.remaining.is_some()
    }

    /// Advance by `dt`. Returns `true` exactly once, on the tick where the
    /// deadline is reached; the countdown is idle afterwards.
    pub fn tick(&mut self, dt: Duration) -> bool {
        match self.remaining {
            None => false,
            Some(remaining) => {
                if dt >= remaining {
                    self.remaining = None;
                    true
                } else {
                    self.remaining = Some(remaining - dt);
                    false
                }
            }
        }
    }
}
