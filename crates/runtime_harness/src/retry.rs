use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::HarnessError;

/// Source of time for retry loops.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Clock that only moves when slept on.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Mutex<Duration>,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        *self.elapsed.lock().unwrap_or_else(PoisonError::into_inner) += duration;
        self.sleeps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(duration);
    }
}

/// Fixed-delay retries bounded by a wall-clock budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub delay: Duration,
    pub budget: Duration,
}

impl RetryPolicy {
    pub const fn new(delay: Duration, budget: Duration) -> Self {
        Self { delay, budget }
    }

    /// Waiting for a new role to become assumable by Lambda.
    pub const fn role_propagation() -> Self {
        Self::new(Duration::from_secs(2), Duration::from_secs(30))
    }

    /// Waiting for a function create or configuration update to settle.
    pub const fn function_readiness() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(60))
    }
}

pub enum Attempt<T> {
    Done(T),
    Retry(String),
}

/// Runs `attempt` until it is done, fails, or the budget runs out.
///
/// The first attempt always runs, even with a zero budget. Errors returned by
/// `attempt` abort at once. `Attempt::Retry` sleeps for the policy delay and
/// tries again while the budget lasts, never sleeping past it, after which
/// `TimedOut` is returned.
pub fn retry_within<T>(
    clock: &dyn Clock,
    policy: &RetryPolicy,
    action: &str,
    mut attempt: impl FnMut() -> Result<Attempt<T>, HarnessError>,
) -> Result<T, HarnessError> {
    let started_at = clock.now();
    let deadline = started_at + policy.budget;

    let mut attempts = 0usize;
    loop {
        attempts += 1;
        let reason = match attempt()? {
            Attempt::Done(value) => return Ok(value),
            Attempt::Retry(reason) => reason,
        };
        if clock.now() + policy.delay > deadline {
            debug!(action, attempts, reason = %reason, "retry budget spent");
            break;
        }
        debug!(action, attempts, reason = %reason, delay = ?policy.delay, "retrying");
        clock.sleep(policy.delay);
        if clock.now() >= deadline {
            break;
        }
    }

    Err(HarnessError::TimedOut {
        action: action.to_string(),
        waited: clock.now().duration_since(started_at),
    })
}
