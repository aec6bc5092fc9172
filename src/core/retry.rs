//! Retry/backoff policy shared by both acquirers, plus the run-scoped
//! consecutive-failure guard.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use crate::core::error::FetchErrorKind;

#[derive(Debug, Clone, PartialEq)]
pub enum RetryAction {
    /// Retry the same provider after the given delay.
    Retry(Duration),
    /// Move on to the next provider in the chain.
    Advance,
    /// No providers remain.
    GiveUp,
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub backoff_factor: f64,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// Exponential backoff: `min(base_delay * factor^attempt, max_backoff)`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let scaled = self.base_delay.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
        self.max_backoff.min(Duration::from_secs_f64(scaled))
    }

    /// Decide what to do after `attempt` failed attempts against one provider
    /// (the failure just observed is attempt number `attempt`, zero-based).
    pub fn next_action(
        &self,
        kind: FetchErrorKind,
        attempt: u32,
        provider_is_last: bool,
    ) -> RetryAction {
        if kind.is_retryable() && attempt + 1 < self.max_retries {
            return RetryAction::Retry(self.backoff_delay(attempt));
        }
        if provider_is_last {
            RetryAction::GiveUp
        } else {
            RetryAction::Advance
        }
    }
}

/// Mutable state scoped to one run, threaded through both acquirers.
///
/// Counts consecutive failed provider calls across all providers and assets;
/// past the configured limit no new calls are issued for the rest of the run.
/// Already-resolved data is kept. Atomics because acquisition for different
/// assets may run concurrently.
pub struct RunContext {
    consecutive_failures: AtomicU32,
    max_consecutive_failures: u32,
    backoff_delays: Mutex<Vec<Duration>>,
}

impl RunContext {
    pub fn new(max_consecutive_failures: u32) -> Self {
        RunContext {
            consecutive_failures: AtomicU32::new(0),
            max_consecutive_failures,
            backoff_delays: Mutex::new(Vec::new()),
        }
    }

    pub fn record_failure(&self) {
        self.consecutive_failures.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::SeqCst);
    }

    /// True once the guard has tripped; in-flight calls may finish but no new
    /// provider calls are started.
    pub fn halted(&self) -> bool {
        self.consecutive_failures.load(Ordering::SeqCst) >= self.max_consecutive_failures
    }

    pub fn record_backoff(&self, delay: Duration) {
        self.backoff_delays
            .lock()
            .expect("backoff delay lock poisoned")
            .push(delay);
    }

    pub fn backoff_delays(&self) -> Vec<Duration> {
        self.backoff_delays
            .lock()
            .expect("backoff delay lock poisoned")
            .clone()
    }
}
