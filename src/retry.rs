//! Bounded exponential-backoff retry with cooperative cancellation.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{error, warn};

use crate::error::{RetryError, SourceError};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total tries, including the first.
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Wait after the failed attempt with zero-based index `attempt`: `2^attempt * base_delay`.
    ///
    /// No wait follows the final attempt, so with the default three attempts only
    /// `delay_for(0)` and `delay_for(1)` (1s, 2s) are used. The `delay_for(2)` slot
    /// (4s) is reached only when `max_attempts > 3`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(1u32 << attempt.min(16))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

/// Shared cancellation flag. Clones observe the same state.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once `cancel` has been called on any clone.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        loop {
            if self.is_cancelled() {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

pub struct RetryingFetcher {
    policy: RetryPolicy,
}

impl RetryingFetcher {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Run `thunk` until it succeeds or `max_attempts` tries have failed.
    ///
    /// Only `Err(SourceError)` triggers a retry; any `Ok` value, empty or not,
    /// is returned as-is. Cancelling `cancel` stops both an in-flight attempt
    /// and a pending backoff timer.
    pub async fn run<T, F, Fut>(&self, mut thunk: F, cancel: &CancelToken) -> Result<T, RetryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SourceError>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0u32;

        loop {
            if cancel.is_cancelled() {
                return Err(RetryError::Cancelled { attempts: attempt });
            }

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(RetryError::Cancelled { attempts: attempt });
                }
                result = thunk() => result,
            };

            let err = match result {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            let tried = attempt + 1;
            if tried >= max_attempts {
                error!("Giving up after {} attempts: {}", tried, err);
                return Err(RetryError::Exhausted {
                    attempts: tried,
                    source: err,
                });
            }

            let delay = self.policy.delay_for(attempt);
            warn!(
                "Attempt {}/{} failed ({:?}): {}; retrying in {:?}",
                tried,
                max_attempts,
                err.kind(),
                err,
                delay
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(RetryError::Cancelled { attempts: tried });
                }
                _ = sleep(delay) => {}
            }

            attempt = tried;
        }
    }
}

impl Default for RetryingFetcher {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}
