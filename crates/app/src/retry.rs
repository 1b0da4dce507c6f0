//! Transaction retry policy
//!
//! Redemption transactions can lose races on the promotion usage counter and
//! fail with a serialization or deadlock error. Those failures are safe to
//! retry wholesale because nothing was committed. The policy is a named,
//! injectable value so the bound and backoff are visible in one place and
//! the ledger can be tested with a fake storage layer that injects conflicts
//! on demand.

use std::{future::Future, time::Duration};

use rand::Rng;
use tokio::time::sleep;
use tracing::debug;

/// Errors that can classify themselves as transient storage conflicts.
pub trait TransientError {
    /// Whether retrying the whole operation may succeed.
    fn is_transient(&self) -> bool;
}

/// Postgres SQLSTATE codes for `serialization_failure` and
/// `deadlock_detected`, the only error class the ledger retries.
pub fn is_serialization_failure(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == "40001" || code == "40P01")
}

/// A bounded retry with linear backoff and a little jitter.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,

    /// Base backoff; attempt `n` waits `n × backoff` plus jitter.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(50),
        }
    }
}

impl RetryPolicy {
    /// Run `op`, retrying only transient failures, up to the attempt bound.
    ///
    /// Non-transient errors abort immediately. The last transient error is
    /// returned when the bound is exhausted.
    ///
    /// # Errors
    ///
    /// Returns whatever error `op` last produced.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        E: TransientError,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt: u32 = 1;

        loop {
            match op().await {
                Err(error) if error.is_transient() && attempt < self.max_attempts => {
                    debug!(attempt, "retrying after transient storage conflict");

                    sleep(self.delay(attempt)).await;

                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    fn delay(&self, attempt: u32) -> Duration {
        let half_backoff_ms = u64::try_from(self.backoff.as_millis() / 2).unwrap_or(u64::MAX);
        let jitter = rand::thread_rng().gen_range(0..=half_backoff_ms);

        self.backoff * attempt + Duration::from_millis(jitter)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use testresult::TestResult;

    use super::*;

    #[derive(Debug, PartialEq)]
    enum FakeError {
        Conflict,
        Fatal,
    }

    impl TransientError for FakeError {
        fn is_transient(&self) -> bool {
            matches!(self, Self::Conflict)
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            backoff: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn succeeds_after_transient_conflicts() -> TestResult {
        let calls = Cell::new(0u32);
        let calls = &calls;

        let result: Result<u32, FakeError> = policy()
            .run(|| {
                calls.set(calls.get() + 1);

                async move {
                    if calls.get() < 3 {
                        Err(FakeError::Conflict)
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result, Ok(42));
        assert_eq!(calls.get(), 3);

        Ok(())
    }

    #[tokio::test]
    async fn gives_up_after_the_attempt_bound() {
        let calls = Cell::new(0u32);

        let result: Result<(), FakeError> = policy()
            .run(|| {
                calls.set(calls.get() + 1);

                async { Err(FakeError::Conflict) }
            })
            .await;

        assert_eq!(result, Err(FakeError::Conflict));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn non_transient_errors_abort_immediately() {
        let calls = Cell::new(0u32);

        let result: Result<(), FakeError> = policy()
            .run(|| {
                calls.set(calls.get() + 1);

                async { Err(FakeError::Fatal) }
            })
            .await;

        assert_eq!(result, Err(FakeError::Fatal));
        assert_eq!(calls.get(), 1);
    }
}
