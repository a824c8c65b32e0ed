//! Transaction bodies and retry
//!
//! Read-check-write logic is written as a pure function from the current
//! state to a [`TxOutcome`]. A store runner reads the rows, evaluates the
//! body, then either writes the committed state or rolls back. Conflicts
//! reported by the store are retried by [`retry_on_conflict`].

use std::future::Future;
use std::time::Duration;

/// Decision produced by a transaction body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxOutcome<C, A> {
    /// Persist `C` and commit.
    Commit(C),
    /// Roll back without writing; `A` explains why.
    Abort(A),
}

impl<C, A> TxOutcome<C, A> {
    pub fn is_commit(&self) -> bool {
        matches!(self, TxOutcome::Commit(_))
    }

    pub fn into_result(self) -> Result<C, A> {
        match self {
            TxOutcome::Commit(c) => Ok(c),
            TxOutcome::Abort(a) => Err(a),
        }
    }
}

/// Errors that signal "the transaction lost a race, run it again".
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Bounded retry with linear backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Delay before attempt `n + 1` is `backoff * n`
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: Duration::from_millis(20),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Single attempt, no retry
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// attempt budget is spent. The last error is returned unchanged.
pub async fn retry_on_conflict<T, E, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable,
{
    let mut attempt: u32 = 1;
    loop {
        match op().await {
            Err(err) if err.is_retryable() && attempt < policy.max_attempts => {
                tracing::debug!(attempt, "Transaction conflict, retrying");
                if !policy.backoff.is_zero() {
                    tokio::time::sleep(policy.backoff * attempt).await;
                }
                attempt += 1;
            }
            other => return other,
        }
    }
}
