//! Fixed-interval bounded retry loop.
//!
//! Every wait in a deployment (health gate, drain, provisioning) is a
//! [`poll`] over a caller-supplied attempt function. The attempt decides
//! whether the target condition holds; the loop owns the budget and the
//! sleep between attempts. Errors returned by an attempt are not retried.

use std::future::Future;

use thiserror::Error;
use tracing::trace;

use crate::types::RetryPolicy;

/// Outcome of a single poll attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt<T> {
    /// The condition holds; stop polling.
    Done(T),
    /// Not yet; sleep and try again if budget remains.
    Retry,
}

/// Why a [`poll`] did not produce a value.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    #[error("retry budget exhausted after {attempts} attempts")]
    Exhausted { attempts: u32 },

    #[error("{0}")]
    Aborted(E),
}

/// Run `attempt` until it reports [`Attempt::Done`], it fails, or
/// `policy.max_attempts` attempts have been made.
///
/// The closure receives the zero-based attempt index. The interval is
/// slept between attempts only, never after the last one.
pub async fn poll<T, E, F, Fut>(policy: &RetryPolicy, mut attempt: F) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Attempt<T>, E>>,
{
    let max_attempts = policy.max_attempts.max(1);
    for index in 0..max_attempts {
        match attempt(index).await.map_err(RetryError::Aborted)? {
            Attempt::Done(value) => return Ok(value),
            Attempt::Retry => {
                trace!(attempt = index + 1, max_attempts, "condition not met");
            }
        }
        if index + 1 < max_attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }
    Err(RetryError::Exhausted {
        attempts: max_attempts,
    })
}
