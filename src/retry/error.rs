//! Error returned by the job retry loops.

use thiserror::Error;

/// Why a retry loop stopped without a successful attempt.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// The operation reported `backoff::Error::Permanent`. Not retried.
    #[error("job failed permanently: {0}")]
    Permanent(E),
    /// The caller's attempt cap was reached; `last` is the final transient error.
    #[error("job gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: E },
}

impl<E> RetryError<E> {
    /// The error from the last attempt.
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Permanent(e) => e,
            RetryError::Exhausted { last, .. } => last,
        }
    }

    /// Number of attempts made before stopping, when known.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            RetryError::Permanent(_) => None,
            RetryError::Exhausted { attempts, .. } => Some(*attempts),
        }
    }
}
