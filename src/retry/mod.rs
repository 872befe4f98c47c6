//! Retry loops for long-running jobs.
//!
//! Operations classify their own failures with [`backoff::Error`]:
//! `Permanent` stops the loop, `Transient` waits a [`JobBackoff`] interval
//! (or the operation's `retry_after`) and runs again. Plain errors converted
//! with `?` are transient.
//!
//! [`JobBackoff`]: crate::job::JobBackoff

mod error;
mod run;

pub use error::RetryError;
pub use run::{run_with_retry, run_with_retry_async, run_with_retry_notify};
