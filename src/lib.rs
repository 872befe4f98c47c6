//! Exponential backoff for long-running jobs.
//!
//! [`JobBackoff`] decorates the `backoff` crate's exponential generator: when
//! a failed attempt ran for at least `min_job_interval`, the next wait starts
//! over from the initial interval instead of growing further.
//!
//! ```no_run
//! use std::time::Duration;
//! use job_backoff::JobBackoff;
//!
//! let mut policy = JobBackoff::new(backoff::ExponentialBackoff::default())
//!     .with_min_job_interval(Duration::from_secs(60));
//! loop {
//!     if run_job().is_ok() {
//!         break;
//!     }
//!     std::thread::sleep(policy.next_interval());
//! }
//! # fn run_job() -> Result<(), ()> { Ok(()) }
//! ```

pub mod config;
pub mod job;
pub mod logging;
pub mod retry;

pub use config::{ConfigError, JobBackoffConfig};
pub use job::{JobBackoff, DEFAULT_MIN_JOB_INTERVAL};
pub use retry::{run_with_retry, run_with_retry_async, run_with_retry_notify, RetryError};
