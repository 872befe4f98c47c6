//! Exponential backoff for long-running jobs.
//!
//! A plain exponential backoff grows its interval on every failure, which
//! assumes a failed attempt is cheap and quick. A job attempt can run for
//! minutes before failing; such an attempt made real progress and should not
//! push the next wait further out. [`JobBackoff`] wraps an
//! [`ExponentialBackoff`] and resets it whenever at least
//! [`JobBackoff::min_job_interval`] has passed since its last reset.
//!
//! Growth, jitter and max-interval capping all stay inside the wrapped
//! generator; this type only decides when to reset it.
//!
//! A `min_job_interval` of zero is accepted: every call then resets and the
//! policy always hands out the initial interval.

use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::exponential::ExponentialBackoff;
use backoff::{Clock, SystemClock};

/// Threshold used by [`JobBackoff::new`] until the caller sets its own.
pub const DEFAULT_MIN_JOB_INTERVAL: Duration = Duration::from_secs(30);

/// Exponential backoff that relaxes back to its initial interval once an
/// attempt has run for at least `min_job_interval`.
///
/// Owned by a single retry loop; `next_interval` mutates the wrapped
/// generator, so concurrent jobs each need their own instance.
#[derive(Debug)]
pub struct JobBackoff<C = SystemClock> {
    inner: ExponentialBackoff<C>,
    /// Elapsed time since the last reset at or above which the next call
    /// starts a fresh backoff sequence.
    pub min_job_interval: Duration,
}

impl<C: Clock> JobBackoff<C> {
    /// Wrap `inner`, disabling its maximum elapsed time.
    ///
    /// Initial interval, multiplier, randomization factor and max interval are
    /// used as given. `max_elapsed_time` is forced to `None` so the generator
    /// never gives up on its own; only the job-level reset shapes long-run
    /// behavior.
    pub fn new(mut inner: ExponentialBackoff<C>) -> Self {
        inner.max_elapsed_time = None;
        Self {
            inner,
            min_job_interval: DEFAULT_MIN_JOB_INTERVAL,
        }
    }

    pub fn with_min_job_interval(mut self, min_job_interval: Duration) -> Self {
        self.min_job_interval = min_job_interval;
        self
    }

    /// Read-only view of the wrapped generator.
    pub fn exponential(&self) -> &ExponentialBackoff<C> {
        &self.inner
    }

    /// Time since the wrapped generator was created or last reset.
    pub fn elapsed(&self) -> Duration {
        self.inner.get_elapsed_time()
    }

    /// Compute the wait before the next attempt.
    ///
    /// If `elapsed() >= min_job_interval` the generator is reset first, so the
    /// result is drawn around the initial interval. Otherwise the generator
    /// grows from its current interval as usual.
    pub fn next_interval(&mut self) -> Duration {
        let elapsed = self.elapsed();
        if elapsed >= self.min_job_interval {
            tracing::debug!(
                ?elapsed,
                min_job_interval = ?self.min_job_interval,
                "job ran past min interval; resetting backoff"
            );
            self.inner.reset();
        }

        // max_elapsed_time is None, so the generator always yields a value.
        let interval = self
            .inner
            .next_backoff()
            .unwrap_or(self.inner.max_interval);
        tracing::trace!(?interval, "next job backoff interval");
        interval
    }

    /// Restart the sequence at the initial interval.
    pub fn reset(&mut self) {
        self.inner.reset();
    }
}

impl Default for JobBackoff<SystemClock> {
    fn default() -> Self {
        Self::new(ExponentialBackoff::default())
    }
}

impl<C: Clock> Backoff for JobBackoff<C> {
    fn reset(&mut self) {
        JobBackoff::reset(self);
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        Some(self.next_interval())
    }
}
