//! Manually driven clock so tests control elapsed time exactly.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use backoff::exponential::ExponentialBackoff;
use backoff::Clock;
use job_backoff::JobBackoff;

#[derive(Clone, Debug)]
pub struct ManualClock(Arc<Mutex<Instant>>);

impl ManualClock {
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(Instant::now())))
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.0.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.0.lock().unwrap()
    }
}

/// Generator with no jitter: initial 1s, x2, capped at 30s.
pub fn generator(clock: &ManualClock) -> ExponentialBackoff<ManualClock> {
    ExponentialBackoff {
        current_interval: Duration::from_secs(1),
        initial_interval: Duration::from_secs(1),
        randomization_factor: 0.0,
        multiplier: 2.0,
        max_interval: Duration::from_secs(30),
        start_time: clock.now(),
        max_elapsed_time: Some(Duration::from_secs(900)),
        clock: clock.clone(),
    }
}

/// Policy over [`generator`] with a 5s job threshold.
pub fn policy(clock: &ManualClock) -> JobBackoff<ManualClock> {
    JobBackoff::new(generator(clock)).with_min_job_interval(Duration::from_secs(5))
}
