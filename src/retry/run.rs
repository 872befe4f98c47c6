//! Retry loops: run a job until it succeeds, fails permanently, or hits the
//! caller's attempt cap, waiting a [`JobBackoff`] interval between attempts.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use backoff::{Clock, Error};

use super::error::RetryError;
use crate::job::JobBackoff;

/// What to do after a failed attempt.
enum Step<E> {
    Wait { err: E, delay: Duration },
    Stop(RetryError<E>),
}

/// Every transient failure advances the policy once, even when the operation
/// supplies its own `retry_after`; that delay then replaces the policy's.
fn decide<C, E>(
    policy: &mut JobBackoff<C>,
    max_attempts: Option<u32>,
    attempt: u32,
    err: Error<E>,
) -> Step<E>
where
    C: Clock,
    E: fmt::Display,
{
    let (err, retry_after) = match err {
        Error::Permanent(e) => {
            tracing::warn!(attempt, error = %e, "job failed permanently");
            return Step::Stop(RetryError::Permanent(e));
        }
        Error::Transient { err, retry_after } => (err, retry_after),
    };

    if max_attempts.is_some_and(|max| attempt >= max) {
        tracing::warn!(attempt, error = %err, "job retry attempts exhausted");
        return Step::Stop(RetryError::Exhausted {
            attempts: attempt,
            last: err,
        });
    }

    let interval = policy.next_interval();
    let delay = retry_after.unwrap_or(interval);
    tracing::warn!(attempt, ?delay, error = %err, "job attempt failed; retrying");
    Step::Wait { err, delay }
}

/// Runs `op` until it succeeds or the loop says to stop.
/// On transient failure, sleeps for the backoff interval then tries again.
///
/// `max_attempts` counts the first attempt; `None` retries forever.
pub fn run_with_retry<C, T, E, F>(
    policy: &mut JobBackoff<C>,
    max_attempts: Option<u32>,
    op: F,
) -> Result<T, RetryError<E>>
where
    C: Clock,
    E: fmt::Display,
    F: FnMut() -> Result<T, Error<E>>,
{
    run_with_retry_notify(policy, max_attempts, op, |_: &E, _| {})
}

/// Like [`run_with_retry`], calling `notify(&err, delay)` before each sleep.
pub fn run_with_retry_notify<C, T, E, F, N>(
    policy: &mut JobBackoff<C>,
    max_attempts: Option<u32>,
    mut op: F,
    mut notify: N,
) -> Result<T, RetryError<E>>
where
    C: Clock,
    E: fmt::Display,
    F: FnMut() -> Result<T, Error<E>>,
    N: FnMut(&E, Duration),
{
    let mut attempt = 1u32;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) => match decide(policy, max_attempts, attempt, e) {
                Step::Stop(err) => return Err(err),
                Step::Wait { err, delay } => {
                    notify(&err, delay);
                    std::thread::sleep(delay);
                    attempt = attempt.saturating_add(1);
                }
            },
        }
    }
}

/// Async form of [`run_with_retry`]; waits on the tokio timer.
pub async fn run_with_retry_async<C, T, E, F, Fut>(
    policy: &mut JobBackoff<C>,
    max_attempts: Option<u32>,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    C: Clock,
    E: fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error<E>>>,
{
    let mut attempt = 1u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => match decide(policy, max_attempts, attempt, e) {
                Step::Stop(err) => return Err(err),
                Step::Wait { delay, .. } => {
                    tokio::time::sleep(delay).await;
                    attempt = attempt.saturating_add(1);
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backoff::ExponentialBackoff;

    fn fast_policy() -> JobBackoff {
        let inner = ExponentialBackoff {
            current_interval: Duration::from_millis(1),
            initial_interval: Duration::from_millis(1),
            randomization_factor: 0.0,
            multiplier: 2.0,
            max_interval: Duration::from_millis(4),
            ..ExponentialBackoff::default()
        };
        JobBackoff::new(inner)
    }

    #[test]
    fn succeeds_after_transient_failures() {
        let mut policy = fast_policy();
        let mut calls = 0;
        let out = run_with_retry(&mut policy, None, || {
            calls += 1;
            if calls < 3 {
                Err(Error::transient("not yet"))
            } else {
                Ok(calls)
            }
        });
        assert_eq!(out.unwrap(), 3);
    }

    #[test]
    fn permanent_error_is_not_retried() {
        let mut policy = fast_policy();
        let mut calls = 0;
        let out: Result<(), _> = run_with_retry(&mut policy, None, || {
            calls += 1;
            Err(Error::permanent("bad input"))
        });
        assert!(matches!(out, Err(RetryError::Permanent("bad input"))));
        assert_eq!(calls, 1);
    }

    #[test]
    fn respects_max_attempts() {
        let mut policy = fast_policy();
        let mut calls = 0;
        let out: Result<(), _> = run_with_retry(&mut policy, Some(3), || {
            calls += 1;
            Err(Error::transient("down"))
        });
        match out {
            Err(RetryError::Exhausted { attempts, last }) => {
                assert_eq!(attempts, 3);
                assert_eq!(last, "down");
            }
            other => panic!("expected exhaustion, got {:?}", other),
        }
        assert_eq!(calls, 3);
    }

    #[test]
    fn notify_sees_growing_delays() {
        let mut policy = fast_policy();
        let mut delays = Vec::new();
        let out: Result<(), _> = run_with_retry_notify(
            &mut policy,
            Some(5),
            || Err(Error::transient("flaky")),
            |_, d| delays.push(d),
        );
        assert!(out.is_err());
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(1),
                Duration::from_millis(2),
                Duration::from_millis(4),
                Duration::from_millis(4),
            ]
        );
    }

    #[test]
    fn retry_after_overrides_policy_delay() {
        let mut policy = fast_policy();
        let mut delays = Vec::new();
        let mut calls = 0;
        let out = run_with_retry_notify(
            &mut policy,
            None,
            || {
                calls += 1;
                if calls == 1 {
                    Err(Error::retry_after("throttled", Duration::from_millis(3)))
                } else {
                    Ok(())
                }
            },
            |_: &&str, d| delays.push(d),
        );
        assert!(out.is_ok());
        assert_eq!(delays, vec![Duration::from_millis(3)]);
    }

    #[test]
    fn question_mark_converts_to_transient() {
        fn attempt(calls: &mut u32) -> Result<u32, Error<String>> {
            *calls += 1;
            let parsed: u32 = if *calls < 2 { "x" } else { "7" }
                .parse()
                .map_err(|e: std::num::ParseIntError| e.to_string())?;
            Ok(parsed)
        }

        let mut policy = fast_policy();
        let mut calls = 0;
        let out = run_with_retry(&mut policy, None, || attempt(&mut calls));
        assert_eq!(out.unwrap(), 7);
        assert_eq!(calls, 2);
    }

    #[tokio::test]
    async fn async_loop_retries_until_success() {
        let mut policy = fast_policy();
        let mut calls = 0u32;
        let out = run_with_retry_async(&mut policy, Some(5), || {
            calls += 1;
            let n = calls;
            async move {
                if n < 3 {
                    Err(Error::transient("warming up"))
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(out.unwrap(), 3);
    }

    #[tokio::test]
    async fn async_loop_stops_on_permanent() {
        let mut policy = fast_policy();
        let out: Result<(), _> = run_with_retry_async(&mut policy, None, || async {
            Err(Error::permanent("gone"))
        })
        .await;
        assert_eq!(out.unwrap_err().into_inner(), "gone");
    }
}
