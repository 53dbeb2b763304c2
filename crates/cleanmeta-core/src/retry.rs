use crate::error::StripError;
use crate::progress::BatchReporter;
use crate::stripper::{self, StripOptions, StripStats};
use std::path::Path;
use std::thread;
use std::time::Duration;
use tracing::warn;

/// Run `op` up to `max_attempts` times, sleeping `delay` between failed
/// attempts. `is_retryable` decides whether an error is worth another try;
/// a permanent error is returned at once. `on_retry` sees every failed
/// attempt that will be retried, with its 1-based attempt number.
///
/// `max_attempts` of zero is treated as one.
pub fn retry_with_delay<T, E, F, R, N>(
    max_attempts: u32,
    delay: Duration,
    is_retryable: R,
    mut on_retry: N,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    R: Fn(&E) -> bool,
    N: FnMut(u32, &E),
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op() {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempt >= max_attempts || !is_retryable(&e) {
                    return Err(e);
                }
                on_retry(attempt, &e);
                thread::sleep(delay);
            }
        }
    }
}

/// Strip `path`, retrying transient failures. Format rejections are never
/// retried.
pub fn strip_with_retry(
    path: &Path,
    max_attempts: u32,
    delay: Duration,
    options: StripOptions,
    reporter: &dyn BatchReporter,
) -> Result<StripStats, StripError> {
    retry_with_delay(
        max_attempts,
        delay,
        StripError::is_retryable,
        |attempt, e| {
            warn!(
                "Failed to strip properties from {}, retry {}: {}",
                path.display(),
                attempt,
                e
            );
            reporter.on_strip_retry(path, attempt, e);
        },
        || stripper::strip_properties(path, options),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Transient,
        Permanent,
    }

    fn flaky(calls: &Cell<u32>, failures: u32) -> Result<u32, TestError> {
        calls.set(calls.get() + 1);
        if calls.get() <= failures {
            Err(TestError::Transient)
        } else {
            Ok(calls.get())
        }
    }

    fn run(max_attempts: u32, failures: u32) -> (Result<u32, TestError>, u32, Vec<u32>) {
        let calls = Cell::new(0);
        let mut retries = Vec::new();
        let result = retry_with_delay(
            max_attempts,
            Duration::ZERO,
            |e| *e == TestError::Transient,
            |attempt, _| retries.push(attempt),
            || flaky(&calls, failures),
        );
        (result, calls.get(), retries)
    }

    #[test]
    fn test_succeeds_iff_attempts_exceed_failures() {
        for max_attempts in 1..=5 {
            for failures in 0..=5 {
                let (result, calls, _) = run(max_attempts, failures);
                assert_eq!(
                    result.is_ok(),
                    max_attempts > failures,
                    "max_attempts={} failures={}",
                    max_attempts,
                    failures
                );
                assert!(calls <= max_attempts);
            }
        }
    }

    #[test]
    fn test_two_failures_then_success_reports_two_retries() {
        let (result, calls, retries) = run(3, 2);
        assert_eq!(result, Ok(3));
        assert_eq!(calls, 3);
        assert_eq!(retries, vec![1, 2]);
    }

    #[test]
    fn test_exhausted_returns_last_error_without_retry_notice() {
        let (result, calls, retries) = run(3, 10);
        assert_eq!(result, Err(TestError::Transient));
        assert_eq!(calls, 3);
        assert_eq!(retries, vec![1, 2]);
    }

    #[test]
    fn test_permanent_error_is_not_retried() {
        let calls = Cell::new(0);
        let result: Result<(), TestError> = retry_with_delay(
            5,
            Duration::ZERO,
            |e| *e == TestError::Transient,
            |_, _| panic!("permanent errors must not be retried"),
            || {
                calls.set(calls.get() + 1);
                Err(TestError::Permanent)
            },
        );
        assert_eq!(result, Err(TestError::Permanent));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_zero_attempts_still_runs_once() {
        let (result, calls, _) = run(0, 0);
        assert_eq!(result, Ok(1));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_delay_applies_between_attempts_only() {
        let calls = Cell::new(0);
        let start = std::time::Instant::now();
        let _ = retry_with_delay(
            3,
            Duration::from_millis(30),
            |_: &TestError| true,
            |_, _| {},
            || flaky(&calls, 2),
        );
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(60));
        assert!(elapsed < Duration::from_millis(1000));
    }
}
