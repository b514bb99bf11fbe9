//! Retry/backoff helper shared by the LLM and embedding clients.
//!
//! Transient failures (rate limits, connection errors) are retried with
//! exponential backoff: base 2s, doubling each attempt, capped at 30s, for
//! a maximum of 3 attempts total.

use std::future::Future;
use std::time::Duration;

const MAX_ATTEMPTS: u32 = 3;
const BASE_DELAY: Duration = Duration::from_secs(2);
const MAX_DELAY: Duration = Duration::from_secs(30);

/// Run `op` up to [`MAX_ATTEMPTS`] times, retrying only when `is_transient`
/// returns true for the error. `retry_after` lets a rate-limited response
/// dictate its own wait instead of the default exponential schedule.
pub async fn with_retry<T, E, Op, Fut>(
    mut op: Op,
    is_transient: impl Fn(&E) -> bool,
    retry_after: impl Fn(&E) -> Option<Duration>,
) -> Result<T, E>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < MAX_ATTEMPTS && is_transient(&err) => {
                let delay = retry_after(&err).unwrap_or_else(|| backoff_delay(attempt));
                tracing::warn!(attempt, delay_ms = delay.as_millis() as u64, "retrying after transient error");
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

fn backoff_delay(attempt: u32) -> Duration {
    let scaled = BASE_DELAY.saturating_mul(1 << (attempt.saturating_sub(1)));
    scaled.min(MAX_DELAY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn backoff_delay_doubles_and_caps() {
        assert_eq!(backoff_delay(1), Duration::from_secs(2));
        assert_eq!(backoff_delay(2), Duration::from_secs(4));
        assert_eq!(backoff_delay(3), Duration::from_secs(8));
        assert_eq!(backoff_delay(10), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn retries_transient_errors_up_to_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), &str> = with_retry(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("transient") }
            },
            |_| true,
            |_| Some(Duration::from_millis(1)),
        )
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), MAX_ATTEMPTS);
    }

    #[tokio::test]
    async fn stops_retrying_on_non_transient_error() {
        let calls = AtomicU32::new(0);
        let result: Result<(), &str> = with_retry(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("fatal") }
            },
            |_| false,
            |_| None,
        )
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn succeeds_without_retry_on_first_attempt() {
        let calls = AtomicU32::new(0);
        let result = with_retry(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, &str>(42) }
            },
            |_| true,
            |_| None,
        )
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
