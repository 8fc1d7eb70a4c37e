//! Small async helpers reused by adapters that talk to external services
//! (chat models, vector stores): retry with exponential backoff, and a
//! timeout wrapper.

use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Exponential-backoff retry policy.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub initial_interval: Duration,
    pub backoff_factor: f64,
    pub max_interval: Duration,
    pub jitter: bool,
}

impl RetryPolicy {
    pub fn new(max_attempts: usize) -> Self {
        Self {
            max_attempts,
            initial_interval: Duration::from_millis(500),
            backoff_factor: 2.0,
            max_interval: Duration::from_secs(128),
            jitter: true,
        }
    }

    pub fn with_initial_interval(mut self, d: Duration) -> Self {
        self.initial_interval = d;
        self
    }

    pub fn with_backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = factor;
        self
    }

    fn delay_for(&self, attempt: usize) -> Duration {
        let base = self.initial_interval.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
        let capped = base.min(self.max_interval.as_secs_f64());
        let secs = if self.jitter {
            rand::thread_rng().gen_range((capped * 0.5)..=capped)
        } else {
            capped
        };
        Duration::from_secs_f64(secs.max(0.0))
    }

    /// Run `op` until it succeeds or `max_attempts` is exhausted, sleeping
    /// between attempts according to the backoff schedule.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    attempt += 1;
                    if attempt >= self.max_attempts {
                        return Err(err);
                    }
                    tokio::time::sleep(self.delay_for(attempt - 1)).await;
                }
            }
        }
    }
}

/// Error returned by [`with_timeout`] when the future doesn't finish in
/// time.
#[derive(Debug, thiserror::Error)]
#[error("operation '{operation}' timed out after {duration_ms}ms")]
pub struct TimeoutError {
    pub operation: String,
    pub duration_ms: u64,
}

/// Run `future` with a deadline; returns [`TimeoutError`] if it doesn't
/// resolve in time.
pub async fn with_timeout<F, T>(
    operation: impl Into<String>,
    duration: Duration,
    future: F,
) -> Result<T, TimeoutError>
where
    F: Future<Output = T>,
{
    let operation = operation.into();
    tokio::time::timeout(duration, future)
        .await
        .map_err(|_| TimeoutError {
            operation,
            duration_ms: duration.as_millis() as u64,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn retry_succeeds_after_transient_failures() {
        let policy = RetryPolicy::new(3).with_initial_interval(Duration::from_millis(1));
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = calls.clone();
        let result: Result<i32, &str> = policy
            .run(|| {
                let calls = calls2.clone();
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    if n < 2 {
                        Err("not yet")
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;
        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retry_gives_up_after_max_attempts() {
        let policy = RetryPolicy::new(2).with_initial_interval(Duration::from_millis(1));
        let result: Result<i32, &str> = policy.run(|| async { Err("always fails") }).await;
        assert_eq!(result, Err("always fails"));
    }

    #[tokio::test]
    async fn timeout_wraps_slow_futures() {
        let err = with_timeout("slow", Duration::from_millis(5), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
        })
        .await
        .unwrap_err();
        assert_eq!(err.operation, "slow");
    }
}
