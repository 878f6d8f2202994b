use std::future::Future;
use std::time::Duration;

use crate::error::CrawlResult;

/// Delay applied between two attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Fixed(Duration),
    /// Doubles after every failed attempt, capped at `max`.
    Exponential { initial: Duration, max: Duration },
}

impl Backoff {
    /// Delay before retry number `retry` (1-based).
    pub fn delay(&self, retry: u32) -> Duration {
        match *self {
            Backoff::Fixed(d) => d,
            Backoff::Exponential { initial, max } => {
                let factor = 1u32.checked_shl(retry.saturating_sub(1)).unwrap_or(u32::MAX);
                std::cmp::min(initial.saturating_mul(factor), max)
            }
        }
    }
}

/// How often a single fetch is attempted before its failure becomes fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Backoff,
}

impl Default for RetryPolicy {
    /// One retry after a fixed five second wait.
    fn default() -> Self {
        Self::new(2, Backoff::Fixed(Duration::from_secs(5)))
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self { max_attempts: max_attempts.max(1), backoff }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff(&self) -> Backoff {
        self.backoff
    }

    /// Run `op` until it succeeds or the attempts are used up; the last error is returned.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> CrawlResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = CrawlResult<T>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) if attempt >= self.max_attempts => {
                    tracing::error!(error=%e, attempt, "{} failed, giving up", what);
                    return Err(e);
                }
                Err(e) => {
                    let wait = self.backoff.delay(attempt);
                    tracing::warn!(error=%e, attempt, wait_ms = wait.as_millis() as u64, "{} failed, retrying", what);
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CrawlError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn quick() -> RetryPolicy {
        RetryPolicy::new(2, Backoff::Fixed(Duration::from_millis(1)))
    }

    #[tokio::test]
    async fn single_failure_then_success() {
        let calls = AtomicU32::new(0);
        let out = quick()
            .run("fetch", || async {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(CrawlError::PageFetch("429".into()))
                } else {
                    Ok(7)
                }
            })
            .await;
        assert_eq!(out.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn two_failures_are_fatal() {
        let calls = AtomicU32::new(0);
        let out: CrawlResult<()> = quick()
            .run("fetch", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(CrawlError::PageFetch("503".into()))
            })
            .await;
        assert!(matches!(out, Err(CrawlError::PageFetch(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn exponential_backoff_is_capped() {
        let b = Backoff::Exponential {
            initial: Duration::from_millis(200),
            max: Duration::from_millis(500),
        };
        assert_eq!(b.delay(1), Duration::from_millis(200));
        assert_eq!(b.delay(2), Duration::from_millis(400));
        assert_eq!(b.delay(3), Duration::from_millis(500));
    }
}
