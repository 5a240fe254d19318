//! Exponential backoff shared by the HTTP clients

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use tokio::time::sleep;

use crate::error::{Error, Result};

/// Outcome of a failed attempt
#[derive(Debug)]
pub enum Attempt {
    /// Worth trying again (transport error, 429, 5xx)
    Retry(Error),
    /// Give up immediately
    Fatal(Error),
}

impl Attempt {
    /// Classify a non-success HTTP status
    pub fn from_status(status: StatusCode, error: Error) -> Self {
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            Attempt::Retry(error)
        } else {
            Attempt::Fatal(error)
        }
    }

    fn into_error(self) -> Error {
        match self {
            Attempt::Retry(e) | Attempt::Fatal(e) => e,
        }
    }
}

/// Retry schedule: `base_delay * 2^attempt` between attempts
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Delay before retry number `attempt` (0-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Run `operation` until it succeeds, fails fatally, or retries run out
    pub async fn run<F, Fut, T>(&self, label: &str, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = std::result::Result<T, Attempt>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(Attempt::Retry(e)) if attempt < self.max_retries => {
                    let delay = self.delay(attempt);
                    tracing::warn!(
                        "{} failed (attempt {}/{}): {}, retrying in {:?}",
                        label,
                        attempt + 1,
                        self.max_retries + 1,
                        e,
                        delay
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(failure) => return Err(failure.into_error()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_delay_doubles() {
        let policy = RetryPolicy::new(4, Duration::from_secs(1));
        assert_eq!(policy.delay(0), Duration::from_secs(1));
        assert_eq!(policy.delay(3), Duration::from_secs(8));
    }

    #[test]
    fn test_status_classification() {
        let err = || Error::llm("x");
        assert!(matches!(Attempt::from_status(StatusCode::TOO_MANY_REQUESTS, err()), Attempt::Retry(_)));
        assert!(matches!(Attempt::from_status(StatusCode::BAD_GATEWAY, err()), Attempt::Retry(_)));
        assert!(matches!(Attempt::from_status(StatusCode::UNAUTHORIZED, err()), Attempt::Fatal(_)));
    }

    #[tokio::test]
    async fn test_retries_then_succeeds() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        let out = policy
            .run("op", || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(Attempt::Retry(Error::llm("busy")))
                } else {
                    Ok(7)
                }
            })
            .await
            .unwrap();
        assert_eq!(out, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_fatal_stops_immediately() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        let result: Result<()> = policy
            .run("op", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Attempt::Fatal(Error::llm("bad key")))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(2, Duration::from_millis(1));
        let result: Result<()> = policy
            .run("op", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Attempt::Retry(Error::search("down")))
            })
            .await;
        assert!(matches!(result, Err(Error::Search(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
