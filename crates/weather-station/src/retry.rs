//! Fixed-interval retry
//!
//! Connecting and enumerating are retried with a constant delay between
//! attempts. There is no backoff. The default policy never gives up.

use std::future::Future;
use std::time::Duration;

/// Returned when a bounded policy runs out of attempts
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    #[error("Gave up after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: E },
}

/// How often and how fast to retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Pause between two attempts
    pub delay: Duration,
    /// Total number of attempts; `None` retries forever
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::forever(Duration::from_secs(1))
    }
}

impl RetryPolicy {
    pub fn forever(delay: Duration) -> Self {
        Self {
            delay,
            max_attempts: None,
        }
    }

    pub fn bounded(delay: Duration, max_attempts: u32) -> Self {
        Self {
            delay,
            max_attempts: Some(max_attempts.max(1)),
        }
    }

    /// Run `op` until it succeeds, logging each failure as "`what` Error".
    pub async fn run<T, E, F, Fut>(&self, what: &str, mut op: F) -> Result<T, RetryError<E>>
    where
        E: std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempts: u32 = 0;

        loop {
            attempts = attempts.saturating_add(1);

            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    tracing::error!("{} Error: {}", what, e);

                    if self.max_attempts.is_some_and(|max| attempts >= max) {
                        return Err(RetryError::Exhausted {
                            attempts,
                            last_error: e,
                        });
                    }

                    tokio::time::sleep(self.delay).await;
                }
            }
        }
    }
}
