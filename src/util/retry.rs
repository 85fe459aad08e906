use std::{fmt::Display, future::Future, time::Duration};

use log::warn;

/// Bounded retry with a fixed delay between attempts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        RetryPolicy { max_attempts, backoff }
    }

    /// Runs `op` until it succeeds, fails with an error `is_transient` rejects,
    /// or the attempt budget runs out. The last error is returned as is.
    pub async fn run<T, E, F, Fut>(&self, mut op: F, is_transient: impl Fn(&E) -> bool) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.max_attempts && is_transient(&err) => {
                    warn!("attempt {attempt}/{} failed: {err}, retrying in {:?}", self.max_attempts, self.backoff);
                    tokio::time::sleep(self.backoff).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, time::Duration};

    use super::RetryPolicy;

    fn instant_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::ZERO)
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = Cell::new(0);
        let res: Result<u32, &str> = instant_policy(3)
            .run(
                || {
                    calls.set(calls.get() + 1);
                    let n = calls.get();
                    async move { if n < 3 { Err("flaky") } else { Ok(n) } }
                },
                |_| true,
            )
            .await;

        assert_eq!(res, Ok(3));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn gives_up_when_budget_is_spent() {
        let calls = Cell::new(0);
        let res: Result<(), &str> = instant_policy(3)
            .run(
                || {
                    calls.set(calls.get() + 1);
                    async { Err("down") }
                },
                |_| true,
            )
            .await;

        assert_eq!(res, Err("down"));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let calls = Cell::new(0);
        let res: Result<(), &str> = instant_policy(5)
            .run(
                || {
                    calls.set(calls.get() + 1);
                    async { Err("forbidden") }
                },
                |err| *err != "forbidden",
            )
            .await;

        assert!(res.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn default_is_three_attempts() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.backoff, Duration::from_millis(500));
    }
}
