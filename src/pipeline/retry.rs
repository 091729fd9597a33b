use std::fmt::Display;
use std::future::Future;
use tracing::warn;

/// Outcome of a bounded retry loop. Both variants carry a usable value.
#[derive(Debug, Clone, PartialEq)]
pub enum Attempt<T, R> {
    Accepted {
        value: T,
        attempts: usize,
    },
    /// Every attempt was rejected; `value` is the last one produced.
    ExhaustedFailOpen {
        value: T,
        attempts: usize,
        last_rejection: R,
    },
}

/// Repeats an action until its output is accepted or the attempt budget runs out.
/// Errors from the action itself end the loop immediately.
#[derive(Debug, Clone, Copy)]
pub struct BoundedRetry {
    max_attempts: usize,
}

impl BoundedRetry {
    pub fn new(max_attempts: usize) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    pub async fn run<T, R, E, F, Fut, P>(&self, mut action: F, mut accept: P) -> Result<Attempt<T, R>, E>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: FnMut(&T) -> Result<(), R>,
        R: Display,
    {
        let mut attempt = 1;
        loop {
            let value = action(attempt).await?;
            match accept(&value) {
                Ok(()) => {
                    return Ok(Attempt::Accepted {
                        value,
                        attempts: attempt,
                    })
                }
                Err(rejection) if attempt >= self.max_attempts => {
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        reason = %rejection,
                        "Out of attempts, keeping last result"
                    );
                    return Ok(Attempt::ExhaustedFailOpen {
                        value,
                        attempts: attempt,
                        last_rejection: rejection,
                    });
                }
                Err(rejection) => {
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        reason = %rejection,
                        "Result rejected, retrying"
                    );
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn at_least(min: usize) -> impl FnMut(&usize) -> Result<(), String> {
        move |v: &usize| {
            if *v >= min {
                Ok(())
            } else {
                Err(format!("{} < {}", v, min))
            }
        }
    }

    #[tokio::test]
    async fn stops_on_first_acceptance() {
        let calls = Cell::new(0);
        let result = BoundedRetry::new(3)
            .run(
                |n| {
                    calls.set(calls.get() + 1);
                    async move { Ok::<_, String>(n * 10) }
                },
                at_least(0),
            )
            .await
            .unwrap();
        assert_eq!(result, Attempt::Accepted { value: 10, attempts: 1 });
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn accepts_on_a_later_attempt() {
        let result = BoundedRetry::new(5)
            .run(|n| async move { Ok::<_, String>(n) }, at_least(3))
            .await
            .unwrap();
        assert_eq!(result, Attempt::Accepted { value: 3, attempts: 3 });
    }

    #[tokio::test]
    async fn fails_open_with_last_value() {
        let calls = Cell::new(0);
        let result = BoundedRetry::new(3)
            .run(
                |n| {
                    calls.set(calls.get() + 1);
                    async move { Ok::<_, String>(n) }
                },
                at_least(100),
            )
            .await
            .unwrap();
        assert_eq!(calls.get(), 3);
        assert_eq!(
            result,
            Attempt::ExhaustedFailOpen {
                value: 3,
                attempts: 3,
                last_rejection: "3 < 100".to_string()
            }
        );
    }

    #[tokio::test]
    async fn action_errors_are_not_retried() {
        let calls = Cell::new(0);
        let result: Result<Attempt<usize, String>, String> = BoundedRetry::new(3)
            .run(
                |_| {
                    calls.set(calls.get() + 1);
                    async { Err("connection refused".to_string()) }
                },
                at_least(0),
            )
            .await;
        assert_eq!(result.unwrap_err(), "connection refused");
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn zero_attempts_still_tries_once() {
        let policy = BoundedRetry::new(0);
        assert_eq!(policy.max_attempts(), 1);
        let result = policy
            .run(|n| async move { Ok::<_, String>(n) }, at_least(9))
            .await
            .unwrap();
        assert!(matches!(result, Attempt::ExhaustedFailOpen { attempts: 1, .. }));
    }
}
