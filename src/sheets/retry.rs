use crate::error::SheetError;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 500;
pub const DEFAULT_DELAY: Duration = Duration::from_secs(10);

/// Outcome of a single attempt that did not fail outright.
#[derive(Debug, PartialEq)]
pub enum Attempt<T> {
    Ready(T),
    /// Recoverable condition such as an exhausted quota. Worth another try.
    NotReady(String),
}

impl<T> Attempt<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Attempt<U> {
        match self {
            Attempt::Ready(value) => Attempt::Ready(f(value)),
            Attempt::NotReady(reason) => Attempt::NotReady(reason),
        }
    }
}

/// Fixed-delay retry with a bounded number of attempts.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    cancel: CancelHandle,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_DELAY)
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
            cancel: CancelHandle::default(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    /// Invoke `op` until it is ready, fails, or `max_attempts` is reached.
    ///
    /// Errors returned by `op` are never retried. The wait between attempts
    /// ends early with [`SheetError::Cancelled`] when the cancel handle fires.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, SheetError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Attempt<T>, SheetError>>,
    {
        for attempt in 1..=self.max_attempts {
            if self.cancel.is_cancelled() {
                return Err(SheetError::Cancelled);
            }

            match op().await? {
                Attempt::Ready(value) => return Ok(value),
                Attempt::NotReady(reason) => {
                    debug!(attempt, max = self.max_attempts, %reason, "Remote not ready");
                }
            }

            if attempt < self.max_attempts {
                tokio::select! {
                    _ = tokio::time::sleep(self.delay) => {}
                    _ = self.cancel.cancelled() => return Err(SheetError::Cancelled),
                }
            }
        }

        warn!(attempts = self.max_attempts, "Giving up on remote request");
        Err(SheetError::RetriesExhausted {
            attempts: self.max_attempts,
        })
    }
}

/// Aborts pending retry waits. Clones share the same state.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelHandle {
    fn default() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this only returns once cancelled.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn quick_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::ZERO)
    }

    #[tokio::test]
    async fn test_retry_exhausts_after_exact_attempts() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), _> = quick_policy(7)
            .run(|| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Attempt::NotReady("quota".to_string()))
            })
            .await;

        assert_eq!(result, Err(SheetError::RetriesExhausted { attempts: 7 }));
        assert_eq!(calls.load(Ordering::SeqCst), 7);
    }

    #[tokio::test]
    async fn test_retry_returns_payload_once_ready() {
        let calls = &AtomicU32::new(0);
        let result = quick_policy(10)
            .run(|| async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Ok(Attempt::NotReady("quota".to_string()))
                } else {
                    Ok(Attempt::Ready(vec!["a".to_string(), "b".to_string()]))
                }
            })
            .await;

        assert_eq!(result, Ok(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_does_not_retry_errors() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), _> = quick_policy(10)
            .run(|| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(SheetError::NoDocumentOpen)
            })
            .await;

        assert_eq!(result, Err(SheetError::NoDocumentOpen));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_waits_between_attempts_only() {
        let start = tokio::time::Instant::now();
        let result: Result<(), _> = RetryPolicy::new(3, Duration::from_secs(10))
            .run(|| async { Ok(Attempt::NotReady("quota".to_string())) })
            .await;

        assert_eq!(result, Err(SheetError::RetriesExhausted { attempts: 3 }));
        assert_eq!(start.elapsed(), Duration::from_secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_cancel_interrupts_wait() {
        let cancel = CancelHandle::default();
        let policy = RetryPolicy::new(500, Duration::from_secs(10)).with_cancel(cancel.clone());
        let calls = &AtomicU32::new(0);

        let run = policy.run(|| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<Attempt<()>, SheetError>(Attempt::NotReady("quota".to_string()))
        });
        let abort = async {
            tokio::time::sleep(Duration::from_secs(25)).await;
            cancel.cancel();
        };
        let (result, ()) = tokio::join!(run, abort);

        assert_eq!(result, Err(SheetError::Cancelled));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_skips_op_when_already_cancelled() {
        let cancel = CancelHandle::default();
        cancel.cancel();
        let result: Result<(), _> = quick_policy(5)
            .with_cancel(cancel)
            .run(|| async { Ok(Attempt::Ready(())) })
            .await;

        assert_eq!(result, Err(SheetError::Cancelled));
    }
}
