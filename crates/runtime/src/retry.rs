//! Bounded retry with a fixed interval for remote-engine connections.

use crate::engine::{EngineError, EngineFailureCause};
use crate::error::RuntimeError;
use crate::metrics::BringUpMetrics;
use avatar_config::RetrySettings;
use std::future::Future;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: NonZeroU32,
    interval: Duration,
    timeout: Duration,
    metrics: Option<Arc<BringUpMetrics>>,
}

/// Bookkeeping for one `execute` call.
#[derive(Default)]
struct RetryState {
    attempts_made: u32,
    last_error: Option<RuntimeError>,
}

impl RetryPolicy {
    /// # Errors
    /// `InvalidRetryPolicy` when `max_attempts` is 0 or `timeout` is zero.
    pub fn new(max_attempts: u32, interval: Duration, timeout: Duration) -> Result<Self, RuntimeError> {
        let max_attempts = NonZeroU32::new(max_attempts).ok_or_else(|| {
            RuntimeError::InvalidRetryPolicy("max_attempts must be at least 1".to_string())
        })?;
        if timeout.is_zero() {
            return Err(RuntimeError::InvalidRetryPolicy(
                "timeout must be positive".to_string(),
            ));
        }
        Ok(Self {
            max_attempts,
            interval,
            timeout,
            metrics: None,
        })
    }

    pub fn from_settings(settings: &RetrySettings) -> Result<Self, RuntimeError> {
        settings
            .validate()
            .map_err(|e| RuntimeError::InvalidRetryPolicy(e.to_string()))?;
        Self::new(
            settings.max_attempts,
            seconds("interval_seconds", settings.interval_seconds)?,
            seconds("timeout_seconds", settings.timeout_seconds)?,
        )
    }

    pub fn with_metrics(mut self, metrics: Arc<BringUpMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts.get()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `action` until it succeeds, attempts run out, or `cancel` fires.
    ///
    /// The action receives the 1-based attempt number and must build all of
    /// its state from scratch. Auth failures stop the loop immediately.
    ///
    /// # Errors
    /// - `ConnectFailed` with the last failure once attempts are exhausted
    /// - `Timeout` when the last attempt exceeded the per-attempt timeout
    /// - `AuthFailed` when the engine rejects the credentials
    /// - `Cancelled` as soon as cancellation is observed while an attempt
    ///   is pending or between attempts
    pub async fn execute<T, F, Fut>(
        &self,
        cancel: &CancellationToken,
        mut action: F,
    ) -> Result<T, RuntimeError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, EngineError>>,
    {
        let max_attempts = self.max_attempts.get();
        let mut state = RetryState::default();

        while state.attempts_made < max_attempts {
            if cancel.is_cancelled() {
                return Err(RuntimeError::Cancelled);
            }

            state.attempts_made += 1;
            let attempt = state.attempts_made;
            debug!(attempt, max_attempts, "Remote connection attempt");
            if let Some(metrics) = &self.metrics {
                metrics.inc_remote_attempts();
            }

            // An attempt that is already complete wins over cancellation so its
            // value reaches the caller, which must release it if `cancel` fired.
            let outcome = tokio::select! {
                biased;
                result = tokio::time::timeout(self.timeout, action(attempt)) => result,
                _ = cancel.cancelled() => return Err(RuntimeError::Cancelled),
            };

            let error = match outcome {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) if e.cause == EngineFailureCause::Auth => {
                    self.record_failure(false);
                    warn!(attempt, error = %e, "Remote engine rejected credentials");
                    return Err(RuntimeError::AuthFailed(e.message));
                }
                Ok(Err(e)) => {
                    self.record_failure(false);
                    RuntimeError::ConnectFailed(e.to_string())
                }
                Err(_) => {
                    self.record_failure(true);
                    RuntimeError::Timeout(self.timeout)
                }
            };

            warn!(attempt, max_attempts, error = %error, "Remote connection attempt failed");
            state.last_error = Some(error);

            if attempt < max_attempts {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(RuntimeError::Cancelled),
                    _ = tokio::time::sleep(self.interval) => {}
                }
            }
        }

        Err(state.last_error.unwrap_or_else(|| {
            RuntimeError::ConnectFailed("no connection attempt was made".to_string())
        }))
    }

    fn record_failure(&self, timed_out: bool) {
        if let Some(metrics) = &self.metrics {
            metrics.inc_remote_failures();
            if timed_out {
                metrics.inc_timeouts();
            }
        }
    }
}

fn seconds(field: &str, value: f64) -> Result<Duration, RuntimeError> {
    Duration::try_from_secs_f64(value).map_err(|e| {
        RuntimeError::InvalidRetryPolicy(format!("{} out of range ({}): {}", field, value, e))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(
            max_attempts,
            Duration::from_millis(5),
            Duration::from_millis(200),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_succeeds_on_third_attempt() {
        let calls = AtomicU32::new(0);
        let result = policy(3)
            .execute(&CancellationToken::new(), |_| {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 3 {
                        Err(EngineError::network("refused"))
                    } else {
                        Ok("connected")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "connected");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_raises_connect_failed() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = policy(3)
            .execute(&CancellationToken::new(), |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(EngineError::network("refused")) }
            })
            .await;

        match result {
            Err(RuntimeError::ConnectFailed(msg)) => assert!(msg.contains("refused")),
            other => panic!("Expected ConnectFailed, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_attempt_numbers_are_passed() {
        let seen = std::sync::Mutex::new(Vec::new());
        let _: Result<(), _> = policy(4)
            .execute(&CancellationToken::new(), |attempt| {
                seen.lock().unwrap().push(attempt);
                async { Err(EngineError::other("boom")) }
            })
            .await;
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_slow_attempt_times_out() {
        let retry = RetryPolicy::new(2, Duration::ZERO, Duration::from_millis(20)).unwrap();
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry
            .execute(&CancellationToken::new(), |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok(())
                }
            })
            .await;

        assert!(matches!(result, Err(RuntimeError::Timeout(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_auth_failure_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = policy(5)
            .execute(&CancellationToken::new(), |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(EngineError::auth("bad secret")) }
            })
            .await;

        assert!(matches!(result, Err(RuntimeError::AuthFailed(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = policy(3)
            .execute(&cancel, |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            })
            .await;

        assert!(matches!(result, Err(RuntimeError::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_during_interval_stops_loop() {
        let retry = RetryPolicy::new(3, Duration::from_secs(30), Duration::from_secs(1)).unwrap();
        let cancel = CancellationToken::new();
        let calls = AtomicU32::new(0);

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let result: Result<(), _> = retry
            .execute(&cancel, |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(EngineError::network("down")) }
            })
            .await;

        assert!(matches!(result, Err(RuntimeError::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_value_completed_with_cancellation_is_returned() {
        let cancel = CancellationToken::new();
        let result = policy(3)
            .execute(&cancel, |_| {
                let cancel = cancel.clone();
                async move {
                    cancel.cancel();
                    Ok::<_, EngineError>("session")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "session");
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let result = RetryPolicy::new(0, Duration::ZERO, Duration::from_secs(1));
        assert!(matches!(result, Err(RuntimeError::InvalidRetryPolicy(_))));
    }

    #[test]
    fn test_from_settings() {
        let settings = RetrySettings {
            max_attempts: 3,
            interval_seconds: 0.5,
            timeout_seconds: 10.0,
        };
        let retry = RetryPolicy::from_settings(&settings).unwrap();
        assert_eq!(retry.max_attempts(), 3);
        assert_eq!(retry.interval(), Duration::from_millis(500));
        assert_eq!(retry.timeout(), Duration::from_secs(10));

        let invalid = RetrySettings {
            max_attempts: 0,
            ..settings
        };
        assert!(matches!(
            RetryPolicy::from_settings(&invalid),
            Err(RuntimeError::InvalidRetryPolicy(_))
        ));
    }

    #[test]
    fn test_oversized_timeout_is_an_error() {
        let settings = RetrySettings {
            max_attempts: 3,
            interval_seconds: 0.5,
            timeout_seconds: 1e20,
        };
        assert!(matches!(
            RetryPolicy::from_settings(&settings),
            Err(RuntimeError::InvalidRetryPolicy(_))
        ));
        assert!(matches!(
            seconds("timeout_seconds", 1e20),
            Err(RuntimeError::InvalidRetryPolicy(_))
        ));
        assert_eq!(
            seconds("interval_seconds", 1.5).unwrap(),
            Duration::from_millis(1500)
        );
    }

    #[tokio::test]
    async fn test_metrics_are_recorded() {
        let metrics = BringUpMetrics::new();
        let retry = RetryPolicy::new(2, Duration::ZERO, Duration::from_secs(1))
            .unwrap()
            .with_metrics(metrics.clone());
        let _: Result<(), _> = retry
            .execute(&CancellationToken::new(), |_| async {
                Err(EngineError::network("down"))
            })
            .await;

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.remote_attempts, 2);
        assert_eq!(snapshot.remote_failures, 2);
        assert_eq!(snapshot.timeouts, 0);
    }
}
