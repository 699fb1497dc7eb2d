//! Bounded retry with per-attempt timeout around any LlmClient

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::{CompletionRequest, CompletionResponse, LlmClient, LlmError};
use crate::config::LlmConfig;

/// Longest wait honoured from a provider's retry-after
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Retry policy for transient provider failures
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,

    /// Backoff before the first retry; doubled for each further retry
    pub initial_backoff: Duration,

    /// Upper bound for a single attempt
    pub attempt_timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_backoff: config.initial_backoff(),
            attempt_timeout: config.timeout(),
        }
    }

    /// Delay before retry number `attempt` (1-based), with +/-20% jitter
    pub fn backoff(&self, attempt: u32, err: &LlmError) -> Duration {
        if let Some(retry_after) = err.retry_after() {
            return retry_after.min(MAX_RETRY_AFTER);
        }
        let base = self.initial_backoff.saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)));
        let jitter: f64 = rand::random_range(0.8..1.2);
        base.mul_f64(jitter)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&LlmConfig::default())
    }
}

/// Wraps a provider so every call is bounded in time and retried on
/// retryable errors
pub struct RetryingClient {
    inner: Arc<dyn LlmClient>,
    policy: RetryPolicy,
}

impl RetryingClient {
    pub fn new(inner: Arc<dyn LlmClient>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl LlmClient for RetryingClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(max_retries = self.policy.max_retries, "RetryingClient::complete: called");
        let mut attempt = 0u32;

        loop {
            let outcome = match tokio::time::timeout(self.policy.attempt_timeout, self.inner.complete(request.clone()))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(LlmError::Timeout(self.policy.attempt_timeout)),
            };

            match outcome {
                Ok(response) => {
                    if attempt > 0 {
                        info!(attempt, "RetryingClient::complete: succeeded after retry");
                    }
                    return Ok(response);
                }
                Err(e) if e.is_retryable() && attempt < self.policy.max_retries => {
                    attempt += 1;
                    let delay = self.policy.backoff(attempt, &e);
                    warn!(
                        attempt,
                        max_retries = self.policy.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "RetryingClient::complete: retrying after transient error"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    warn!(attempt, retryable = e.is_retryable(), error = %e, "RetryingClient::complete: giving up");
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::mock::{MockLlmClient, MockReply};

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            initial_backoff: Duration::from_millis(1),
            attempt_timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn test_retries_transient_errors_then_succeeds() {
        let mock = Arc::new(MockLlmClient::new(vec![
            MockReply::Status(503),
            MockReply::Status(500),
            MockReply::Text("ok".to_string()),
        ]));
        let client = RetryingClient::new(mock.clone(), fast_policy(3));

        assert_eq!(client.generate("p", 10).await.unwrap(), "ok");
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_does_not_retry_client_errors() {
        let mock = Arc::new(MockLlmClient::new(vec![
            MockReply::Status(400),
            MockReply::Text("never".to_string()),
        ]));
        let client = RetryingClient::new(mock.clone(), fast_policy(3));

        let err = client.generate("p", 10).await.unwrap_err();
        assert!(matches!(err, LlmError::ApiError { status: 400, .. }));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let mock = Arc::new(MockLlmClient::new(vec![MockReply::Status(503); 5]));
        let client = RetryingClient::new(mock.clone(), fast_policy(2));

        assert!(client.generate("p", 10).await.is_err());
        assert_eq!(mock.call_count(), 3);
    }

    struct SlowClient;

    #[async_trait]
    impl LlmClient for SlowClient {
        async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(CompletionResponse::text("late"))
        }
    }

    #[tokio::test]
    async fn test_attempt_timeout_is_enforced() {
        let policy = RetryPolicy {
            max_retries: 0,
            initial_backoff: Duration::from_millis(1),
            attempt_timeout: Duration::from_millis(20),
        };
        let client = RetryingClient::new(Arc::new(SlowClient), policy);

        let err = client.generate("p", 10).await.unwrap_err();
        assert!(matches!(err, LlmError::Timeout(_)));
    }

    #[test]
    fn test_backoff_grows_and_honours_retry_after() {
        let policy = RetryPolicy {
            max_retries: 3,
            initial_backoff: Duration::from_millis(1000),
            attempt_timeout: Duration::from_secs(1),
        };
        let transient = LlmError::Timeout(Duration::from_secs(1));

        let first = policy.backoff(1, &transient);
        let third = policy.backoff(3, &transient);
        assert!(first >= Duration::from_millis(800) && first <= Duration::from_millis(1200));
        assert!(third >= Duration::from_millis(3200) && third <= Duration::from_millis(4800));

        let limited = LlmError::RateLimited {
            retry_after: Duration::from_secs(600),
        };
        assert_eq!(policy.backoff(1, &limited), MAX_RETRY_AFTER);
    }
}
