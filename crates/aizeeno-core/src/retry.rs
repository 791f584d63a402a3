//! Retrying Requester
//!
//! Wraps an [`HttpJsonClient`] with a bounded number of attempts and pure
//! exponential backoff (no jitter). Success short-circuits; a non-retryable
//! failure aborts immediately; the attempt ceiling is never exceeded.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::context::{ClientContext, RetryPolicy};
use crate::error::{ClientError, Result};
use crate::transport::{Failure, HttpJsonClient, RequestOptions, RequestOutcome};

/// Suspension point between attempts
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Retry wrapper around an [`HttpJsonClient`]
#[derive(Clone)]
pub struct RetryingRequester {
    client: Arc<dyn HttpJsonClient>,
    context: Arc<ClientContext>,
    sleeper: Arc<dyn Sleeper>,
}

impl RetryingRequester {
    pub fn new(client: Arc<dyn HttpJsonClient>, context: Arc<ClientContext>) -> Self {
        Self {
            client,
            context,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Replace the sleeper (tests record delays instead of waiting)
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn context(&self) -> &ClientContext {
        &self.context
    }

    /// Request `path` until it succeeds, fails non-retryably, or runs out of attempts
    pub async fn fetch_with_retries(
        &self,
        path: &str,
        options: &RequestOptions,
        policy: RetryPolicy,
    ) -> Result<Value> {
        let url = self.context.resolve(path);
        let attempts = policy.attempts();
        let mut last = None;

        for attempt in 1..=attempts {
            if attempt > 1 {
                tracing::debug!(url = %url, attempt, attempts, "Retrying request");
            }

            let failure = match self.client.request(&url, options).await {
                Ok(RequestOutcome::Success(payload)) => return Ok(payload),
                Ok(RequestOutcome::Failure(failure)) => failure,
                Err(err) => Failure::transport(err.0),
            };

            if !failure.is_retryable() {
                tracing::debug!(url = %url, attempt, reason = %failure, "Request rejected");
                return Err(ClientError::Rejected(failure));
            }

            if attempt < attempts {
                let delay = policy.delay_after(attempt);
                tracing::warn!(
                    url = %url,
                    attempt,
                    attempts,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    reason = %failure,
                    "Request failed, backing off"
                );
                self.sleeper.sleep(delay).await;
            }
            last = Some(failure);
        }

        let last = last.unwrap_or_else(|| Failure::transport("no attempt was made"));
        tracing::warn!(url = %url, attempts, reason = %last, "Retries exhausted");
        Err(ClientError::ExhaustedRetries { attempts, last })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::testing::{RecordingSleeper, ScriptedClient};
    use crate::transport::FailureKind;
    use serde_json::json;

    fn requester(client: &Arc<ScriptedClient>, sleeper: &Arc<RecordingSleeper>) -> RetryingRequester {
        RetryingRequester::new(
            client.clone(),
            Arc::new(ClientContext::new("http://backend.test")),
        )
        .with_sleeper(sleeper.clone())
    }

    fn server_error() -> RequestOutcome {
        RequestOutcome::Failure(Failure::from_status(503, "HTTP 503"))
    }

    #[tokio::test]
    async fn test_succeeds_on_final_attempt_with_doubling_delays() {
        let client = Arc::new(ScriptedClient::new());
        client.push_outcome(server_error());
        client.push_error(TransportError::new("connection refused"));
        client.push_outcome(server_error());
        client.push_outcome(RequestOutcome::Success(json!({ "ok": true })));
        let sleeper = Arc::new(RecordingSleeper::default());

        let payload = requester(&client, &sleeper)
            .fetch_with_retries("/api/stripe-config", &RequestOptions::get(), RetryPolicy::new(4, 100))
            .await
            .unwrap();

        assert_eq!(payload, json!({ "ok": true }));
        assert_eq!(client.call_count(), 4);
        assert_eq!(
            sleeper.delays(),
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(400),
            ]
        );
    }

    #[tokio::test]
    async fn test_first_attempt_success_never_sleeps() {
        let client = Arc::new(ScriptedClient::new());
        client.push_outcome(RequestOutcome::Success(json!({})));
        let sleeper = Arc::new(RecordingSleeper::default());

        requester(&client, &sleeper)
            .fetch_with_retries("/x", &RequestOptions::get(), RetryPolicy::new(5, 300))
            .await
            .unwrap();

        assert_eq!(client.call_count(), 1);
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn test_non_retryable_aborts_after_one_attempt() {
        let client = Arc::new(ScriptedClient::new());
        client.set_fallback(RequestOutcome::Failure(Failure::from_status(400, "Plan is required")));
        let sleeper = Arc::new(RecordingSleeper::default());

        let err = requester(&client, &sleeper)
            .fetch_with_retries("/api/create-checkout-session", &RequestOptions::get(), RetryPolicy::new(3, 300))
            .await
            .unwrap_err();

        assert_eq!(client.call_count(), 1);
        assert!(sleeper.delays().is_empty());
        assert!(matches!(err, ClientError::Rejected(_)));
        assert_eq!(err.reason(), "Plan is required");
    }

    #[tokio::test]
    async fn test_exhausted_retries_carry_last_failure() {
        let client = Arc::new(ScriptedClient::new());
        client.push_outcome(RequestOutcome::Failure(Failure::from_status(500, "first")));
        client.push_outcome(RequestOutcome::Failure(Failure::from_status(502, "second")));
        client.push_outcome(RequestOutcome::Failure(Failure::from_status(503, "third")));
        let sleeper = Arc::new(RecordingSleeper::default());

        let err = requester(&client, &sleeper)
            .fetch_with_retries("/x", &RequestOptions::get(), RetryPolicy::new(3, 50))
            .await
            .unwrap_err();

        assert_eq!(client.call_count(), 3);
        // no sleep after the final attempt
        assert_eq!(sleeper.delays().len(), 2);
        match err {
            ClientError::ExhaustedRetries { attempts, last } => {
                assert_eq!(attempts, 3);
                assert_eq!(last.reason, "third");
                assert_eq!(last.status, Some(503));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_transport_error_is_retryable() {
        let client = Arc::new(ScriptedClient::new());
        client.set_fallback_error(TransportError::new("dns failure"));
        let sleeper = Arc::new(RecordingSleeper::default());

        let err = requester(&client, &sleeper)
            .fetch_with_retries("/x", &RequestOptions::get(), RetryPolicy::new(2, 10))
            .await
            .unwrap_err();

        assert_eq!(client.call_count(), 2);
        assert_eq!(err.failure().kind, FailureKind::Transport);
        assert_eq!(err.reason(), "dns failure");
    }

    #[tokio::test]
    async fn test_relative_path_resolved_against_base() {
        let client = Arc::new(ScriptedClient::new());
        client.set_fallback(RequestOutcome::Success(json!({})));
        let sleeper = Arc::new(RecordingSleeper::default());
        let requester = requester(&client, &sleeper);

        requester
            .fetch_with_retries("/api/stripe-config", &RequestOptions::get(), RetryPolicy::once())
            .await
            .unwrap();
        requester
            .fetch_with_retries("https://elsewhere.test/api/x", &RequestOptions::get(), RetryPolicy::once())
            .await
            .unwrap();

        let urls: Vec<String> = client.requests().into_iter().map(|r| r.url).collect();
        assert_eq!(
            urls,
            vec![
                "http://backend.test/api/stripe-config".to_string(),
                "https://elsewhere.test/api/x".to_string(),
            ]
        );
    }
}
