//! Reqwest Transport
//!
//! Implementation of `HttpJsonClient` over reqwest.

use aizeeno_core::transport::interpret_response;
use aizeeno_core::{
    Failure, HttpJsonClient, HttpMethod, RequestOptions, RequestOutcome, TransportError,
};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

use crate::settings::RuntimeSettings;

/// HTTP JSON client backed by reqwest
#[derive(Clone, Debug)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Build a client with the configured request timeout
    pub fn new(settings: &RuntimeSettings) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| TransportError::new(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpJsonClient for ReqwestClient {
    async fn request(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<RequestOutcome, TransportError> {
        let mut builder = match options.method {
            HttpMethod::Get => self.client.get(url),
            HttpMethod::Post => self.client.post(url),
        };
        if let Some(body) = &options.body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            // a request that cannot be built will not build on the next attempt either
            Err(e) if e.is_builder() => {
                return Ok(RequestOutcome::Failure(Failure::malformed(
                    format!("Invalid request to {url}: {e}"),
                    None,
                )));
            }
            Err(e) => {
                tracing::debug!(url, method = options.method.as_str(), error = %e, "Transport failure");
                return Err(TransportError::new(e.to_string()));
            }
        };

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::new(e.to_string()))?;

        tracing::debug!(url, method = options.method.as_str(), status, "Response received");
        Ok(interpret_response(status, content_type.as_deref(), &body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aizeeno_core::FailureKind;
    use axum::{
        Json, Router,
        http::{StatusCode, header},
        response::IntoResponse,
        routing::{get, post},
    };
    use serde_json::{Value, json};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn stub() -> Router {
        Router::new()
            .route("/json", get(|| async { Json(json!({ "ok": true })) }))
            .route("/empty", get(|| async { StatusCode::OK }))
            .route("/gone", get(|| async { StatusCode::NOT_FOUND }))
            .route("/echo", post(|Json(body): Json<Value>| async move { Json(body) }))
            .route(
                "/bad-plan",
                get(|| async {
                    (StatusCode::BAD_REQUEST, Json(json!({ "error": "Plan is required" })))
                }),
            )
            .route(
                "/broken",
                get(|| async {
                    (StatusCode::OK, [(header::CONTENT_TYPE, "application/json")], "not json")
                        .into_response()
                }),
            )
            .route("/text", get(|| async { "pong" }))
    }

    fn client() -> ReqwestClient {
        ReqwestClient::new(&RuntimeSettings::default()).unwrap()
    }

    #[tokio::test]
    async fn test_json_and_empty_bodies() {
        let base = serve(stub()).await;
        let client = client();

        let outcome = client.request(&format!("{base}/json"), &RequestOptions::get()).await.unwrap();
        assert_eq!(outcome, RequestOutcome::Success(json!({ "ok": true })));

        let outcome = client.request(&format!("{base}/empty"), &RequestOptions::get()).await.unwrap();
        assert_eq!(outcome, RequestOutcome::Success(json!({})));

        let outcome = client.request(&format!("{base}/gone"), &RequestOptions::get()).await.unwrap();
        let RequestOutcome::Failure(failure) = outcome else {
            panic!("expected failure");
        };
        assert_eq!(failure.reason, "HTTP 404");
        assert!(!failure.is_retryable());
    }

    #[tokio::test]
    async fn test_post_sends_json_body() {
        let base = serve(stub()).await;
        let body = json!({ "plan": "pro", "username": "bob" });

        let outcome = client()
            .request(&format!("{base}/echo"), &RequestOptions::post_json(body.clone()))
            .await
            .unwrap();

        assert_eq!(outcome, RequestOutcome::Success(body));
    }

    #[tokio::test]
    async fn test_structured_and_malformed_failures() {
        let base = serve(stub()).await;
        let client = client();

        let outcome = client.request(&format!("{base}/bad-plan"), &RequestOptions::get()).await.unwrap();
        let RequestOutcome::Failure(failure) = outcome else {
            panic!("expected failure");
        };
        assert_eq!(failure.kind, FailureKind::Client);
        assert_eq!(failure.reason, "Plan is required");

        let outcome = client.request(&format!("{base}/broken"), &RequestOptions::get()).await.unwrap();
        let RequestOutcome::Failure(failure) = outcome else {
            panic!("expected failure");
        };
        assert_eq!(failure.kind, FailureKind::Malformed);

        let outcome = client.request(&format!("{base}/text"), &RequestOptions::get()).await.unwrap();
        assert_eq!(outcome, RequestOutcome::Success(json!({ "raw": "pong" })));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = client().request(&format!("http://{addr}/json"), &RequestOptions::get()).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_invalid_url_is_not_retryable() {
        let outcome = client().request("not a url", &RequestOptions::get()).await.unwrap();
        let RequestOutcome::Failure(failure) = outcome else {
            panic!("expected failure");
        };
        assert!(!failure.is_retryable());
    }
}
