//! HTTP JSON Transport
//!
//! Defines the interface every HTTP implementation provides to the retry layer,
//! plus the shared rules for turning a raw response into a [`RequestOutcome`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use aizeeno_core::transport::{HttpJsonClient, RequestOptions};
//!
//! let outcome = client.request("http://127.0.0.1:5000/api/stripe-config", &RequestOptions::get()).await?;
//! ```
//!
//! Implementations must resolve every HTTP response to an outcome, including
//! 4xx/5xx and unparseable bodies. Only transport-level problems are returned
//! as `Err`.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TransportError;

/// HTTP method used by the client
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// Request options passed to a transport
#[derive(Clone, Debug, PartialEq)]
pub struct RequestOptions {
    pub method: HttpMethod,

    /// JSON body, sent with `Content-Type: application/json`
    pub body: Option<Value>,
}

impl RequestOptions {
    pub const fn get() -> Self {
        Self {
            method: HttpMethod::Get,
            body: None,
        }
    }

    pub const fn post_json(body: Value) -> Self {
        Self {
            method: HttpMethod::Post,
            body: Some(body),
        }
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::get()
    }
}

/// Category of a failed request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// Network unreachable, DNS, timeout
    Transport,

    /// 5xx response
    Server,

    /// 4xx response
    Client,

    /// Body could not be understood
    Malformed,
}

/// A failed request, as seen by the retry layer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: FailureKind,

    /// Human-readable reason (structured `error` field or `HTTP <status>`)
    pub reason: String,

    /// HTTP status, when a response was received
    pub status: Option<u16>,
}

impl Failure {
    pub fn transport(reason: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transport,
            reason: reason.into(),
            status: None,
        }
    }

    pub fn malformed(reason: impl Into<String>, status: Option<u16>) -> Self {
        Self {
            kind: FailureKind::Malformed,
            reason: reason.into(),
            status,
        }
    }

    /// Classify a non-success HTTP status
    pub fn from_status(status: u16, reason: impl Into<String>) -> Self {
        let kind = if (500..600).contains(&status) {
            FailureKind::Server
        } else {
            FailureKind::Client
        };
        Self {
            kind,
            reason: reason.into(),
            status: Some(status),
        }
    }

    /// Transport and server failures are worth another attempt
    pub const fn is_retryable(&self) -> bool {
        matches!(self.kind, FailureKind::Transport | FailureKind::Server)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reason)
    }
}

/// Discriminated result of a network call
#[derive(Clone, Debug, PartialEq)]
pub enum RequestOutcome {
    Success(Value),
    Failure(Failure),
}

/// HttpJsonClient strategy
///
/// Implement this for each HTTP stack (reqwest natively, a scripted double in tests).
#[async_trait]
pub trait HttpJsonClient: Send + Sync {
    /// Send a request to an absolute URL
    async fn request(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> std::result::Result<RequestOutcome, TransportError>;
}

/// True when a `Content-Type` header value declares JSON
pub fn is_json_content_type(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|value| {
        let mime = value.split(';').next().unwrap_or_default().trim();
        mime.eq_ignore_ascii_case("application/json")
            || mime.to_ascii_lowercase().ends_with("+json")
    })
}

/// Turn a fully-read response into an outcome
///
/// The body is read as text first so empty bodies never reach the JSON parser.
pub fn interpret_response(status: u16, content_type: Option<&str>, body: &str) -> RequestOutcome {
    let ok = (200..300).contains(&status);

    if body.trim().is_empty() {
        return if ok {
            RequestOutcome::Success(Value::Object(Map::new()))
        } else {
            RequestOutcome::Failure(Failure::from_status(status, format!("HTTP {status}")))
        };
    }

    if !is_json_content_type(content_type) {
        return if ok {
            RequestOutcome::Success(raw_payload(body))
        } else {
            RequestOutcome::Failure(Failure::from_status(status, format!("HTTP {status}")))
        };
    }

    let data: Value = match serde_json::from_str(body) {
        Ok(data) => data,
        Err(err) => {
            tracing::debug!(status, error = %err, "Response declared JSON but did not parse");
            return RequestOutcome::Failure(Failure::malformed(
                format!("Unparseable response body: {}", raw_payload(body)),
                Some(status),
            ));
        }
    };

    if ok {
        return RequestOutcome::Success(data);
    }

    let reason = data
        .get("error")
        .and_then(error_text)
        .unwrap_or_else(|| format!("HTTP {status}"));
    RequestOutcome::Failure(Failure::from_status(status, reason))
}

fn raw_payload(body: &str) -> Value {
    serde_json::json!({ "raw": body })
}

fn error_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Null | Value::String(_) => None,
        other => Some(other.to_string()),
    }
}
