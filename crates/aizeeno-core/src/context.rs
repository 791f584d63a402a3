//! Client Context
//!
//! Constructed once at application entry and shared by every component for the
//! lifetime of the process.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default backend when `AIZEENO_BACKEND_URL` is not set
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5000";

/// Bounded retry with pure exponential backoff
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Hard ceiling on attempts (values below 1 are treated as 1)
    pub max_attempts: u32,

    /// Delay after the first failed attempt, doubled after each later one
    pub initial_delay_ms: u64,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, initial_delay_ms: u64) -> Self {
        Self {
            max_attempts,
            initial_delay_ms,
        }
    }

    /// Single attempt, no backoff
    pub const fn once() -> Self {
        Self::new(1, 0)
    }

    pub const fn attempts(&self) -> u32 {
        if self.max_attempts == 0 { 1 } else { self.max_attempts }
    }

    /// Backoff after failed attempt `attempt` (1-based): `initial * 2^(attempt-1)`
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let factor = 2_u64.checked_pow(exponent).unwrap_or(u64::MAX);
        Duration::from_millis(self.initial_delay_ms.saturating_mul(factor))
    }
}

/// Process-wide client configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientContext {
    /// Prefixed to every non-absolute request path
    pub backend_base_url: String,

    /// Payment config fetch at startup; tolerant, the backend may be cold
    pub config_fetch: RetryPolicy,

    /// Checkout session creation; user-triggered, must fail fast
    pub checkout: RetryPolicy,

    /// Payment-status confirmation on return from the payment page
    pub payment_status: RetryPolicy,
}

impl Default for ClientContext {
    fn default() -> Self {
        Self::new(DEFAULT_BACKEND_URL)
    }
}

impl ClientContext {
    pub fn new(backend_base_url: impl Into<String>) -> Self {
        Self {
            backend_base_url: backend_base_url.into(),
            config_fetch: RetryPolicy::new(5, 300),
            checkout: RetryPolicy::new(3, 300),
            payment_status: RetryPolicy::new(3, 500),
        }
    }

    /// Read `AIZEENO_BACKEND_URL`, falling back to [`DEFAULT_BACKEND_URL`]
    pub fn from_env() -> Self {
        let base = std::env::var("AIZEENO_BACKEND_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.into());
        Self::new(base)
    }

    #[must_use]
    pub fn with_config_fetch(mut self, policy: RetryPolicy) -> Self {
        self.config_fetch = policy;
        self
    }

    #[must_use]
    pub fn with_checkout(mut self, policy: RetryPolicy) -> Self {
        self.checkout = policy;
        self
    }

    #[must_use]
    pub fn with_payment_status(mut self, policy: RetryPolicy) -> Self {
        self.payment_status = policy;
        self
    }

    /// Prefix the backend base URL unless `path` is already absolute
    pub fn resolve(&self, path: &str) -> String {
        if is_absolute(path) {
            return path.to_string();
        }
        let base = self.backend_base_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }
}

fn is_absolute(path: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| {
        path.get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}
