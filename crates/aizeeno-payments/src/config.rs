//! Payment Provider Configuration
//!
//! Fetched once per process start and treated as immutable afterwards. Never
//! persisted; every start fetches it again.

use std::collections::BTreeMap;

use aizeeno_core::{RequestOptions, RetryingRequester};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PaymentError, Result};

pub const STRIPE_CONFIG_PATH: &str = "/api/stripe-config";

/// Publishable key mode, derived from its prefix
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyMode {
    Test,
    Live,
    Unknown,
}

impl KeyMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::Live => "live",
            Self::Unknown => "unknown",
        }
    }
}

/// Publishable key plus the plan → price table
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentConfig {
    #[serde(rename = "publishableKey")]
    pub publishable_key: String,

    #[serde(rename = "prices", default)]
    pub price_table: BTreeMap<String, String>,
}

impl PaymentConfig {
    /// Fetch with the context's config-fetch retry policy
    pub async fn fetch(requester: &RetryingRequester) -> Result<Self> {
        let policy = requester.context().config_fetch;
        let payload = requester
            .fetch_with_retries(STRIPE_CONFIG_PATH, &RequestOptions::get(), policy)
            .await?;
        Self::from_payload(&payload)
    }

    /// Validate a config response; a missing or blank key is unusable
    pub fn from_payload(payload: &Value) -> Result<Self> {
        let publishable_key = payload
            .get("publishableKey")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                PaymentError::CheckoutUnavailable("payment config has no publishable key".into())
            })?
            .to_string();

        let price_table = payload
            .get("prices")
            .and_then(Value::as_object)
            .map(|prices| {
                prices
                    .iter()
                    .filter_map(|(plan, price)| {
                        price.as_str().map(|price| (plan.clone(), price.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            publishable_key,
            price_table,
        })
    }

    pub fn key_mode(&self) -> KeyMode {
        if self.publishable_key.starts_with("pk_test") {
            KeyMode::Test
        } else if self.publishable_key.starts_with("pk_live") {
            KeyMode::Live
        } else {
            KeyMode::Unknown
        }
    }

    /// Price identifier for a plan, if the table lists it
    pub fn price_for(&self, plan_id: &str) -> Option<&str> {
        self.price_table.get(plan_id).map(String::as_str)
    }

    /// Blank plans are rejected; an empty price table accepts any other plan
    pub fn accepts_plan(&self, plan_id: &str) -> bool {
        !plan_id.trim().is_empty()
            && (self.price_table.is_empty() || self.price_table.contains_key(plan_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_payload() {
        let config = PaymentConfig::from_payload(&json!({
            "publishableKey": "pk_test_abc",
            "prices": { "starter": "price_1", "pro": "price_2", "bogus": 7 }
        }))
        .unwrap();

        assert_eq!(config.key_mode(), KeyMode::Test);
        assert_eq!(config.price_for("pro"), Some("price_2"));
        assert_eq!(config.price_for("bogus"), None);
        assert!(config.accepts_plan("starter"));
        assert!(!config.accepts_plan("enterprise"));
        assert!(!config.accepts_plan(""));
    }

    #[test]
    fn test_missing_key_is_unusable() {
        let err = PaymentConfig::from_payload(&json!({ "prices": {} })).unwrap_err();
        assert!(matches!(err, PaymentError::CheckoutUnavailable(_)));

        let err = PaymentConfig::from_payload(&json!({ "publishableKey": "  " })).unwrap_err();
        assert!(matches!(err, PaymentError::CheckoutUnavailable(_)));
    }

    #[test]
    fn test_empty_price_table_accepts_any_plan() {
        let config = PaymentConfig::from_payload(&json!({ "publishableKey": "pk_live_x" })).unwrap();
        assert_eq!(config.key_mode(), KeyMode::Live);
        assert!(config.accepts_plan("starter"));
    }
}
