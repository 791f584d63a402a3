//! Return-from-Checkout Verification
//!
//! Runs once at startup. When the location carries a `session_id`, asks the
//! backend whether the payment went through and reconciles the local session.
//! The answer is three-way: confirmed, pending, or failed. Pending is not an
//! error; the provider may simply not have settled the payment yet.

use std::sync::Arc;

use aizeeno_core::{RequestOptions, RetryingRequester};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{PaymentError, Result};
use crate::session::{SessionUpdate, UserSession, UserStore};

pub const PAYMENT_STATUS_PATH: &str = "/api/payment-status";

const CONFIRMED_MESSAGE: &str = "Payment confirmed. Thank you!";
const PENDING_MESSAGE: &str = "Payment not confirmed yet. Please wait a few moments and refresh.";

/// Query parameters the payment provider appends to the return URL
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnQuery {
    pub session_id: String,
    pub plan_id: Option<String>,
}

impl ReturnQuery {
    /// Parse a location (absolute URL, path with query, or bare `?query`)
    ///
    /// Only the query component counts; a `?` inside the fragment does not.
    /// Returns `None` when there is no non-empty `session_id`, i.e. this is not
    /// a return from the payment page.
    pub fn from_location(location: &str) -> Option<Self> {
        let query = match url::Url::parse(location) {
            Ok(parsed) => parsed.query().map(str::to_string),
            Err(_) => location
                .split('#')
                .next()
                .and_then(|before_fragment| before_fragment.split_once('?'))
                .map(|(_, query)| query.to_string()),
        }?;

        let mut session_id = None;
        let mut plan_id = None;
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "session_id" if session_id.is_none() => session_id = Some(value.into_owned()),
                "plan" if plan_id.is_none() => plan_id = Some(value.into_owned()),
                _ => {}
            }
        }

        let session_id = session_id.filter(|id| !id.is_empty())?;
        Some(Self {
            session_id,
            plan_id: plan_id.filter(|plan| !plan.is_empty()),
        })
    }
}

/// Result of a verification run
#[derive(Clone, Debug)]
pub enum VerificationOutcome {
    /// No `session_id` on the location; nothing was done
    NotReturning,

    /// Payment confirmed and the local session updated
    Confirmed { session: UserSession, message: String },

    /// Backend knows the session but the payment has not settled
    Pending { payment_status: Option<String> },

    Failed(PaymentError),
}

impl VerificationOutcome {
    /// User-visible message, if there is anything to tell
    pub fn message(&self) -> Option<String> {
        match self {
            Self::NotReturning => None,
            Self::Confirmed { message, .. } => Some(message.clone()),
            Self::Pending { .. } => Some(PENDING_MESSAGE.into()),
            Self::Failed(PaymentError::Unauthenticated) => {
                Some("Please log in to verify your payment.".into())
            }
            Self::Failed(PaymentError::Rejected(reason)) => {
                Some(format!("Unable to verify payment: {reason}"))
            }
            Self::Failed(PaymentError::Request(err)) => {
                Some(format!("Unable to verify payment: {}", err.reason()))
            }
            Self::Failed(err) => Some(err.user_message()),
        }
    }

    pub const fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed { .. })
    }

    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }
}

/// Backend answer to a payment-status call
#[derive(Clone, Debug, PartialEq, Eq)]
enum PaymentStatus {
    Confirmed {
        tier: Option<String>,
        message: Option<String>,
    },
    Pending {
        payment_status: Option<String>,
    },
}

fn non_empty_str(payload: &Value, field: &str) -> Option<String> {
    payload
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_status(payload: &Value) -> Result<PaymentStatus> {
    match payload.get("success").and_then(Value::as_bool) {
        Some(true) => match payload.get("payment").and_then(Value::as_bool) {
            Some(true) => Ok(PaymentStatus::Confirmed {
                tier: non_empty_str(payload, "subscription"),
                message: non_empty_str(payload, "message"),
            }),
            Some(false) => Ok(PaymentStatus::Pending {
                payment_status: non_empty_str(payload, "payment_status"),
            }),
            None => Err(PaymentError::MalformedResponse(
                "payment-status response has no `payment` flag".into(),
            )),
        },
        Some(false) => Err(PaymentError::Rejected(
            non_empty_str(payload, "error").unwrap_or_else(|| "payment verification failed".into()),
        )),
        None => Err(PaymentError::MalformedResponse(
            "unknown payment verification response".into(),
        )),
    }
}

/// Confirms payment on return from the payment page
pub struct ReturnVerifier {
    requester: RetryingRequester,
    store: Arc<dyn UserStore>,
}

impl ReturnVerifier {
    pub fn new(requester: RetryingRequester, store: Arc<dyn UserStore>) -> Self {
        Self { requester, store }
    }

    /// Verify the current location; a no-op without `session_id`
    pub async fn verify(&self, location: &str) -> VerificationOutcome {
        match ReturnQuery::from_location(location) {
            Some(query) => self.verify_query(&query).await,
            None => VerificationOutcome::NotReturning,
        }
    }

    /// Safe to repeat for the same session: every write is a merge
    pub async fn verify_query(&self, query: &ReturnQuery) -> VerificationOutcome {
        tracing::debug!(session_id = %query.session_id, "Verifying returned checkout session");

        let Some(user) = self.store.get() else {
            tracing::warn!("No local user; cannot verify payment");
            return VerificationOutcome::Failed(PaymentError::Unauthenticated);
        };

        match self.confirm(&user, query).await {
            Ok(PaymentStatus::Confirmed { tier, message }) => {
                let tier = tier.or_else(|| query.plan_id.clone());
                let update = SessionUpdate::payment_confirmed(tier);
                let session = match self.store.get() {
                    Some(mut current) if current.username_id == user.username_id => {
                        current.merge(&update);
                        self.store.set(&current);
                        current
                    }
                    _ => {
                        tracing::warn!(
                            username = %user.username_id,
                            "Stored user changed during verification; not recording payment"
                        );
                        let mut merged = user;
                        merged.merge(&update);
                        merged
                    }
                };
                tracing::info!(
                    username = %session.username_id,
                    tier = session.subscription_tier.as_deref().unwrap_or("-"),
                    "Payment confirmed"
                );
                VerificationOutcome::Confirmed {
                    session,
                    message: message.unwrap_or_else(|| CONFIRMED_MESSAGE.into()),
                }
            }
            Ok(PaymentStatus::Pending { payment_status }) => {
                tracing::info!(session_id = %query.session_id, "Payment pending");
                VerificationOutcome::Pending { payment_status }
            }
            Err(err) => {
                tracing::warn!(error = %err, "Payment verification failed");
                VerificationOutcome::Failed(err)
            }
        }
    }

    async fn confirm(&self, user: &UserSession, query: &ReturnQuery) -> Result<PaymentStatus> {
        let mut body = json!({
            "username": user.username_id,
            "session_id": query.session_id,
        });
        if let Some(plan) = &query.plan_id {
            body["plan"] = json!(plan);
        }

        let policy = self.requester.context().payment_status;
        let payload = self
            .requester
            .fetch_with_retries(PAYMENT_STATUS_PATH, &RequestOptions::post_json(body), policy)
            .await?;
        parse_status(&payload)
    }
}
