//! Checkout Session Initiation
//!
//! Drives one checkout click through `Idle -> Submitting -> {Redirecting | Failed}`:
//! create a session on the backend, pull the session id out of the response,
//! and hand it to the external payment page.
//!
//! ```text
//! ┌────────┐ click ┌────────────┐ session id ┌─────────────┐
//! │  Idle  │──────▶│ Submitting │───────────▶│ Redirecting │──▶ payment page
//! └────────┘       └─────┬──────┘            └─────────────┘
//!      ▲                 │ error
//!      │           ┌─────▼──────┐
//!      └───────────│   Failed   │ (trigger re-enabled)
//!                  └────────────┘
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use aizeeno_core::{RequestOptions, RetryingRequester};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::config::PaymentConfig;
use crate::error::{PaymentError, Result};
use crate::session::UserStore;

pub const CREATE_CHECKOUT_SESSION_PATH: &str = "/api/create-checkout-session";

/// Response fields that may carry the session id, in order of preference
pub const SESSION_ID_FIELDS: [&str; 3] = ["sessionId", "id", "session_id"];

/// What the user asked to buy; lives only for one session-creation call
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutIntent {
    #[serde(rename = "plan")]
    pub plan_id: String,

    #[serde(rename = "username", skip_serializing_if = "Option::is_none")]
    pub initiating_username_id: Option<String>,
}

impl CheckoutIntent {
    pub fn request_body(&self) -> Value {
        let mut body = json!({ "plan": self.plan_id });
        if let Some(username) = &self.initiating_username_id {
            body["username"] = json!(username);
        }
        body
    }
}

/// Checkout trigger state
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CheckoutState {
    #[default]
    Idle,
    Submitting,
    Redirecting { session_id: String },
    Failed { message: String },
}

impl CheckoutState {
    /// Whether the trigger may be clicked
    pub const fn is_interactive(&self) -> bool {
        matches!(self, Self::Idle | Self::Failed { .. })
    }
}

/// External payment page hand-off
#[async_trait]
pub trait PaymentRedirect: Send + Sync {
    async fn redirect_to_checkout(&self, publishable_key: &str, session_id: &str) -> Result<()>;
}

/// First non-empty session id among [`SESSION_ID_FIELDS`]
pub fn extract_session_id(payload: &Value) -> Option<String> {
    SESSION_ID_FIELDS.iter().find_map(|field| {
        payload
            .get(*field)
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    })
}

/// Creates checkout sessions and hands off to the payment page
pub struct CheckoutSessionInitiator {
    requester: RetryingRequester,
    config: PaymentConfig,
    store: Arc<dyn UserStore>,
    redirect: Arc<dyn PaymentRedirect>,
    state: Mutex<CheckoutState>,
}

impl CheckoutSessionInitiator {
    pub fn new(
        requester: RetryingRequester,
        config: PaymentConfig,
        store: Arc<dyn UserStore>,
        redirect: Arc<dyn PaymentRedirect>,
    ) -> Self {
        Self {
            requester,
            config,
            store,
            redirect,
            state: Mutex::new(CheckoutState::Idle),
        }
    }

    pub const fn config(&self) -> &PaymentConfig {
        &self.config
    }

    pub fn state(&self) -> CheckoutState {
        self.lock_state().clone()
    }

    /// Run one checkout click for `plan_id`
    ///
    /// Returns the session id once the payment page hand-off succeeded. On any
    /// error the state is left at `Failed` with the user-visible message.
    pub async fn start_checkout(&self, plan_id: &str) -> Result<String> {
        {
            let state = self.lock_state();
            if *state == CheckoutState::Submitting {
                return Err(PaymentError::CheckoutInProgress);
            }
        }

        let Some(user) = self.store.get() else {
            return Err(self.fail(PaymentError::Unauthenticated));
        };

        if !self.config.accepts_plan(plan_id) {
            return Err(self.fail(PaymentError::UnknownPlan(plan_id.to_string())));
        }

        {
            let mut state = self.lock_state();
            if *state == CheckoutState::Submitting {
                return Err(PaymentError::CheckoutInProgress);
            }
            *state = CheckoutState::Submitting;
        }

        let intent = CheckoutIntent {
            plan_id: plan_id.to_string(),
            initiating_username_id: Some(user.username_id).filter(|u| !u.is_empty()),
        };

        match self.submit(&intent).await {
            Ok(session_id) => {
                tracing::info!(plan = %intent.plan_id, session_id = %session_id, "Redirecting to payment page");
                *self.lock_state() = CheckoutState::Redirecting {
                    session_id: session_id.clone(),
                };
                Ok(session_id)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    async fn submit(&self, intent: &CheckoutIntent) -> Result<String> {
        let policy = self.requester.context().checkout;
        let payload = self
            .requester
            .fetch_with_retries(
                CREATE_CHECKOUT_SESSION_PATH,
                &RequestOptions::post_json(intent.request_body()),
                policy,
            )
            .await?;

        let session_id = extract_session_id(&payload).ok_or(PaymentError::MalformedSessionResponse)?;

        self.redirect
            .redirect_to_checkout(&self.config.publishable_key, &session_id)
            .await?;

        Ok(session_id)
    }

    fn fail(&self, err: PaymentError) -> PaymentError {
        let message = checkout_message(&err);
        tracing::warn!(error = %err, "Checkout failed");
        *self.lock_state() = CheckoutState::Failed { message };
        err
    }

    fn lock_state(&self) -> MutexGuard<'_, CheckoutState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// User-visible text for a failed checkout
pub fn checkout_message(err: &PaymentError) -> String {
    match err {
        PaymentError::Request(inner) => format!("Unable to start checkout: {}", inner.reason()),
        PaymentError::MalformedSessionResponse => {
            "Unable to start checkout: no session id returned from server".into()
        }
        other => other.user_message(),
    }
}

/// The checkout surface, enabled only when payment config loaded with a usable key
pub enum CheckoutSurface {
    Ready(Arc<CheckoutSessionInitiator>),
    Disabled(PaymentError),
}

impl CheckoutSurface {
    /// Load payment config, then build the initiator; any failure disables checkout
    pub async fn initialize(
        requester: RetryingRequester,
        store: Arc<dyn UserStore>,
        redirect: Arc<dyn PaymentRedirect>,
    ) -> Self {
        match PaymentConfig::fetch(&requester).await {
            Ok(config) => {
                tracing::info!(
                    key_mode = config.key_mode().as_str(),
                    plans = config.price_table.len(),
                    "Payment config loaded"
                );
                Self::Ready(Arc::new(CheckoutSessionInitiator::new(
                    requester, config, store, redirect,
                )))
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to load payment config; checkout disabled");
                Self::Disabled(match err {
                    PaymentError::Request(inner) => {
                        PaymentError::CheckoutUnavailable(inner.reason().to_string())
                    }
                    other => other,
                })
            }
        }
    }

    pub fn initiator(&self) -> Option<&Arc<CheckoutSessionInitiator>> {
        match self {
            Self::Ready(initiator) => Some(initiator),
            Self::Disabled(_) => None,
        }
    }

    pub const fn is_enabled(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}
