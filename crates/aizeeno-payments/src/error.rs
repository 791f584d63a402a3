//! Payment Error Types

use aizeeno_core::ClientError;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Checkout and verification failures
#[derive(Error, Debug, Clone)]
pub enum PaymentError {
    /// No local user session
    #[error("No signed-in user")]
    Unauthenticated,

    /// Session creation succeeded but carried no session identifier
    #[error("Checkout session response had no session id")]
    MalformedSessionResponse,

    /// Backend answered with a shape we do not recognise
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Payment config could not be loaded or has no usable key
    #[error("Checkout unavailable: {0}")]
    CheckoutUnavailable(String),

    /// A checkout session is already being created
    #[error("Checkout already in progress")]
    CheckoutInProgress,

    /// Plan identifier is empty or absent from the price table
    #[error("Unknown plan: {0}")]
    UnknownPlan(String),

    /// The payment page hand-off reported an error
    #[error("Redirect to payment page failed: {0}")]
    Redirect(String),

    /// Backend answered `success: false`
    #[error("Rejected by backend: {0}")]
    Rejected(String),

    /// Network request failed after retry handling
    #[error("Request failed: {0}")]
    Request(#[from] ClientError),
}

impl PaymentError {
    /// Single user-visible message for this failure
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthenticated => "Please log in or sign up to continue.".into(),
            Self::MalformedSessionResponse | Self::MalformedResponse(_) => {
                "Something went wrong on our side. Please try again later.".into()
            }
            Self::CheckoutUnavailable(_) => {
                "Payments are unavailable right now. Please try again later.".into()
            }
            Self::CheckoutInProgress => "Checkout is already being started.".into(),
            Self::UnknownPlan(plan) => format!("The plan '{plan}' is not available."),
            Self::Redirect(msg) => format!("Unable to start checkout: {msg}"),
            Self::Rejected(msg) => format!("Unable to verify payment: {msg}"),
            Self::Request(err) => format!("Unable to reach the server: {}", err.reason()),
        }
    }
}
