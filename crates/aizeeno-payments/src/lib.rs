//! # aizeeno-payments
//!
//! Checkout and payment confirmation for the aizeeno client.
//!
//! ## Flow
//!
//! ```text
//! ┌─────────────┐     ┌─────────────────┐     ┌─────────────┐
//! │  Checkout   │────▶│  Stripe Hosted  │────▶│   Return    │
//! │  Initiator  │     │  Checkout Page  │     │  Verifier   │
//! └─────────────┘     └─────────────────┘     └─────────────┘
//!        │                                           │
//!        └────────────── LocalUserStore ◀────────────┘
//! ```
//!
//! 1. [`CheckoutSurface::initialize`] loads the payment config once; without a
//!    usable publishable key the whole surface stays disabled.
//! 2. [`CheckoutSessionInitiator::start_checkout`] creates a session and hands
//!    its id to the [`PaymentRedirect`].
//! 3. On the next start, [`ReturnVerifier::verify`] sees `session_id` on the
//!    location, asks the backend, and merges the result into the [`UserStore`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use aizeeno_payments::{CheckoutSurface, ReturnVerifier};
//!
//! let outcome = ReturnVerifier::new(requester.clone(), store.clone())
//!     .verify(&location)
//!     .await;
//!
//! if let CheckoutSurface::Ready(initiator) =
//!     CheckoutSurface::initialize(requester, store, redirect).await
//! {
//!     initiator.start_checkout("pro").await?;
//! }
//! ```

mod checkout;
mod config;
mod error;
mod session;
mod verify;

pub use checkout::{
    CheckoutIntent, CheckoutSessionInitiator, CheckoutState, CheckoutSurface, PaymentRedirect,
    CREATE_CHECKOUT_SESSION_PATH, SESSION_ID_FIELDS, checkout_message, extract_session_id,
};
pub use config::{KeyMode, PaymentConfig, STRIPE_CONFIG_PATH};
pub use error::{PaymentError, Result};
pub use session::{
    MemoryUserStore, SessionUpdate, USER_STORAGE_KEY, UserSession, UserStore, record_login,
};
pub use verify::{PAYMENT_STATUS_PATH, ReturnQuery, ReturnVerifier, VerificationOutcome};
