//! # aizeeno-core
//!
//! Network plumbing shared by the aizeeno client: a transport-agnostic
//! HTTP JSON interface, the response classification rules, and a bounded
//! retrying requester.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │                  RetryingRequester                     │
//! │  ┌──────────────┐  ┌───────────────┐  ┌────────────┐  │
//! │  │ ClientContext│  │ HttpJsonClient│  │  Sleeper   │  │
//! │  │ (base URL,   │──│  (Strategy)   │──│ (backoff)  │  │
//! │  │  policies)   │  └───────────────┘  └────────────┘  │
//! │  └──────────────┘                                      │
//! └───────────────────────────────────────────────────────┘
//! ```
//!
//! The `HttpJsonClient` trait lets the same workflow run over reqwest or a
//! scripted double without changes.

pub mod context;
pub mod error;
pub mod retry;
pub mod transport;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use context::{ClientContext, RetryPolicy};
pub use error::{ClientError, Result, TransportError};
pub use retry::{RetryingRequester, Sleeper, TokioSleeper};
pub use transport::{
    Failure, FailureKind, HttpJsonClient, HttpMethod, RequestOptions, RequestOutcome,
};
