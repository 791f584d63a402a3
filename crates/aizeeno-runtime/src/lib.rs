//! # aizeeno-runtime
//!
//! Native implementations for the aizeeno client.
//!
//! - **ReqwestClient**: `HttpJsonClient` over reqwest with a request timeout
//! - **FileUserStore**: the persisted user record as a JSON file
//!
//! ## Usage
//!
//! ```rust,ignore
//! use aizeeno_runtime::{FileUserStore, ReqwestClient, RuntimeSettings};
//!
//! let settings = RuntimeSettings::from_env();
//! let client = Arc::new(ReqwestClient::new(&settings)?);
//! let store = Arc::new(FileUserStore::new(&settings.state_dir));
//! let requester = RetryingRequester::new(client, Arc::new(ClientContext::from_env()));
//! ```

pub mod http;
pub mod settings;
pub mod store;

pub use http::ReqwestClient;
pub use settings::RuntimeSettings;
pub use store::FileUserStore;

// Re-export core types for convenience
pub use aizeeno_core::{ClientContext, RetryPolicy, RetryingRequester};
