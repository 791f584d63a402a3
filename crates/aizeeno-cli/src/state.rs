//! Application State

use std::sync::Arc;

use aizeeno_core::{ClientContext, RetryingRequester};
use aizeeno_payments::UserStore;
use aizeeno_runtime::{FileUserStore, ReqwestClient, RuntimeSettings};

/// Everything the commands share, built once at startup
#[derive(Clone)]
pub struct AppState {
    /// Base URL and retry policies
    pub context: Arc<ClientContext>,

    /// Retrying requester over the reqwest transport
    pub requester: RetryingRequester,

    /// Persisted user record
    pub store: Arc<dyn UserStore>,
}

impl AppState {
    pub fn new(context: ClientContext, settings: &RuntimeSettings) -> anyhow::Result<Self> {
        let context = Arc::new(context);
        let client = Arc::new(ReqwestClient::new(settings)?);
        let requester = RetryingRequester::new(client, context.clone());
        let store = Arc::new(FileUserStore::new(&settings.state_dir));

        tracing::debug!(
            backend = %context.backend_base_url,
            store = %store.path().display(),
            "Client state initialised"
        );

        Ok(Self {
            context,
            requester,
            store,
        })
    }
}
