//! Runtime Settings

use std::path::PathBuf;
use std::time::Duration;

/// Native runtime configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeSettings {
    /// Per-request timeout; expiry counts as a transport failure
    pub request_timeout: Duration,

    /// Directory holding the persisted user record
    pub state_dir: PathBuf,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(15),
            state_dir: PathBuf::from(".aizeeno"),
        }
    }
}

impl RuntimeSettings {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let request_timeout = std::env::var("AIZEENO_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|secs| secs.parse().ok())
            .map_or(defaults.request_timeout, Duration::from_secs);
        let state_dir = std::env::var("AIZEENO_STATE_DIR")
            .ok()
            .filter(|dir| !dir.trim().is_empty())
            .map_or(defaults.state_dir, PathBuf::from);

        Self {
            request_timeout,
            state_dir,
        }
    }
}
