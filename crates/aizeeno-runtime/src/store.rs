//! File-Backed User Store
//!
//! Persists the single user record as JSON under the state directory, keyed by
//! the fixed storage name. An unreadable or unwritable store behaves as absent.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use aizeeno_payments::{USER_STORAGE_KEY, UserSession, UserStore};
use thiserror::Error;

#[derive(Error, Debug)]
enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// User record stored at `<dir>/aizeeno_user.json`
#[derive(Clone, Debug)]
pub struct FileUserStore {
    path: PathBuf,
}

impl FileUserStore {
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        Self {
            path: state_dir.as_ref().join(format!("{USER_STORAGE_KEY}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Option<UserSession>, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&text)?))
    }

    fn write(&self, session: &UserSession) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(session)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl UserStore for FileUserStore {
    fn get(&self) -> Option<UserSession> {
        self.read().unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "User store unreadable; treating as signed out");
            None
        })
    }

    fn set(&self, session: &UserSession) {
        if let Err(e) = self.write(session) {
            tracing::warn!(path = %self.path.display(), error = %e, "User store unwritable; session not saved");
        }
    }
}
