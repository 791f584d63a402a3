//! Local User Session
//!
//! The single persisted user record that acts as client-side session truth.
//! Absence means unauthenticated; presence is a best-effort cache of what the
//! backend last told us.

use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fixed storage key for the persisted record
pub const USER_STORAGE_KEY: &str = "aizeeno_user";

/// Persisted user record
///
/// Field names match the record written by the login/signup flow.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserSession {
    #[serde(rename = "username")]
    pub username_id: String,

    #[serde(rename = "name", default)]
    pub display_name: String,

    #[serde(rename = "email", default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,

    #[serde(rename = "subscription", default, skip_serializing_if = "Option::is_none")]
    pub subscription_tier: Option<String>,

    #[serde(rename = "payment", default)]
    pub payment_confirmed: bool,

    /// Keys owned by other flows, carried through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserSession {
    pub fn new(username_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            username_id: username_id.into(),
            display_name: display_name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email_address = Some(email.into());
        self
    }

    /// Apply an update, leaving every field it does not name untouched
    pub fn merge(&mut self, update: &SessionUpdate) {
        if let Some(name) = &update.display_name {
            self.display_name.clone_from(name);
        }
        if let Some(email) = &update.email_address {
            self.email_address = Some(email.clone());
        }
        if let Some(tier) = &update.subscription_tier {
            self.subscription_tier = Some(tier.clone());
        }
        if let Some(confirmed) = update.payment_confirmed {
            self.payment_confirmed = confirmed;
        }
    }
}

/// Partial update for a merge-write
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionUpdate {
    pub display_name: Option<String>,
    pub email_address: Option<String>,
    pub subscription_tier: Option<String>,
    pub payment_confirmed: Option<bool>,
}

impl SessionUpdate {
    /// Update recorded when the backend confirms payment
    pub fn payment_confirmed(tier: Option<String>) -> Self {
        Self {
            subscription_tier: tier,
            payment_confirmed: Some(true),
            ..Default::default()
        }
    }
}

/// Storage for the single user record
///
/// Both operations are synchronous. An unavailable backing store reads as
/// absent and ignores writes; it is never fatal.
pub trait UserStore: Send + Sync {
    fn get(&self) -> Option<UserSession>;

    fn set(&self, session: &UserSession);

    /// Read-modify-write; returns the merged record, or `None` if nothing is stored
    fn update(&self, update: &SessionUpdate) -> Option<UserSession> {
        let mut session = self.get()?;
        session.merge(update);
        self.set(&session);
        Some(session)
    }
}

/// Merge-write used by the login/signup flow
///
/// The same user signing in again keeps subscription state; a different user
/// replaces the record.
pub fn record_login(
    store: &dyn UserStore,
    username_id: &str,
    display_name: &str,
    email_address: Option<&str>,
) -> UserSession {
    let session = match store.get() {
        Some(mut existing) if existing.username_id == username_id => {
            existing.merge(&SessionUpdate {
                display_name: Some(display_name.to_string()),
                email_address: email_address.map(str::to_string),
                ..Default::default()
            });
            existing
        }
        _ => {
            let mut fresh = UserSession::new(username_id, display_name);
            fresh.email_address = email_address.map(str::to_string);
            fresh
        }
    };
    store.set(&session);
    session
}

/// In-memory user store (tests, ephemeral sessions)
#[derive(Default)]
pub struct MemoryUserStore {
    record: RwLock<Option<UserSession>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: UserSession) -> Self {
        Self {
            record: RwLock::new(Some(session)),
        }
    }
}

impl UserStore for MemoryUserStore {
    fn get(&self) -> Option<UserSession> {
        self.record
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, session: &UserSession) {
        *self.record.write().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_uses_login_flow_keys() {
        let session = UserSession::new("bob", "Bob").with_email("bob@example.com");
        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(
            value,
            json!({
                "username": "bob",
                "name": "Bob",
                "email": "bob@example.com",
                "payment": false
            })
        );
    }

    #[test]
    fn test_unknown_keys_survive_roundtrip() {
        let raw = json!({ "username": "bob", "name": "Bob", "theme": "dark" });
        let session: UserSession = serde_json::from_value(raw).unwrap();
        assert!(!session.payment_confirmed);
        assert_eq!(session.extra.get("theme"), Some(&json!("dark")));

        let back = serde_json::to_value(&session).unwrap();
        assert_eq!(back["theme"], "dark");
    }

    #[test]
    fn test_update_preserves_other_fields() {
        let store = MemoryUserStore::with_session(
            UserSession::new("bob", "Bob").with_email("bob@example.com"),
        );

        let merged = store
            .update(&SessionUpdate::payment_confirmed(Some("pro".into())))
            .unwrap();

        assert_eq!(merged.display_name, "Bob");
        assert_eq!(merged.email_address.as_deref(), Some("bob@example.com"));
        assert_eq!(merged.subscription_tier.as_deref(), Some("pro"));
        assert!(merged.payment_confirmed);
        assert_eq!(store.get(), Some(merged));
    }

    #[test]
    fn test_update_without_record_is_noop() {
        let store = MemoryUserStore::new();
        assert!(store.update(&SessionUpdate::payment_confirmed(None)).is_none());
        assert!(store.get().is_none());
    }

    #[test]
    fn test_login_same_user_keeps_subscription() {
        let mut existing = UserSession::new("bob", "Bob");
        existing.subscription_tier = Some("pro".into());
        existing.payment_confirmed = true;
        let store = MemoryUserStore::with_session(existing);

        let session = record_login(&store, "bob", "Robert", None);

        assert_eq!(session.display_name, "Robert");
        assert_eq!(session.subscription_tier.as_deref(), Some("pro"));
        assert!(session.payment_confirmed);
    }

    #[test]
    fn test_login_other_user_replaces_record() {
        let mut existing = UserSession::new("bob", "Bob");
        existing.payment_confirmed = true;
        let store = MemoryUserStore::with_session(existing);

        let session = record_login(&store, "alice", "Alice", Some("alice@example.com"));

        assert_eq!(session.username_id, "alice");
        assert!(!session.payment_confirmed);
        assert_eq!(store.get().unwrap().email_address.as_deref(), Some("alice@example.com"));
    }
}
