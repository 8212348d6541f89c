//! Explicit session values and persisted credentials

use parking_lot::RwLock;
use serde_json::Value;
use std::fmt;

/// Storage key of the bearer token
pub const AUTH_TOKEN_KEY: &str = "authToken";

/// Storage key of the cached user profile
pub const USER_DATA_KEY: &str = "userData";

/// Bearer credential passed explicitly to every authenticated call
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
}

impl Session {
    /// Wrap a token returned by login
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Raw token
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Value of the `Authorization` header
    pub fn authorization(&self) -> String {
        format!("Token {}", self.token)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").field("token", &"<redacted>").finish()
    }
}

#[derive(Debug, Default)]
struct Stored {
    auth_token: Option<String>,
    user_data: Option<Value>,
}

/// The two persisted keys of one signed-in browser
///
/// Both keys are written by login and removed together.
#[derive(Debug, Default)]
pub struct CredentialStore {
    inner: RwLock<Stored>,
}

impl CredentialStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Save a fresh login
    pub fn store(&self, token: impl Into<String>, user_data: Option<Value>) {
        let mut inner = self.inner.write();
        inner.auth_token = Some(token.into());
        inner.user_data = user_data;
    }

    /// Session for the stored token, if any
    pub fn session(&self) -> Option<Session> {
        self.inner
            .read()
            .auth_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(Session::new)
    }

    /// Cached profile
    pub fn user_data(&self) -> Option<Value> {
        self.inner.read().user_data.clone()
    }

    /// Name to greet the user with, taken from the cached profile
    pub fn display_name(&self) -> Option<String> {
        let inner = self.inner.read();
        let user = inner.user_data.as_ref()?;
        ["first_name", "username", "email"]
            .iter()
            .filter_map(|key| user.get(key).and_then(Value::as_str))
            .find(|s| !s.is_empty())
            .map(str::to_string)
    }

    /// Remove both keys
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.auth_token = None;
        inner.user_data = None;
    }

    /// Keys currently present
    pub fn keys(&self) -> Vec<&'static str> {
        let inner = self.inner.read();
        let mut keys = Vec::with_capacity(2);
        if inner.auth_token.is_some() {
            keys.push(AUTH_TOKEN_KEY);
        }
        if inner.user_data.is_some() {
            keys.push(USER_DATA_KEY);
        }
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_store_and_clear_together() {
        let store = CredentialStore::new();
        assert!(store.session().is_none());
        assert!(store.keys().is_empty());

        store.store("abc123", Some(json!({"username": "admin"})));
        assert_eq!(store.session().map(|s| s.token().to_string()), Some("abc123".to_string()));
        assert_eq!(store.keys(), vec![AUTH_TOKEN_KEY, USER_DATA_KEY]);
        assert_eq!(store.display_name().as_deref(), Some("admin"));

        store.clear();
        assert!(store.keys().is_empty());
        assert!(store.session().is_none());
        assert!(store.user_data().is_none());
    }

    #[test]
    fn test_empty_token_is_no_session() {
        let store = CredentialStore::new();
        store.store("", None);
        assert!(store.session().is_none());
    }

    #[test]
    fn test_session_header_and_debug() {
        let session = Session::new("t0k3n");
        assert_eq!(session.authorization(), "Token t0k3n");
        assert!(!format!("{session:?}").contains("t0k3n"));
    }
}
