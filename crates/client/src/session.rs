//! Session credentials and the cached user record.
//!
//! Credentials live in durable storage so they survive restarts. The pair is
//! written in one `set_many` call so a renewal replaces both or neither.

use std::fmt;
use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use storefront_core::storage::keys;
use storefront_core::types::id::id_from_value;
use storefront_core::{Storage, StorageError, UserId};

/// Access and refresh credentials.
#[derive(Clone)]
pub struct TokenPair {
    /// Bearer credential attached to requests.
    pub access_token: SecretString,
    /// Credential exchanged for a new pair at `/auth/refresh`.
    pub refresh_token: SecretString,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

impl<'de> Deserialize<'de> for TokenPair {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Wire {
            access_token: String,
            refresh_token: String,
        }

        let wire = Wire::deserialize(deserializer)?;
        Ok(Self {
            access_token: SecretString::from(wire.access_token),
            refresh_token: SecretString::from(wire.refresh_token),
        })
    }
}

/// The signed-in user as returned by the auth endpoints.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct User {
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Everything else on the record, including its id.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    /// The user's id, from `_id` or `id`.
    #[must_use]
    pub fn id(&self) -> Option<UserId> {
        ["_id", "id"]
            .iter()
            .filter_map(|key| self.extra.get(*key))
            .find_map(id_from_value)
            .map(UserId::from)
    }
}

/// Body of `/auth/login`, `/auth/register`, and `/auth/refresh`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    /// New credentials.
    #[serde(flatten)]
    pub tokens: TokenPair,
    /// The user, when the endpoint includes one.
    #[serde(default)]
    pub user: Option<User>,
}

/// Credential and user slots in durable storage.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn Storage>,
}

impl SessionStore {
    /// Wrap a storage backend.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// The stored access credential, if any.
    #[must_use]
    pub fn access_token(&self) -> Option<SecretString> {
        self.secret(keys::ACCESS_TOKEN)
    }

    /// The stored refresh credential, if any.
    #[must_use]
    pub fn refresh_token(&self) -> Option<SecretString> {
        self.secret(keys::REFRESH_TOKEN)
    }

    /// Whether an access credential is stored.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }

    /// Replace both credentials.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot persist the pair.
    pub fn save_tokens(&self, tokens: &TokenPair) -> Result<(), StorageError> {
        self.storage.set_many(&[
            (keys::ACCESS_TOKEN, tokens.access_token.expose_secret()),
            (keys::REFRESH_TOKEN, tokens.refresh_token.expose_secret()),
        ])
    }

    /// Cache the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be encoded or persisted.
    pub fn save_user(&self, user: &User) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(user)?;
        self.storage.set(keys::USER, &encoded)
    }

    /// The cached user. Missing or unreadable records yield `None`.
    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        let raw = self.storage.get(keys::USER)?;
        match serde_json::from_str::<Option<User>>(&raw) {
            Ok(user) => user,
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring unreadable cached user");
                None
            }
        }
    }

    /// Forget both credentials and the cached user.
    ///
    /// Never fails: a slot that cannot be removed is logged and skipped.
    pub fn clear(&self) {
        for key in [keys::ACCESS_TOKEN, keys::REFRESH_TOKEN, keys::USER] {
            if let Err(e) = self.storage.remove(key) {
                tracing::warn!(key, error = %e, "Failed to clear session slot");
            }
        }
    }

    fn secret(&self, key: &str) -> Option<SecretString> {
        self.storage
            .get(key)
            .filter(|value| !value.is_empty())
            .map(SecretString::from)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use storefront_core::MemoryStorage;

    fn store() -> (Arc<MemoryStorage>, SessionStore) {
        let storage = Arc::new(MemoryStorage::new());
        let session = SessionStore::new(storage.clone());
        (storage, session)
    }

    #[test]
    fn test_save_and_clear_tokens() {
        let (storage, session) = store();
        let tokens: TokenPair =
            serde_json::from_value(json!({"accessToken": "a1", "refreshToken": "r1"})).unwrap();

        session.save_tokens(&tokens).unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.access_token().unwrap().expose_secret(), "a1");
        assert_eq!(session.refresh_token().unwrap().expose_secret(), "r1");

        storage.set(keys::CART, "[]").unwrap();
        session.clear();
        assert!(!session.is_authenticated());
        assert!(session.refresh_token().is_none());
        // Cart slot is independent of the session.
        assert_eq!(storage.get(keys::CART).as_deref(), Some("[]"));
    }

    #[test]
    fn test_current_user_round_trip() {
        let (_, session) = store();
        let user: User = serde_json::from_value(json!({
            "_id": "u1",
            "name": "Ana",
            "email": "ana@example.com",
            "role": "customer"
        }))
        .unwrap();

        session.save_user(&user).unwrap();
        let cached = session.current_user().unwrap();
        assert_eq!(cached, user);
        assert_eq!(cached.id().unwrap(), "u1");
    }

    #[test]
    fn test_corrupt_user_is_none() {
        let (storage, session) = store();
        storage.set(keys::USER, "{oops").unwrap();
        assert!(session.current_user().is_none());

        storage.set(keys::USER, "null").unwrap();
        assert!(session.current_user().is_none());
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let tokens: TokenPair =
            serde_json::from_value(json!({"accessToken": "a1", "refreshToken": "r1"})).unwrap();
        let debug = format!("{tokens:?}");
        assert!(!debug.contains("a1"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_auth_response_shape() {
        let response: AuthResponse = serde_json::from_value(json!({
            "accessToken": "a",
            "refreshToken": "r",
            "user": {"id": 9, "name": "Bo"}
        }))
        .unwrap();
        assert_eq!(response.tokens.access_token.expose_secret(), "a");
        assert_eq!(response.user.unwrap().id().unwrap(), "9");
    }
}
