//! Credential storage on top of a [`KeyValueStore`].
//!
//! Owns the key names of the persisted session:
//! - `console_token` / `refresh_token` for signed-in console users
//! - `token`, a JSON object mapping share codes to public credentials

use std::collections::HashMap;
use std::sync::Arc;

use crate::traits::{KeyValueStore, StoreError};

/// Key holding the console access token.
pub const CONSOLE_TOKEN_KEY: &str = "console_token";

/// Key holding the console refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Key holding the JSON map of share code to public access token.
pub const PUBLIC_TOKENS_KEY: &str = "token";

/// Which credential namespace a call authenticates with.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CredentialScope {
    /// Signed-in console user
    #[default]
    Console,
    /// Anonymous visitor of a shared app, identified by its share code
    Public { share_code: String },
}

impl CredentialScope {
    pub fn public(share_code: impl Into<String>) -> Self {
        CredentialScope::Public {
            share_code: share_code.into(),
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, CredentialScope::Public { .. })
    }
}

/// Typed access to persisted credentials.
#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore").finish_non_exhaustive()
    }
}

impl CredentialStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// The underlying key-value store.
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Access token for `scope`, if one is stored.
    pub fn access_token(&self, scope: &CredentialScope) -> Result<Option<String>, StoreError> {
        match scope {
            CredentialScope::Console => self.console_token(),
            CredentialScope::Public { share_code } => {
                Ok(self.public_tokens()?.remove(share_code))
            }
        }
    }

    pub fn console_token(&self) -> Result<Option<String>, StoreError> {
        self.store.get(CONSOLE_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Result<Option<String>, StoreError> {
        self.store.get(REFRESH_TOKEN_KEY)
    }

    /// Replace both console tokens.
    pub fn set_tokens(&self, access_token: &str, refresh_token: &str) -> Result<(), StoreError> {
        self.store.set(CONSOLE_TOKEN_KEY, access_token)?;
        self.store.set(REFRESH_TOKEN_KEY, refresh_token)
    }

    /// Drop both console tokens.
    pub fn clear_console(&self) -> Result<(), StoreError> {
        self.store.remove(CONSOLE_TOKEN_KEY)?;
        self.store.remove(REFRESH_TOKEN_KEY)
    }

    /// Store the public credential for one share code.
    pub fn set_public(&self, share_code: &str, token: &str) -> Result<(), StoreError> {
        let mut tokens = self.public_tokens()?;
        tokens.insert(share_code.to_string(), token.to_string());
        self.write_public_tokens(&tokens)
    }

    /// Drop the public credential for one share code.
    pub fn remove_public(&self, share_code: &str) -> Result<(), StoreError> {
        let mut tokens = self.public_tokens()?;
        if tokens.remove(share_code).is_some() {
            self.write_public_tokens(&tokens)?;
        }
        Ok(())
    }

    fn public_tokens(&self) -> Result<HashMap<String, String>, StoreError> {
        let Some(raw) = self.store.get(PUBLIC_TOKENS_KEY)? else {
            return Ok(HashMap::new());
        };

        match serde_json::from_str(&raw) {
            Ok(tokens) => Ok(tokens),
            Err(e) => {
                tracing::warn!("Ignoring unreadable public token map: {}", e);
                Ok(HashMap::new())
            }
        }
    }

    fn write_public_tokens(&self, tokens: &HashMap<String, String>) -> Result<(), StoreError> {
        let raw = serde_json::to_string(tokens).map_err(|e| StoreError::WriteFailed {
            key: PUBLIC_TOKENS_KEY.to_string(),
            message: e.to_string(),
        })?;
        self.store.set(PUBLIC_TOKENS_KEY, &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryStore;

    fn store() -> (Arc<InMemoryStore>, CredentialStore) {
        let backing = Arc::new(InMemoryStore::new());
        let credentials = CredentialStore::new(backing.clone());
        (backing, credentials)
    }

    #[test]
    fn test_console_tokens() {
        let (backing, credentials) = store();
        assert_eq!(credentials.access_token(&CredentialScope::Console).unwrap(), None);

        credentials.set_tokens("access-1", "refresh-1").unwrap();
        assert_eq!(backing.get(CONSOLE_TOKEN_KEY).unwrap().as_deref(), Some("access-1"));
        assert_eq!(credentials.refresh_token().unwrap().as_deref(), Some("refresh-1"));

        credentials.clear_console().unwrap();
        assert_eq!(credentials.console_token().unwrap(), None);
        assert_eq!(credentials.refresh_token().unwrap(), None);
    }

    #[test]
    fn test_public_tokens_keyed_by_share_code() {
        let (_backing, credentials) = store();
        credentials.set_public("abc", "pub-a").unwrap();
        credentials.set_public("xyz", "pub-x").unwrap();

        let scope = CredentialScope::public("abc");
        assert_eq!(credentials.access_token(&scope).unwrap().as_deref(), Some("pub-a"));

        credentials.remove_public("abc").unwrap();
        assert_eq!(credentials.access_token(&scope).unwrap(), None);
        assert_eq!(
            credentials
                .access_token(&CredentialScope::public("xyz"))
                .unwrap()
                .as_deref(),
            Some("pub-x")
        );
    }

    #[test]
    fn test_unreadable_public_map_is_empty() {
        let (backing, credentials) = store();
        backing.set(PUBLIC_TOKENS_KEY, "not json").unwrap();
        assert_eq!(
            credentials
                .access_token(&CredentialScope::public("abc"))
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_store_failure_propagates() {
        let (backing, credentials) = store();
        backing.set_should_fail_write(true);
        assert!(matches!(
            credentials.set_tokens("a", "r"),
            Err(StoreError::WriteFailed { .. })
        ));
    }
}
