//! One session namespace inside a [`KeyValueStore`].

use std::fmt;
use std::sync::Arc;

use board_core::{StorageKeys, UserIdentity};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::KeyValueStore;

/// Access/refresh token pair as returned by `POST /auth/token/`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
    pub access: String,
    pub refresh: String,
}

impl fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access", &board_core::mask_token(&self.access))
            .field("refresh", &board_core::mask_token(&self.refresh))
            .finish()
    }
}

/// Reads and writes the three session keys of one surface.
#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn KeyValueStore>,
    keys: StorageKeys,
}

impl CredentialStore {
    pub fn new(store: Arc<dyn KeyValueStore>, keys: StorageKeys) -> Self {
        Self { store, keys }
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    async fn read(&self, key: &str) -> Result<Option<String>> {
        let value = self.store.get_item(key).await?;
        Ok(value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()))
    }

    pub async fn access_token(&self) -> Result<Option<String>> {
        self.read(&self.keys.access_token).await
    }

    pub async fn refresh_token(&self) -> Result<Option<String>> {
        self.read(&self.keys.refresh_token).await
    }

    /// Both tokens, or `None` if either is missing.
    pub async fn credentials(&self) -> Result<Option<CredentialPair>> {
        let access = self.access_token().await?;
        let refresh = self.refresh_token().await?;
        Ok(match (access, refresh) {
            (Some(access), Some(refresh)) => Some(CredentialPair { access, refresh }),
            _ => None,
        })
    }

    pub async fn save_credentials(&self, pair: &CredentialPair) -> Result<()> {
        self.store
            .set_item(&self.keys.access_token, &pair.access)
            .await?;
        self.store
            .set_item(&self.keys.refresh_token, &pair.refresh)
            .await
    }

    pub async fn set_access_token(&self, token: &str) -> Result<()> {
        self.store.set_item(&self.keys.access_token, token).await
    }

    /// Cached identity. A malformed record is reported as an error.
    pub async fn user(&self) -> Result<Option<UserIdentity>> {
        match self.read(&self.keys.user).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub async fn save_user(&self, user: &UserIdentity) -> Result<()> {
        let serialized = serde_json::to_string(user)?;
        self.store.set_item(&self.keys.user, &serialized).await
    }

    /// Remove all three keys. Every key is attempted; the first failure is returned.
    pub async fn clear(&self) -> Result<()> {
        let mut first_error = None;
        for key in self.keys.all() {
            if let Err(e) = self.store.remove_item(key).await {
                tracing::warn!("Failed to remove session key {}: {}", key, e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// True when none of the three keys holds a value.
    pub async fn is_empty(&self) -> Result<bool> {
        for key in self.keys.all() {
            if self.store.get_item(key).await?.is_some() {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
