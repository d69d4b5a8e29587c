//! Keychain-backed credential store
//!
//! Persists the credential record in the platform keychain (macOS
//! Keychain, Windows Credential Manager, Linux Secret Service) via the
//! `keyring` crate. The record is split across three independent items so
//! each stays under the facility's per-item payload ceiling:
//!
//! - `frappe_access_token`: the access token
//! - `frappe_refresh_token`: the refresh token, when present
//! - `frappe_token_meta`: JSON `{"expiresAt": <millis>|null}`
//!
//! Writes are best-effort per slot. A crash or fault between writes can
//! leave the metadata slot stale; a missing metadata slot reads back as
//! "no known expiry".

use async_trait::async_trait;
use keyring::Entry;
use tracing::{debug, warn};

use super::{
    CredentialStore, StoreError, StoredCredentials, TokenMeta, ACCESS_TOKEN_KEY,
    REFRESH_TOKEN_KEY, SECURE_ITEM_LIMIT, TOKEN_META_KEY,
};

/// Credential store over the platform keychain.
pub struct KeychainCredentialStore {
    service_name: String,
}

impl KeychainCredentialStore {
    /// Create a store namespaced under a keychain service name
    /// (e.g., "FrappeMobile.auth").
    pub fn new(service_name: impl Into<String>) -> Self {
        Self { service_name: service_name.into() }
    }

    fn entry(&self, key: &str) -> Result<Entry, StoreError> {
        Entry::new(&self.service_name, key).map_err(|e| {
            StoreError::AccessFailed(format!("failed to create keychain entry for {key}: {e}"))
        })
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if value.len() > SECURE_ITEM_LIMIT {
            warn!(key = %key, len = value.len(), "Keychain item exceeds the per-item ceiling");
        }

        let entry = self.entry(key)?;
        entry.set_password(value).map_err(|e| {
            StoreError::AccessFailed(format!("failed to store keychain item {key}: {e}"))
        })
    }

    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entry = self.entry(key)?;
        match entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(StoreError::AccessFailed(format!(
                "failed to read keychain item {key}: {e}"
            ))),
        }
    }

    fn delete_item(&self, key: &str) {
        match self.entry(key) {
            Ok(entry) => {
                if let Err(e) = entry.delete_credential() {
                    if !matches!(e, keyring::Error::NoEntry) {
                        warn!(key = %key, "Failed to delete keychain item: {e}");
                    }
                }
            }
            Err(e) => warn!(key = %key, "Failed to open keychain entry for delete: {e}"),
        }
    }
}

#[async_trait]
impl CredentialStore for KeychainCredentialStore {
    async fn store(&self, record: &StoredCredentials) -> Result<(), StoreError> {
        debug!(service = %self.service_name, "Storing credentials in keychain");

        // The access token is the one slot a usable session depends on.
        self.set_item(ACCESS_TOKEN_KEY, &record.access_token)?;

        // Remaining slots are best-effort: a session without a refresh
        // token is a usable degraded session.
        match &record.refresh_token {
            Some(refresh) => {
                if let Err(e) = self.set_item(REFRESH_TOKEN_KEY, refresh) {
                    warn!("Failed to persist refresh token: {e}");
                }
            }
            // Drop any stale slot from a previous session.
            None => self.delete_item(REFRESH_TOKEN_KEY),
        }

        let meta = TokenMeta { expires_at: record.expires_at };
        match serde_json::to_string(&meta) {
            Ok(meta_json) => {
                if let Err(e) = self.set_item(TOKEN_META_KEY, &meta_json) {
                    warn!("Failed to persist token metadata: {e}");
                }
            }
            Err(e) => warn!("Failed to encode token metadata: {e}"),
        }

        Ok(())
    }

    async fn load(&self) -> Result<Option<StoredCredentials>, StoreError> {
        let Some(access_token) = self.get_item(ACCESS_TOKEN_KEY)? else {
            debug!("No access token in keychain");
            return Ok(None);
        };

        let refresh_token = self.get_item(REFRESH_TOKEN_KEY)?;

        // Missing or unreadable metadata means "no known expiry"; the
        // session manager treats that as unexpired.
        let expires_at = match self.get_item(TOKEN_META_KEY)? {
            Some(raw) => match serde_json::from_str::<TokenMeta>(&raw) {
                Ok(meta) => meta.expires_at,
                Err(e) => {
                    warn!("Ignoring unreadable token metadata: {e}");
                    None
                }
            },
            None => None,
        };

        Ok(Some(StoredCredentials { access_token, refresh_token, expires_at }))
    }

    async fn clear(&self) -> Result<(), StoreError> {
        debug!(service = %self.service_name, "Clearing credentials from keychain");

        self.delete_item(ACCESS_TOKEN_KEY);
        self.delete_item(REFRESH_TOKEN_KEY);
        self.delete_item(TOKEN_META_KEY);

        Ok(())
    }
}
