//! Secure credential persistence
//!
//! The session manager persists a small credential record between runs.
//! Two backends implement the [`CredentialStore`] capability trait:
//!
//! - [`KeychainCredentialStore`]: platform keychain via the `keyring`
//!   crate, with the record split across three items to respect the
//!   per-item size ceiling of secure storage facilities.
//! - [`FileCredentialStore`]: a single JSON blob in an owner-only file,
//!   for environments without a secrets facility.
//!
//! The embedding application picks the backend at construction time.
//! Persistence is best-effort everywhere: the in-memory session stays
//! authoritative for the current run, and storage faults degrade to
//! "no stored session" rather than propagating.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod file;
#[cfg(feature = "keychain")]
mod keychain;

pub use file::FileCredentialStore;
#[cfg(feature = "keychain")]
pub use keychain::KeychainCredentialStore;

/// Storage key for the access token (and for the whole blob on the
/// fallback store).
pub const ACCESS_TOKEN_KEY: &str = "frappe_access_token";

/// Storage key for the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "frappe_refresh_token";

/// Storage key for the metadata record.
pub const TOKEN_META_KEY: &str = "frappe_token_meta";

/// Per-item payload ceiling of the secure storage facility, in bytes.
/// Tokens are stored in separate items so each stays under it.
pub const SECURE_ITEM_LIMIT: usize = 2048;

/// On-disk projection of a session.
///
/// Never contains the ID token: it is large, single-use, and lives only
/// for the current process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCredentials {
    /// Bearer access token
    pub access_token: String,

    /// Refresh token, when one was issued
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Absolute expiry computed as issue time + server-reported lifetime;
    /// absent means no known expiry. Persisted as epoch milliseconds.
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Metadata slot payload: the small record that always fits under the
/// per-item ceiling.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct TokenMeta {
    #[serde(rename = "expiresAt", with = "chrono::serde::ts_milliseconds_option")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Credential store error types
#[derive(Debug, Error)]
pub enum StoreError {
    /// Storage access failed (permission denied, facility unavailable, ...)
    #[error("credential storage access failed: {0}")]
    AccessFailed(String),

    /// JSON serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Capability trait for credential persistence.
///
/// `load` returns `Ok(None)` when no access token is stored. `clear` is
/// idempotent and must not fail when items are already absent.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Persist the record (best-effort across slots).
    ///
    /// # Errors
    /// Returns an error only when the access-token slot itself cannot be
    /// written; secondary slot failures are logged and swallowed, since a
    /// session without a refresh token is still usable.
    async fn store(&self, record: &StoredCredentials) -> Result<(), StoreError>;

    /// Load the persisted record, if any.
    ///
    /// # Errors
    /// Returns an error only for faults other than absence; callers treat
    /// errors as "no stored session".
    async fn load(&self) -> Result<Option<StoredCredentials>, StoreError>;

    /// Remove all persisted credential material.
    ///
    /// # Errors
    /// Never fails for already-absent items.
    async fn clear(&self) -> Result<(), StoreError>;
}
