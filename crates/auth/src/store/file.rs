//! File-backed fallback credential store
//!
//! For environments without a secrets facility. The whole record is
//! JSON-encoded under the access-token key in a single owner-only file;
//! no slot splitting is needed because there is no per-item ceiling.
//!
//! Writes are atomic (temp file then rename) and the file is created with
//! 0600 permissions on Unix.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{CredentialStore, StoreError, StoredCredentials, ACCESS_TOKEN_KEY};

/// Credential store over a plain key/value JSON file.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Create a store backed by the given file path. The parent directory
    /// is created on first write.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// The backing file path.
    #[must_use]
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn read_entries(&self) -> Result<HashMap<String, String>, StoreError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            StoreError::AccessFailed(format!("cannot read credential file: {e}"))
        })?;

        Ok(serde_json::from_str(&content)?)
    }

    fn write_entries(&self, entries: &HashMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                StoreError::AccessFailed(format!("cannot create credential directory: {e}"))
            })?;
        }

        let content = serde_json::to_string(entries)?;

        // Write to a temp file then rename so readers never see a torn
        // record.
        let tmp_path = self.path.with_extension("tmp");
        {
            let mut file = fs::File::create(&tmp_path).map_err(|e| {
                StoreError::AccessFailed(format!("cannot create credential file: {e}"))
            })?;

            #[cfg(unix)]
            {
                let perms = fs::Permissions::from_mode(0o600);
                if let Err(e) = file.set_permissions(perms) {
                    warn!("Failed to restrict credential file permissions: {e}");
                }
            }

            file.write_all(content.as_bytes()).map_err(|e| {
                StoreError::AccessFailed(format!("cannot write credential file: {e}"))
            })?;
        }

        fs::rename(&tmp_path, &self.path).map_err(|e| {
            StoreError::AccessFailed(format!("cannot finalize credential file: {e}"))
        })
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn store(&self, record: &StoredCredentials) -> Result<(), StoreError> {
        debug!(path = %self.path.display(), "Storing credentials to file");

        let mut entries = self.read_entries().unwrap_or_else(|e| {
            warn!("Discarding unreadable credential file on write: {e}");
            HashMap::new()
        });
        entries.insert(ACCESS_TOKEN_KEY.to_string(), serde_json::to_string(record)?);
        self.write_entries(&entries)
    }

    async fn load(&self) -> Result<Option<StoredCredentials>, StoreError> {
        let entries = self.read_entries()?;
        let Some(raw) = entries.get(ACCESS_TOKEN_KEY) else {
            return Ok(None);
        };

        match serde_json::from_str(raw) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                // An unreadable blob behaves as "no stored session".
                warn!("Ignoring unreadable credential record: {e}");
                Ok(None)
            }
        }
    }

    async fn clear(&self) -> Result<(), StoreError> {
        debug!(path = %self.path.display(), "Clearing credential file");

        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!("Failed to remove credential file: {e}");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for the file store.
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    use super::*;

    fn store_in(dir: &TempDir) -> FileCredentialStore {
        FileCredentialStore::new(dir.path().join("credentials.json"))
    }

    fn sample_record() -> StoredCredentials {
        StoredCredentials {
            access_token: "A".to_string(),
            refresh_token: Some("R".to_string()),
            expires_at: Some(Utc::now() + Duration::hours(1)),
        }
    }

    /// Validates the store/load round-trip scenario.
    ///
    /// Assertions:
    /// - Confirms the loaded record equals the stored record, down to the
    ///   millisecond expiry precision the wire format carries.
    #[tokio::test]
    async fn test_roundtrip() {
        let dir = TempDir::new().expect("tempdir");
        let store = store_in(&dir);
        let record = sample_record();

        store.store(&record).await.expect("store should succeed");
        let loaded = store.load().await.expect("load should succeed").expect("record present");

        assert_eq!(loaded.access_token, record.access_token);
        assert_eq!(loaded.refresh_token, record.refresh_token);
        assert_eq!(
            loaded.expires_at.map(|t| t.timestamp_millis()),
            record.expires_at.map(|t| t.timestamp_millis())
        );
    }

    /// Validates `load` behavior for the empty-store scenario.
    #[tokio::test]
    async fn test_load_absent() {
        let dir = TempDir::new().expect("tempdir");
        let store = store_in(&dir);

        assert!(store.load().await.expect("load should succeed").is_none());
    }

    /// Validates `clear` behavior for the idempotency scenario: clearing
    /// an already-empty store completes without error.
    #[tokio::test]
    async fn test_clear_idempotent() {
        let dir = TempDir::new().expect("tempdir");
        let store = store_in(&dir);

        store.clear().await.expect("first clear should succeed");
        store.store(&sample_record()).await.expect("store should succeed");
        store.clear().await.expect("clear should succeed");
        store.clear().await.expect("repeat clear should succeed");

        assert!(store.load().await.expect("load should succeed").is_none());
    }

    /// Validates `load` behavior for the corrupted-blob scenario: an
    /// unreadable record behaves as "no stored session".
    #[tokio::test]
    async fn test_corrupt_blob_reads_as_absent() {
        let dir = TempDir::new().expect("tempdir");
        let store = store_in(&dir);

        let mut entries = HashMap::new();
        entries.insert(ACCESS_TOKEN_KEY.to_string(), "{not json".to_string());
        store.write_entries(&entries).expect("write should succeed");

        assert!(store.load().await.expect("load should succeed").is_none());
    }

    /// Validates `store` behavior over a corrupt credential file: the
    /// unreadable content is discarded (with a warning) and the new
    /// record is written in its place.
    #[tokio::test]
    async fn test_store_replaces_corrupt_file() {
        let dir = TempDir::new().expect("tempdir");
        let store = store_in(&dir);
        fs::write(store.path(), "{not json").expect("seed write should succeed");

        store.store(&sample_record()).await.expect("store should succeed");

        let loaded = store.load().await.expect("load should succeed").expect("record present");
        assert_eq!(loaded.access_token, "A");
    }

    /// Validates file permissions on Unix: owner read/write only.
    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_permissions() {
        let dir = TempDir::new().expect("tempdir");
        let store = store_in(&dir);

        store.store(&sample_record()).await.expect("store should succeed");

        let mode = fs::metadata(store.path())
            .expect("metadata")
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
