use std::path::PathBuf;

use tracing::{debug, warn};

use super::credentials::{Credential, CredentialStore, Lookup};
use super::error::StoreError;
use super::signal::UnauthorizedSignal;

/// Credential file name in cache directory
const CREDENTIAL_FILE: &str = "credential.json";

/// Credential store persisted as JSON in the cache directory.
pub struct FileCredentialStore {
    cache_dir: PathBuf,
    signal: UnauthorizedSignal,
}

impl FileCredentialStore {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            signal: UnauthorizedSignal::new(),
        }
    }

    fn credential_path(&self) -> PathBuf {
        self.cache_dir.join(CREDENTIAL_FILE)
    }
}

impl CredentialStore for FileCredentialStore {
    fn get_data(&self) -> Result<Lookup, StoreError> {
        let path = self.credential_path();
        if !path.exists() {
            debug!(path = %path.display(), "No stored credential");
            return Ok(Lookup::ReauthRequired);
        }

        let contents = std::fs::read_to_string(&path).map_err(|source| StoreError::Read {
            path: path.clone(),
            source,
        })?;
        let credential: Credential = serde_json::from_str(&contents)?;

        if credential.is_expired() {
            debug!(swid = %credential.subject, "Stored credential expired");
            if let Err(e) = std::fs::remove_file(&path) {
                warn!(error = %e, "Failed to remove expired credential");
            }
            return Ok(Lookup::ReauthRequired);
        }

        Ok(Lookup::Valid(credential))
    }

    fn set_data(&self, credential: &Credential) -> Result<(), StoreError> {
        let path = self.credential_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let contents = serde_json::to_string_pretty(credential)?;
        std::fs::write(&path, contents).map_err(|source| StoreError::Write { path, source })
    }

    fn delete_data(&self) -> Result<(), StoreError> {
        let path = self.credential_path();
        if path.exists() {
            std::fs::remove_file(&path).map_err(|source| StoreError::Write { path, source })?;
        }
        Ok(())
    }

    fn unauthorized_signal(&self) -> &UnauthorizedSignal {
        &self.signal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn store() -> (tempfile::TempDir, FileCredentialStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("bg1"));
        (dir, store)
    }

    #[test]
    fn test_missing_file_requires_reauth() {
        let (_dir, store) = store();
        assert_eq!(store.get_data().unwrap(), Lookup::ReauthRequired);
    }

    #[test]
    fn test_set_then_get() {
        let (_dir, store) = store();
        let cred = Credential::new("{MICKEY}", "m1ck3y");
        store.set_data(&cred).unwrap();
        assert_eq!(store.get_data().unwrap(), Lookup::Valid(cred));
    }

    #[test]
    fn test_expired_credential_is_removed() {
        let (_dir, store) = store();
        let past = Utc::now().timestamp_millis() - 60_000;
        store
            .set_data(&Credential::new("{MICKEY}", "m1ck3y").with_expiry(past))
            .unwrap();

        assert_eq!(store.get_data().unwrap(), Lookup::ReauthRequired);
        assert!(!store.credential_path().exists());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let (_dir, store) = store();
        std::fs::create_dir_all(&store.cache_dir).unwrap();
        std::fs::write(store.credential_path(), "{not json").unwrap();

        assert!(matches!(store.get_data(), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (_dir, store) = store();
        store.delete_data().unwrap();
        store.set_data(&Credential::new("{MICKEY}", "m1ck3y")).unwrap();
        store.delete_data().unwrap();
        assert_eq!(store.get_data().unwrap(), Lookup::ReauthRequired);
    }
}
