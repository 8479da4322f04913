use keyring::Entry;
use tracing::debug;

use super::credentials::{Credential, CredentialStore, Lookup};
use super::error::StoreError;
use super::signal::UnauthorizedSignal;

const SERVICE_NAME: &str = "bg1";

/// Keychain account the credential JSON is stored under
const ACCOUNT_NAME: &str = "credential";

/// Credential store backed by the OS keychain.
pub struct KeyringCredentialStore {
    signal: UnauthorizedSignal,
}

impl KeyringCredentialStore {
    pub fn new() -> Self {
        Self {
            signal: UnauthorizedSignal::new(),
        }
    }

    fn entry() -> Result<Entry, StoreError> {
        Ok(Entry::new(SERVICE_NAME, ACCOUNT_NAME)?)
    }
}

impl Default for KeyringCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn get_data(&self) -> Result<Lookup, StoreError> {
        let secret = match Self::entry()?.get_password() {
            Ok(secret) => secret,
            Err(keyring::Error::NoEntry) => return Ok(Lookup::ReauthRequired),
            Err(e) => return Err(e.into()),
        };

        let credential: Credential = serde_json::from_str(&secret)?;
        if credential.is_expired() {
            debug!(swid = %credential.subject, "Keychain credential expired");
            self.delete_data()?;
            return Ok(Lookup::ReauthRequired);
        }
        Ok(Lookup::Valid(credential))
    }

    fn set_data(&self, credential: &Credential) -> Result<(), StoreError> {
        let secret = serde_json::to_string(credential)?;
        Self::entry()?.set_password(&secret)?;
        Ok(())
    }

    fn delete_data(&self) -> Result<(), StoreError> {
        match Self::entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn unauthorized_signal(&self) -> &UnauthorizedSignal {
        &self.signal
    }
}
