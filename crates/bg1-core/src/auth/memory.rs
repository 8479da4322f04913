use parking_lot::Mutex;

use super::credentials::{Credential, CredentialStore, Lookup};
use super::error::StoreError;
use super::signal::UnauthorizedSignal;

/// In-process credential store. Nothing survives the process.
#[derive(Default)]
pub struct MemoryCredentialStore {
    credential: Mutex<Option<Credential>>,
    signal: UnauthorizedSignal,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: Credential) -> Self {
        Self {
            credential: Mutex::new(Some(credential)),
            signal: UnauthorizedSignal::new(),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get_data(&self) -> Result<Lookup, StoreError> {
        let mut slot = self.credential.lock();
        match slot.as_ref() {
            Some(cred) if !cred.is_expired() => Ok(Lookup::Valid(cred.clone())),
            Some(_) => {
                *slot = None;
                Ok(Lookup::ReauthRequired)
            }
            None => Ok(Lookup::ReauthRequired),
        }
    }

    fn set_data(&self, credential: &Credential) -> Result<(), StoreError> {
        *self.credential.lock() = Some(credential.clone());
        Ok(())
    }

    fn delete_data(&self) -> Result<(), StoreError> {
        *self.credential.lock() = None;
        Ok(())
    }

    fn unauthorized_signal(&self) -> &UnauthorizedSignal {
        &self.signal
    }
}
