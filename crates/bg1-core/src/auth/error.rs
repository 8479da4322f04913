use std::path::PathBuf;

use thiserror::Error;

/// Failures of a credential store.
///
/// These are not retried or interpreted by the session layer; they surface to
/// whoever drives it.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read credential file: {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write credential file: {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Stored credential is corrupt")]
    Corrupt(#[from] serde_json::Error),

    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Credential store failure: {0}")]
    Store(#[from] StoreError),

    #[error("Cannot {operation} while session is {state}")]
    InvalidTransition {
        operation: &'static str,
        state: &'static str,
    },
}
