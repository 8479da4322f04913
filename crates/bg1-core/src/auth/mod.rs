//! Authentication module for managing credentials and the session lifecycle.
//!
//! This module provides:
//! - `Credential`: the SWID/access-token pair issued by Disney login
//! - `CredentialStore`: persistence trait with file, keychain and memory backends
//! - `UnauthorizedSignal`: publish/subscribe channel for mid-session invalidation
//! - `SessionController`: the authorization state machine gating the app
//!
//! A stored credential whose expiry has passed is never handed out; stores
//! report `Lookup::ReauthRequired` instead.

pub mod controller;
pub mod credentials;
pub mod error;
pub mod file_store;
pub mod keychain;
pub mod memory;
pub mod signal;

pub use controller::{SessionController, SessionState};
pub use credentials::{Credential, CredentialStore, Lookup};
pub use error::{SessionError, StoreError};
pub use file_store::FileCredentialStore;
pub use keychain::KeyringCredentialStore;
pub use memory::MemoryCredentialStore;
pub use signal::{UnauthorizedHandler, UnauthorizedSignal};
