//! Session lifecycle state machine.
//!
//! ```text
//! Unauthenticated --lookup ok--------------> Authenticated
//! Unauthenticated --lookup ReauthRequired--> AwaitingLogin
//! Authenticated   --unauthorized signal----> AwaitingLogin
//! AwaitingLogin   --complete_login---------> Authenticated
//! ```
//!
//! The state lives in a `watch` channel so the UI can redraw on change. The
//! unauthorized handler updates it synchronously from whatever call stack
//! publishes the signal.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

use super::credentials::{Credential, CredentialStore, Lookup};
use super::error::{SessionError, StoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Lookup has not completed yet
    Unauthenticated,
    Authenticated(Credential),
    AwaitingLogin,
}

impl SessionState {
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Unauthenticated => "unauthenticated",
            SessionState::Authenticated(_) => "authenticated",
            SessionState::AwaitingLogin => "awaiting login",
        }
    }

    pub fn credential(&self) -> Option<&Credential> {
        match self {
            SessionState::Authenticated(cred) => Some(cred),
            _ => None,
        }
    }
}

pub struct SessionController {
    store: Arc<dyn CredentialStore>,
    state: Arc<watch::Sender<SessionState>>,
    handler_registered: AtomicBool,
}

impl SessionController {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        let (state, _) = watch::channel(SessionState::Unauthenticated);
        Self {
            store,
            state: Arc::new(state),
            handler_registered: AtomicBool::new(false),
        }
    }

    /// Subscribe to the unauthorized channel and resolve the stored credential.
    ///
    /// Store failures other than a missing/expired credential are returned
    /// untouched and leave the session `Unauthenticated`.
    pub fn initialize(&self) -> Result<(), SessionError> {
        self.ensure_state("initialize", |s| matches!(s, SessionState::Unauthenticated))?;
        self.register_invalidation_handler();
        let lookup = self.store.get_data()?;
        self.resolve(lookup);
        Ok(())
    }

    /// Like `initialize`, for a lookup that completes later.
    ///
    /// If the unauthorized signal fires while the lookup is pending, the
    /// session stays `AwaitingLogin` and the lookup result is discarded.
    pub async fn initialize_deferred<F>(&self, pending: F) -> Result<(), SessionError>
    where
        F: Future<Output = Result<Lookup, StoreError>>,
    {
        self.ensure_state("initialize", |s| matches!(s, SessionState::Unauthenticated))?;
        self.register_invalidation_handler();
        let lookup = pending.await?;
        self.resolve(lookup);
        Ok(())
    }

    /// Hook the store's unauthorized channel. Safe to call more than once.
    pub fn register_invalidation_handler(&self) {
        if self.handler_registered.swap(true, Ordering::SeqCst) {
            return;
        }
        let state = Arc::downgrade(&self.state);
        self.store.on_unauthorized(Arc::new(move || {
            if let Some(state) = state.upgrade() {
                invalidate(&state);
            }
        }));
        debug!("Unauthorized handler registered");
    }

    /// Persist a freshly issued credential and make it the active one.
    ///
    /// The credential is written before the new state is published, so no
    /// observer sees an authenticated session that is not persisted.
    pub fn complete_login(&self, credential: Credential) -> Result<(), SessionError> {
        self.ensure_state("complete login", |s| matches!(s, SessionState::AwaitingLogin))?;
        self.store.set_data(&credential)?;
        info!(swid = %credential.subject, "Login complete");
        self.state.send_replace(SessionState::Authenticated(credential));
        Ok(())
    }

    /// Clear the stored credential and go through the invalidation path.
    pub fn logout(&self) -> Result<(), SessionError> {
        self.store.delete_data()?;
        self.store.unauthorized_signal().notify();
        // Covers a logout before the handler was ever registered
        invalidate(&self.state);
        Ok(())
    }

    pub fn active_credential(&self) -> Option<Credential> {
        self.state.borrow().credential().cloned()
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(*self.state.borrow(), SessionState::Authenticated(_))
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    fn resolve(&self, lookup: Lookup) {
        let next = match lookup {
            Lookup::Valid(credential) => SessionState::Authenticated(credential),
            Lookup::ReauthRequired => SessionState::AwaitingLogin,
        };
        let label = next.label();

        let applied = self.state.send_if_modified(|state| {
            if matches!(state, SessionState::Unauthenticated) {
                *state = next;
                true
            } else {
                false
            }
        });

        if applied {
            info!(state = label, "Session initialized");
        } else {
            debug!(lookup = label, "Session invalidated during lookup, result discarded");
        }
    }

    fn ensure_state(
        &self,
        operation: &'static str,
        allowed: impl Fn(&SessionState) -> bool,
    ) -> Result<(), SessionError> {
        let state = self.state.borrow();
        if allowed(&*state) {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                operation,
                state: state.label(),
            })
        }
    }
}

/// Drop the held credential and require a login. No-op when already waiting.
fn invalidate(state: &watch::Sender<SessionState>) {
    let mut previous = "";
    let changed = state.send_if_modified(|current| {
        if matches!(current, SessionState::AwaitingLogin) {
            return false;
        }
        previous = current.label();
        *current = SessionState::AwaitingLogin;
        true
    });

    if changed {
        info!(from = previous, "Session invalidated, login required");
    } else {
        debug!("Unauthorized signal while awaiting login, ignored");
    }
}
