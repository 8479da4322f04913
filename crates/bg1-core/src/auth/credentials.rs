use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::StoreError;
use super::signal::{UnauthorizedHandler, UnauthorizedSignal};

/// Proof of an authenticated session.
///
/// Credentials are never mutated in place: a login or a store read always
/// produces a whole new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Disney account identifier, e.g. `{MICKEY}`
    #[serde(rename = "swid")]
    pub subject: String,
    #[serde(rename = "accessToken")]
    pub access_token: String,
    /// Expiry as epoch milliseconds. `None` means the token does not report one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<i64>,
}

impl Credential {
    pub fn new(subject: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            access_token: access_token.into(),
            expires: None,
        }
    }

    pub fn with_expiry(mut self, expires_ms: i64) -> Self {
        self.expires = Some(expires_ms);
        self
    }

    /// Expired once the current time reaches the expiry timestamp.
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        self.expires.map(|exp| now_ms >= exp).unwrap_or(false)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp_millis())
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires.and_then(DateTime::from_timestamp_millis)
    }

    /// Minutes remaining until expiry, clamped at zero (for display)
    pub fn minutes_until_expiry(&self) -> Option<i64> {
        self.expires_at()
            .map(|exp| (exp - Utc::now()).num_minutes().max(0))
    }
}

/// Outcome of a credential lookup.
///
/// Absence of a usable credential is an expected outcome, not an error:
/// callers match `Ok(Lookup::Valid)`, `Ok(Lookup::ReauthRequired)` and
/// `Err(StoreError)` exhaustively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Valid(Credential),
    ReauthRequired,
}

/// Persistence for the session credential.
///
/// Implementations also own the unauthorized channel: anything that learns
/// the held credential went bad (typically the API client on a 401) publishes
/// on it, and the session owner subscribes through `on_unauthorized`.
pub trait CredentialStore: Send + Sync {
    /// Fetch the stored credential if it is still usable
    fn get_data(&self) -> Result<Lookup, StoreError>;

    /// Persist a credential, replacing any previous one
    fn set_data(&self, credential: &Credential) -> Result<(), StoreError>;

    /// Clear any stored credential
    fn delete_data(&self) -> Result<(), StoreError>;

    /// The publishing side of the unauthorized channel
    fn unauthorized_signal(&self) -> &UnauthorizedSignal;

    /// Register a callback invoked whenever the held credential is found invalid.
    fn on_unauthorized(&self, handler: UnauthorizedHandler) {
        self.unauthorized_signal().subscribe(handler);
    }
}
