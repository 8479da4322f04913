//! API client for the Disney virtual-queue service.

use std::time::Duration;

use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::auth::{Credential, UnauthorizedSignal};
use crate::models::{Queue, QueuesResponse};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Header carrying the account SWID alongside the bearer token
const USER_ID_HEADER: &str = "x-user-id";

/// API client for the virtual-queue service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    credential: Option<Credential>,
    unauthorized: UnauthorizedSignal,
}

impl ApiClient {
    /// Create a new API client publishing 401s on `unauthorized`
    pub fn new(base_url: impl Into<String>, unauthorized: UnauthorizedSignal) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credential: None,
            unauthorized,
        })
    }

    /// Set (or clear) the credential used for requests
    pub fn set_credential(&mut self, credential: Option<Credential>) {
        self.credential = credential;
    }

    /// Create a new ApiClient with the given credential, sharing the connection pool.
    pub fn with_credential(&self, credential: Credential) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            credential: Some(credential),
            unauthorized: self.unauthorized.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let credential = self.credential.as_ref().ok_or(ApiError::NoCredential)?;
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("BEARER {}", credential.access_token))
                .map_err(|_| ApiError::InvalidResponse("access token is not a valid header".into()))?,
        );
        headers.insert(
            USER_ID_HEADER,
            header::HeaderValue::from_str(&credential.subject)
                .map_err(|_| ApiError::InvalidResponse("SWID is not a valid header".into()))?,
        );
        Ok(headers)
    }

    /// Map a failed response to an error, announcing an invalid credential.
    fn reject(&self, status: reqwest::StatusCode, body: &str) -> ApiError {
        let error = ApiError::from_status(status, body);
        if matches!(error, ApiError::Unauthorized) {
            warn!(base_url = %self.base_url, "Queue service rejected credential");
            self.unauthorized.notify();
        }
        error
    }

    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(
        &self,
        response: reqwest::Response,
    ) -> Result<Option<reqwest::Response>, ApiError> {
        let status = response.status();
        if status.is_success() {
            Ok(Some(response))
        } else if status.as_u16() == 429 {
            Ok(None)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(self.reject(status, &body))
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = format!("{}/{}", self.base_url, path);
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = self
                .client
                .get(&url)
                .headers(self.auth_headers()?)
                .send()
                .await?;

            match self.check_response_for_retry(response).await? {
                Some(response) => return Ok(response.json().await?),
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited);
                    }
                    warn!(url = %url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2; // Exponential backoff
                }
            }
        }
    }

    /// Fetch all virtual queues for the resort
    pub async fn fetch_queues(&self) -> Result<Vec<Queue>, ApiError> {
        let response: QueuesResponse = self.get("getQueues").await?;
        debug!(count = response.queues.len(), "Fetched queues");
        Ok(response.queues)
    }
}
