//! REST API client module for the Disney virtual-queue service.
//!
//! This module provides the `ApiClient` for fetching the queue list of a
//! resort. Requests carry the session credential as a bearer token; a `401`
//! answer publishes on the credential store's unauthorized signal so the
//! session drops back to login without the client knowing about it.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
