//! Core library for BG1.
//!
//! This crate holds everything that is not terminal rendering:
//!
//! - `auth`: credentials, credential stores and the `SessionController`
//! - `api`: virtual-queue API client
//! - `clock`: date/time source, observed clock elements and live widgets
//! - `watchdog`: per-location clock sync supervision
//! - `gate`: disclaimer and news acknowledgment flags
//! - `kvdb`: file-backed key/value persistence
//! - `config`: application configuration

pub mod api;
pub mod auth;
pub mod clock;
pub mod config;
pub mod gate;
pub mod kvdb;
pub mod models;
pub mod utils;
pub mod watchdog;
