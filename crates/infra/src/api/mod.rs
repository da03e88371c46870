//! The resilient API client.
//!
//! [`ApiClient`] is the single place raw transport, status, and parse
//! failures become `ajo_domain::ApiError`. Reads are cache-first with a
//! stale fallback; mutations queue while offline (auth paths excepted);
//! a 401 triggers at most one token refresh and retry per call.

mod auth;
mod classify;
mod client;
mod config;

pub use auth::AuthApi;
pub use classify::{retry_delay, user_message, ErrorLog, ErrorLogEntry};
pub use client::{ApiClient, ApiClientBuilder, GetOptions};
pub use config::ClientConfig;
