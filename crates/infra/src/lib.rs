//! Network and platform tier of the Ajo client core.
//!
//! Home of the resilient [`ApiClient`](api::ApiClient) façade (cache-first
//! reads, offline queueing, one-shot 401 refresh), the connectivity probe,
//! the offline-queue replay processor, and the typed domain services a
//! mobile shell calls into.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod api;
pub mod bootstrap;
pub mod connectivity;
pub mod http;
pub mod services;
pub mod sync;

pub use api::{ApiClient, ClientConfig, GetOptions};
pub use bootstrap::AjoClient;
pub use connectivity::ProbeConnectivity;
pub use sync::QueueProcessor;
