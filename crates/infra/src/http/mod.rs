//! Thin HTTP transport wrapper.

mod client;

pub use client::{HttpClient, HttpClientBuilder};
