//! HTTP client functionality for gauntlet
//!
//! This crate provides the JSON POST capability the load engine uses to probe
//! backends, with an offline mock mode for deterministic tests.

pub mod client;
pub mod config;
pub mod errors;

// Re-export main types for convenience
pub use client::{HttpClient, HttpManager, HttpResponse, MockResponse};
pub use config::HttpConfig;
pub use errors::HttpError;
