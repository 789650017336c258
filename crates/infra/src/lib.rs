//! # oshub Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - The reqwest HTTP client wrapper and the HTTP `Transport`
//! - Configuration and credential loading (environment, YAML, JSON, TOML)
//! - The `OshClient` facade over the Open Supply Hub API
//!
//! ## Architecture
//! - Implements traits defined in `oshub-core`
//! - Depends on `oshub-domain` and `oshub-core`
//! - Contains all "impure" code (network and filesystem I/O)

pub mod api;
pub mod config;
pub mod errors;
pub mod http;

// Re-export commonly used items
pub use api::{CallStats, FacilityQuery, HttpTransport, OshClient, OshClientBuilder};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
