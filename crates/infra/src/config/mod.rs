//! Configuration loading and management
//!
//! This module provides utilities for loading client configuration from
//! environment variables and files, and for resolving API credentials.

pub mod credentials;
pub mod loader;

// Re-export commonly used items
pub use credentials::{resolve, CredentialOptions};
pub use loader::{load, load_from_env, load_from_file, probe_config_paths};
