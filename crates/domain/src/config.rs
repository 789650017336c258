//! Client configuration structures

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_THROTTLE_BUDGET_SECS,
};

/// Resolved API location and token.
///
/// The token is never serialized and never printed by `Debug`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub base_url: String,
    #[serde(default, skip_serializing)]
    pub token: String,
}

impl Credentials {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self { base_url: normalize_base_url(&base_url.into()), token: token.into() }
    }

    pub fn has_token(&self) -> bool {
        !self.token.trim().is_empty()
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self { base_url: DEFAULT_BASE_URL.to_string(), token: String::new() }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("base_url", &self.base_url)
            .field("token", &if self.has_token() { "<redacted>" } else { "<empty>" })
            .finish()
    }
}

/// Client settings, loadable from JSON/TOML files or the environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub credentials: Credentials,
    /// Optional YAML credentials file (path or http(s) URL)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials_source: Option<String>,
    pub request_timeout_secs: u64,
    /// Total seconds an operation may spend waiting out HTTP 429 responses
    pub throttle_budget_secs: f64,
    /// Sent as `public=` on uploads
    pub public: bool,
    /// Sent as `textonlyfallback=` on uploads
    pub text_only_fallback: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            credentials: Credentials::default(),
            credentials_source: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            throttle_budget_secs: DEFAULT_THROTTLE_BUDGET_SECS,
            public: true,
            text_only_fallback: false,
        }
    }
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Strip trailing slashes so paths can be appended with a leading `/`.
pub fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
