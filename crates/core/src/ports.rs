//! Port interfaces for talking to the Open Supply Hub API
//!
//! The core never performs I/O itself. Everything goes through a
//! [`Transport`], implemented over reqwest in `oshub-infra` and by in-memory
//! fakes in tests.

use std::time::Duration;

use async_trait::async_trait;
use oshub_domain::Result;
use serde_json::Value;

/// HTTP verbs used by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// A single request against the API, relative to the configured base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    /// Path starting with `/`, or an absolute URL (pagination `next` links)
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub timeout: Option<Duration>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self { method: HttpMethod::Get, path: path.into(), query: Vec::new(), body: None, timeout: None }
    }

    pub fn post(path: impl Into<String>, body: Option<Value>) -> Self {
        Self { method: HttpMethod::Post, path: path.into(), query: Vec::new(), body, timeout: None }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_flag(self, key: impl Into<String>, value: bool) -> Self {
        self.with_query(key, if value { "true" } else { "false" })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Value of the first query parameter named `key`.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }
}

/// Status code and decoded body.
///
/// An empty body decodes to `Value::Null`, a non-JSON body to
/// `Value::String`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs authenticated HTTP requests.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue `request` once.
    ///
    /// # Errors
    ///
    /// Returns `OshError::Transport` when no response was received. Any
    /// response, whatever its status, is `Ok`.
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse>;
}
