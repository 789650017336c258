//! Request executor that waits out HTTP 429 responses
//!
//! The API advertises how long a client must back off
//! (`"Expected available in 12 seconds."`). The executor sleeps for that long
//! and retries, charging every wait against a per-call budget. No other
//! status is retried.

use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use oshub_domain::constants::{THROTTLE_FALLBACK_DELAY_SECS, THROTTLE_PHRASE};
use oshub_domain::{OshError, Result};
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::ports::{ApiRequest, ApiResponse, Transport};

static WAIT_SECONDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"{}\s+(\d+(?:\.\d+)?)\s*second", regex::escape(THROTTLE_PHRASE)))
        .expect("WAIT_SECONDS should compile - this is a bug")
});

/// Successful completion kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// HTTP 200
    Success,
    /// HTTP 201
    Created,
}

/// Body of a 200/201 response.
#[derive(Debug, Clone, PartialEq)]
pub struct ThrottledResponse {
    pub completion: Completion,
    pub body: Value,
}

#[derive(Debug)]
enum State {
    Requesting,
    Waiting(Duration),
    TimedOut,
    Done(ThrottledResponse),
}

/// Issues requests through a [`Transport`], backing off on HTTP 429.
#[derive(Clone)]
pub struct ThrottleExecutor {
    transport: Arc<dyn Transport>,
    budget_secs: f64,
}

impl ThrottleExecutor {
    /// Create an executor with `budget_secs` of total waiting per call.
    ///
    /// Negative budgets are treated as zero.
    ///
    /// # Errors
    ///
    /// Returns `OshError::Config` when the budget is NaN or infinite.
    pub fn new(transport: Arc<dyn Transport>, budget_secs: f64) -> Result<Self> {
        if !budget_secs.is_finite() {
            return Err(OshError::Config(format!(
                "Throttle budget must be a finite number of seconds, got {budget_secs}"
            )));
        }
        Ok(Self { transport, budget_secs: budget_secs.max(0.0) })
    }

    pub fn budget_secs(&self) -> f64 {
        self.budget_secs
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Run `request` until it completes, fails or exhausts the budget.
    ///
    /// With `T` seconds of budget left and an advertised wait of `N`, a 429
    /// times out immediately when `N > T`; otherwise the executor sleeps `N`,
    /// sets `T = T - N` and retries.
    ///
    /// # Errors
    ///
    /// - `OshError::ThrottledTimeout` when the next wait would exceed the
    ///   remaining budget
    /// - `OshError::Remote` for any status other than 200, 201 and 429
    /// - `OshError::Transport` straight from the transport, never retried
    pub async fn execute(&self, request: &ApiRequest) -> Result<ThrottledResponse> {
        let mut remaining = self.budget_secs;
        let mut attempts: u32 = 0;
        let mut state = State::Requesting;

        loop {
            state = match state {
                State::Requesting => {
                    attempts += 1;
                    let response = self.transport.send(request).await?;
                    self.classify(request, response, remaining)?
                }
                State::Waiting(delay) => {
                    tokio::time::sleep(delay).await;
                    remaining -= delay.as_secs_f64();
                    State::Requesting
                }
                State::TimedOut => {
                    debug!(
                        path = %request.path,
                        attempts,
                        budget_secs = self.budget_secs,
                        "Throttle budget exhausted"
                    );
                    return Err(OshError::ThrottledTimeout { budget_secs: self.budget_secs });
                }
                State::Done(response) => {
                    debug!(
                        path = %request.path,
                        attempts,
                        completion = ?response.completion,
                        "Request completed"
                    );
                    return Ok(response);
                }
            };
        }
    }

    fn classify(&self, request: &ApiRequest, response: ApiResponse, remaining: f64) -> Result<State> {
        match response.status {
            200 => Ok(State::Done(ThrottledResponse {
                completion: Completion::Success,
                body: response.body,
            })),
            201 => Ok(State::Done(ThrottledResponse {
                completion: Completion::Created,
                body: response.body,
            })),
            429 => {
                let wait = parse_wait_seconds(&response.body)
                    .filter(|secs| *secs > 0.0)
                    .unwrap_or(THROTTLE_FALLBACK_DELAY_SECS);
                if wait > remaining {
                    return Ok(State::TimedOut);
                }
                let Ok(delay) = Duration::try_from_secs_f64(wait) else {
                    return Ok(State::TimedOut);
                };
                warn!(
                    path = %request.path,
                    wait_secs = wait,
                    remaining_secs = remaining - wait,
                    "Throttled by remote, backing off"
                );
                Ok(State::Waiting(delay))
            }
            status => Err(OshError::Remote { status, detail: remote_detail(&response.body) }),
        }
    }
}

/// Advertised wait in a 429 body, read from `detail` or a bare string body.
pub fn parse_wait_seconds(body: &Value) -> Option<f64> {
    let text = match body {
        Value::String(s) => s.as_str(),
        Value::Object(map) => map.get("detail")?.as_str()?,
        _ => return None,
    };
    WAIT_SECONDS
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Error detail of a non-success body.
///
/// Prefers `detail`, then `message`, then the raw body.
pub fn remote_detail(body: &Value) -> String {
    match body {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Object(map) => ["detail", "message"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map_or_else(|| body.to_string(), str::to_string),
        other => other.to_string(),
    }
}
