//! Scripted mock implementation of the `Transport` port

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use oshub_core::ports::{ApiRequest, ApiResponse, Transport};
use oshub_domain::{OshError, Result as DomainResult};
use parking_lot::Mutex;
use serde_json::{json, Value};

/// In-memory mock for `Transport`.
///
/// Replies are returned in the order they were queued; every request is
/// recorded. Running out of replies is reported as a transport error so a
/// test that issues an unexpected request fails loudly.
#[derive(Default, Clone)]
pub struct MockTransport {
    replies: Arc<Mutex<VecDeque<DomainResult<ApiResponse>>>>,
    requests: Arc<Mutex<Vec<ApiRequest>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response with the given status and body.
    pub fn reply(self, status: u16, body: Value) -> Self {
        self.replies.lock().push_back(Ok(ApiResponse::new(status, body)));
        self
    }

    /// Queue a 429 advertising `seconds` of wait.
    pub fn throttled(self, seconds: u64) -> Self {
        self.reply(
            429,
            json!({"detail": format!("Request was throttled. Expected available in {seconds} seconds.")}),
        )
    }

    /// Queue a transport failure.
    pub fn fail(self, message: &str) -> Self {
        self.replies.lock().push_back(Err(OshError::Transport(message.to_string())));
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn remaining_replies(&self) -> usize {
        self.replies.lock().len()
    }

    pub fn shared(&self) -> Arc<dyn Transport> {
        Arc::new(self.clone())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &ApiRequest) -> DomainResult<ApiResponse> {
        self.requests.lock().push(request.clone());
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(OshError::Transport(format!("no reply queued for {}", request.path))))
    }
}
