//! Per-client API call statistics

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use oshub_core::{ApiRequest, ApiResponse, Transport};
use oshub_domain::Result;
use parking_lot::Mutex;

/// Snapshot of the calls made through a client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallStats {
    /// Every request sent, including retries after HTTP 429
    pub api_call_count: u64,
    pub last_call_at: Option<DateTime<Utc>>,
    pub last_call_duration: Option<Duration>,
}

/// Transport decorator counting and timing every request.
pub(crate) struct InstrumentedTransport {
    inner: Arc<dyn Transport>,
    stats: Mutex<CallStats>,
}

impl InstrumentedTransport {
    pub(crate) fn new(inner: Arc<dyn Transport>) -> Self {
        Self { inner, stats: Mutex::new(CallStats::default()) }
    }

    pub(crate) fn stats(&self) -> CallStats {
        *self.stats.lock()
    }
}

#[async_trait]
impl Transport for InstrumentedTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let started_at = Utc::now();
        let started = Instant::now();
        let result = self.inner.send(request).await;

        let mut stats = self.stats.lock();
        stats.api_call_count += 1;
        stats.last_call_at = Some(started_at);
        stats.last_call_duration = Some(started.elapsed());
        result
    }
}
