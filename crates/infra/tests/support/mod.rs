#![allow(dead_code)]

use std::sync::Once;

use oshub_infra::OshClient;
use wiremock::MockServer;

pub const TOKEN: &str = "test-token-0123456789";

static TRACING: Once = Once::new();

/// Install a test subscriber once so `RUST_LOG=debug` shows client logs.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Client pointed at `server` with a token and a short throttle budget.
pub fn client_for(server: &MockServer) -> OshClient {
    init_tracing();
    OshClient::builder()
        .base_url(server.uri())
        .token(TOKEN)
        .throttle_budget_secs(2.0)
        .build()
        .expect("client should build")
}
