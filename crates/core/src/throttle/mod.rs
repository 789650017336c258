//! Throttle-aware request execution

pub mod executor;

pub use executor::{parse_wait_seconds, remote_detail, Completion, ThrottleExecutor, ThrottledResponse};
