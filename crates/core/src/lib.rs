//! # oshub Core
//!
//! Client logic for the Open Supply Hub API - no I/O of its own.
//!
//! This crate contains:
//! - The [`Transport`] port every request goes through
//! - The throttle-aware request executor (HTTP 429 backoff)
//! - The facility match engine (uploads and the match lifecycle)
//! - The bulk upload pipeline (column mapping, cleansing, diagnosis)
//!
//! ## Architecture Principles
//! - Only depends on `oshub-domain`
//! - No HTTP client or filesystem code
//! - All remote calls via the `Transport` trait
//! - Testable with in-memory transports

pub mod bulk;
pub mod matching;
pub mod ports;
pub mod throttle;

pub use bulk::{bulk_submit, BulkOptions, BulkSummary, ColumnMapping};
pub use matching::FacilityMatchEngine;
pub use ports::{ApiRequest, ApiResponse, HttpMethod, Transport};
pub use throttle::{Completion, ThrottleExecutor, ThrottledResponse};
