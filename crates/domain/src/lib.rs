//! # oshub Domain
//!
//! Domain types and models for the Open Supply Hub client.
//!
//! This crate contains:
//! - Facility records, upload results and match lifecycle types
//! - Domain error types and Result definitions
//! - Client configuration structures
//! - Endpoint paths and wire constants
//!
//! ## Architecture
//! - No dependencies on other oshub crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
