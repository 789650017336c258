//! Shared test helpers for `oshub-core` integration tests.
//!
//! These helpers provide a scripted in-memory transport so that executor,
//! engine and pipeline tests can focus on behaviour instead of HTTP.

#![allow(dead_code)]

pub mod transport;
