//! Bulk upload pipeline

pub mod cleanse;
pub mod mapping;
pub mod pipeline;

pub use cleanse::{cleanse_row, cleanse_text};
pub use mapping::ColumnMapping;
pub use pipeline::{bulk_submit, diagnose, BulkOptions, BulkSummary};
