//! Tabular row helpers
//!
//! Every list-returning operation produces rows: string keyed JSON maps whose
//! insertion order is preserved (`serde_json` is built with
//! `preserve_order`), so they export to CSV/DataFrame-like structures without
//! re-sorting columns.

use serde_json::{Map, Value};

/// A single normalized record.
pub type Row = Map<String, Value>;

/// Read a column as a trimmed string.
///
/// Numbers and booleans are rendered with their JSON spelling so that
/// spreadsheet-sourced rows (where a postcode may arrive as a number) still
/// produce text. `null` and missing columns yield `None`.
pub fn text(row: &Row, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Like [`text`] but treats empty strings as absent.
pub fn non_empty_text(row: &Row, column: &str) -> Option<String> {
    text(row, column).filter(|s| !s.is_empty())
}

/// Render any JSON value as a flat cell: strings as-is, `null` as empty.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
