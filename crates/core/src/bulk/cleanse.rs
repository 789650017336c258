//! Removal of `N/A` placeholders and stray separators from text cells
//!
//! Spreadsheet exports often fill blank address parts with `N/A`, leaving
//! values like `"Jaya, N/A, Selangor ,"`. Cleansing runs these steps in
//! order:
//!
//! 1. remove every `, N/A` segment (case-insensitive)
//! 2. remove remaining `N/A` tokens, repeatedly
//! 3. collapse whitespace runs to a single space
//! 4. collapse comma runs to a single comma
//! 5. trim whitespace and commas at both ends
//!
//! The operation is idempotent.

use once_cell::sync::Lazy;
use oshub_domain::Row;
use regex::Regex;
use serde_json::Value;

static COMMA_NOT_AVAILABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i),\s*N/A").expect("COMMA_NOT_AVAILABLE should compile - this is a bug")
});

static NOT_AVAILABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)N/A").expect("NOT_AVAILABLE should compile - this is a bug"));

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("WHITESPACE_RUN should compile - this is a bug"));

static COMMA_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",{2,}").expect("COMMA_RUN should compile - this is a bug"));

/// Cleanse a single text value.
pub fn cleanse_text(text: &str) -> String {
    let mut cleansed = COMMA_NOT_AVAILABLE.replace_all(text, "").into_owned();
    while NOT_AVAILABLE.is_match(&cleansed) {
        cleansed = NOT_AVAILABLE.replace_all(&cleansed, "").into_owned();
    }
    let cleansed = WHITESPACE_RUN.replace_all(&cleansed, " ");
    let cleansed = COMMA_RUN.replace_all(&cleansed, ",");
    cleansed.trim_matches(|c: char| c == ',' || c.is_whitespace()).to_string()
}

/// Cleanse every string in `row`, including strings inside arrays.
///
/// Returns true when any value changed.
pub fn cleanse_row(row: &mut Row) -> bool {
    row.values_mut().fold(false, |changed, value| cleanse_value(value) | changed)
}

fn cleanse_value(value: &mut Value) -> bool {
    match value {
        Value::String(text) => {
            let cleansed = cleanse_text(text);
            let changed = cleansed != *text;
            *text = cleansed;
            changed
        }
        Value::Array(items) => items.iter_mut().fold(false, |changed, item| cleanse_value(item) | changed),
        _ => false,
    }
}
