//! Reference data shared by several endpoints

use serde::{Deserialize, Serialize};

use crate::constants::WORKERS_RANGE_UNBOUNDED;

/// Desired state in an open/closed report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClosureState {
    Open,
    Closed,
}

crate::impl_wire_status_conversions!(ClosureState {
    Open => "OPEN",
    Closed => "CLOSED",
});

/// A worker count bucket such as `"1001-5000"` or `"Less than 1000"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkersRange {
    pub workers_range: String,
    pub lower: i64,
    pub upper: i64,
}

impl WorkersRange {
    /// Parse the bounds out of a range label.
    ///
    /// `"a-b"` gives `(a, b)`, `"Less than N"` gives `(1, N)`,
    /// `"More than N"` gives `(N, 999999)`; anything unrecognised is
    /// `(-1, -1)`.
    pub fn parse(label: &str) -> Self {
        let number = |s: &str| s.trim().replace(',', "").parse::<i64>().ok();
        let last_word = || label.split_whitespace().last().and_then(number);

        let bounds = if let Some((lower, upper)) = label.split_once('-') {
            number(lower).zip(number(upper))
        } else if label.contains("Less") {
            last_word().map(|upper| (1, upper))
        } else if label.contains("More") {
            last_word().map(|lower| (lower, WORKERS_RANGE_UNBOUNDED))
        } else {
            None
        };

        let (lower, upper) = bounds.unwrap_or((-1, -1));
        Self { workers_range: label.to_string(), lower, upper }
    }
}
