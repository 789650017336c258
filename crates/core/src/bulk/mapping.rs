//! Column renaming applied before a row is interpreted

use std::collections::HashSet;

use oshub_domain::{OshError, Result, Row};
use serde::{Deserialize, Serialize};

/// Source to target column renames.
///
/// Renamed columns keep their position. When the target name already exists
/// in the row, the renamed column replaces it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnMapping {
    pairs: Vec<(String, String)>,
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.insert(source, target);
        self
    }

    pub fn insert(&mut self, source: impl Into<String>, target: impl Into<String>) {
        let source = source.into();
        let target = target.into();
        match self.pairs.iter_mut().find(|(s, _)| *s == source) {
            Some(pair) => pair.1 = target,
            None => self.pairs.push((source, target)),
        }
    }

    /// Parse a `source=target` argument.
    ///
    /// # Errors
    ///
    /// Returns `OshError::InvalidInput` when either side is empty or `=` is
    /// missing.
    pub fn parse_pair(spec: &str) -> Result<(String, String)> {
        spec.split_once('=')
            .map(|(s, t)| (s.trim().to_string(), t.trim().to_string()))
            .filter(|(s, t)| !s.is_empty() && !t.is_empty())
            .ok_or_else(|| OshError::InvalidInput(format!("Expected source=target, got {spec:?}")))
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn target_of(&self, source: &str) -> Option<&str> {
        self.pairs.iter().find(|(s, _)| s == source).map(|(_, t)| t.as_str())
    }

    /// Rename the columns of `row`.
    pub fn apply(&self, row: Row) -> Row {
        if self.pairs.is_empty() {
            return row;
        }

        let replaced: HashSet<&str> = self
            .pairs
            .iter()
            .filter(|(source, _)| row.contains_key(source))
            .map(|(_, target)| target.as_str())
            .collect();

        let mut mapped = Row::with_capacity(row.len());
        for (key, value) in &row {
            match self.target_of(key) {
                Some(target) => {
                    mapped.insert(target.to_string(), value.clone());
                }
                None if replaced.contains(key.as_str()) => {}
                None => {
                    mapped.insert(key.clone(), value.clone());
                }
            }
        }
        mapped
    }
}

impl<S: Into<String>, T: Into<String>> FromIterator<(S, T)> for ColumnMapping {
    fn from_iter<I: IntoIterator<Item = (S, T)>>(iter: I) -> Self {
        let mut mapping = Self::new();
        for (source, target) in iter {
            mapping.insert(source, target);
        }
        mapping
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn row(value: serde_json::Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_renames_keep_position_and_passthrough() {
        let mapping = ColumnMapping::new().with("supplier", "name").with("street and city", "address");
        let mapped = mapping.apply(row(json!({
            "supplier": "Acme",
            "my_field": "ID1",
            "street and city": "1 Rd, Town",
            "country": "US"
        })));

        let keys: Vec<_> = mapped.keys().map(String::as_str).collect();
        assert_eq!(keys, ["name", "my_field", "address", "country"]);
        assert_eq!(mapped["name"], "Acme");
        assert_eq!(mapped["address"], "1 Rd, Town");
    }

    #[test]
    fn test_renamed_column_replaces_existing_target() {
        let mapping = ColumnMapping::new().with("supplier", "name");
        let mapped = mapping.apply(row(json!({"name": "old", "supplier": "new"})));
        assert_eq!(mapped.len(), 1);
        assert_eq!(mapped["name"], "new");
    }

    #[test]
    fn test_absent_source_leaves_target_alone() {
        let mapping = ColumnMapping::new().with("supplier", "name");
        let mapped = mapping.apply(row(json!({"name": "kept"})));
        assert_eq!(mapped["name"], "kept");
    }

    #[test]
    fn test_parse_pair() {
        assert_eq!(
            ColumnMapping::parse_pair("supplier=name").unwrap(),
            ("supplier".to_string(), "name".to_string())
        );
        assert!(ColumnMapping::parse_pair("supplier").is_err());
        assert!(ColumnMapping::parse_pair("=name").is_err());
    }

    #[test]
    fn test_deserializes_from_pairs() {
        let mapping: ColumnMapping = serde_json::from_value(json!([["a", "b"]])).unwrap();
        assert_eq!(mapping.target_of("a"), Some("b"));
    }
}
