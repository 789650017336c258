//! Upload outcomes returned by the create/match endpoint

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::row::Row;
use crate::constants::{COLUMN_ERROR, COLUMN_MATCHES, COLUMN_OS_ID, COLUMN_STATUS};

/// Status column written for every processed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UploadStatus {
    NewFacility,
    Matched,
    PotentialMatch,
    Error,
    /// Throttle budget exhausted before the record got an answer
    Timeout,
}

crate::impl_wire_status_conversions!(UploadStatus {
    NewFacility => "NEW_FACILITY",
    Matched => "MATCHED",
    PotentialMatch => "POTENTIAL_MATCH",
    Error => "ERROR",
    Timeout => "TIMEOUT",
});

/// An existing facility the remote system considers a plausible duplicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub os_id: String,
    pub name: String,
    pub address: String,
    /// Matching score between 0.0 and 1.0
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirm_match_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reject_match_url: Option<String>,
}

/// Outcome of submitting one facility record.
///
/// `PotentialMatch` is the only non-terminal variant. Its candidates keep the
/// order the remote system sent them in and are never edited; confirming or
/// rejecting produces a fresh terminal result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UploadResult {
    NewFacility {
        os_id: String,
    },
    Matched {
        os_id: String,
    },
    PotentialMatch {
        #[serde(rename = "matches")]
        candidates: Vec<MatchCandidate>,
    },
    Error {
        reason: String,
    },
}

impl UploadResult {
    pub fn status(&self) -> UploadStatus {
        match self {
            Self::NewFacility { .. } => UploadStatus::NewFacility,
            Self::Matched { .. } => UploadStatus::Matched,
            Self::PotentialMatch { .. } => UploadStatus::PotentialMatch,
            Self::Error { .. } => UploadStatus::Error,
        }
    }

    pub fn os_id(&self) -> Option<&str> {
        match self {
            Self::NewFacility { os_id } | Self::Matched { os_id } => Some(os_id),
            _ => None,
        }
    }

    pub fn candidates(&self) -> &[MatchCandidate] {
        match self {
            Self::PotentialMatch { candidates } => candidates,
            _ => &[],
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::PotentialMatch { .. })
    }

    /// A potential match without usable candidates: nothing matched, and the
    /// record may be resubmitted with `create=true` to persist it.
    pub fn is_unmatched(&self) -> bool {
        matches!(self, Self::PotentialMatch { candidates } if candidates.is_empty())
    }

    /// Write `status`, `os_id`, `matches` and `error` columns onto `row`.
    pub fn merge_into(&self, row: &mut Row) {
        row.insert(COLUMN_STATUS.into(), Value::String(self.status().to_string()));
        match self {
            Self::NewFacility { os_id } | Self::Matched { os_id } => {
                row.insert(COLUMN_OS_ID.into(), Value::String(os_id.clone()));
            }
            Self::PotentialMatch { candidates } => {
                let matches = serde_json::to_value(candidates).unwrap_or(Value::Array(Vec::new()));
                row.insert(COLUMN_MATCHES.into(), matches);
            }
            Self::Error { reason } => {
                row.insert(COLUMN_ERROR.into(), Value::String(reason.clone()));
            }
        }
    }
}

/// Extra fields the create/match endpoint returns next to the status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmissionMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geocoded_address: Option<String>,
}

impl SubmissionMetadata {
    pub fn merge_into(&self, row: &mut Row) {
        if let Some(item_id) = self.item_id {
            row.insert("item_id".into(), Value::from(item_id));
        }
        if let Some(lon) = self.lon {
            row.insert("lon".into(), Value::from(lon));
        }
        if let Some(lat) = self.lat {
            row.insert("lat".into(), Value::from(lat));
        }
        if let Some(address) = &self.geocoded_address {
            row.insert("geocoded_address".into(), Value::String(address.clone()));
        }
    }
}

/// An upload result together with its response metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub result: UploadResult,
    #[serde(default)]
    pub metadata: SubmissionMetadata,
}

impl Submission {
    pub fn new(result: UploadResult) -> Self {
        Self { result, metadata: SubmissionMetadata::default() }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn candidate(os_id: &str) -> MatchCandidate {
        MatchCandidate {
            os_id: os_id.into(),
            name: "Acme".into(),
            address: "1 Rd".into(),
            confidence: 0.8,
            match_id: Some(7),
            confirm_match_url: None,
            reject_match_url: None,
        }
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(UploadResult::Matched { os_id: "US1".into() }.status().as_str(), "MATCHED");
        assert_eq!(UploadStatus::Timeout.to_string(), "TIMEOUT");
        assert_eq!("potential_match".parse::<UploadStatus>(), Ok(UploadStatus::PotentialMatch));
    }

    #[test]
    fn test_serializes_with_status_tag() {
        let value = serde_json::to_value(UploadResult::NewFacility { os_id: "US9".into() }).unwrap();
        assert_eq!(value, json!({"status": "NEW_FACILITY", "os_id": "US9"}));

        let value =
            serde_json::to_value(UploadResult::PotentialMatch { candidates: vec![candidate("A")] })
                .unwrap();
        assert_eq!(value["status"], "POTENTIAL_MATCH");
        assert_eq!(value["matches"][0]["os_id"], "A");
    }

    #[test]
    fn test_unmatched_only_for_empty_potential_match() {
        assert!(UploadResult::PotentialMatch { candidates: vec![] }.is_unmatched());
        assert!(!UploadResult::PotentialMatch { candidates: vec![candidate("A")] }.is_unmatched());
        assert!(!UploadResult::Error { reason: "x".into() }.is_unmatched());
    }

    #[test]
    fn test_terminal_variants() {
        assert!(UploadResult::Matched { os_id: "A".into() }.is_terminal());
        assert!(UploadResult::Error { reason: "x".into() }.is_terminal());
        assert!(!UploadResult::PotentialMatch { candidates: vec![] }.is_terminal());
    }

    #[test]
    fn test_merge_into_keeps_existing_columns() {
        let mut row = Row::new();
        row.insert("my_field".into(), json!("ID12345"));

        UploadResult::Matched { os_id: "US123".into() }.merge_into(&mut row);
        SubmissionMetadata { item_id: Some(3), ..Default::default() }.merge_into(&mut row);

        assert_eq!(row["my_field"], "ID12345");
        assert_eq!(row["status"], "MATCHED");
        assert_eq!(row["os_id"], "US123");
        assert_eq!(row["item_id"], 3);
        assert!(row.get("lon").is_none());
    }

    #[test]
    fn test_candidate_order_preserved() {
        let result = UploadResult::PotentialMatch {
            candidates: vec![candidate("B"), candidate("A"), candidate("C")],
        };
        let ids: Vec<_> = result.candidates().iter().map(|c| c.os_id.as_str()).collect();
        assert_eq!(ids, ["B", "A", "C"]);
    }
}
