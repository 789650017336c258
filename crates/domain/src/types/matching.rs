//! Facility match lifecycle
//!
//! A match is created implicitly when an upload returns `POTENTIAL_MATCH`.
//! It starts `PENDING` and moves exactly once, to `CONFIRMED` or `REJECTED`.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::{OshError, Result};

static MATCH_URL_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"facility-matches/(\d+)(?:/|$)").expect("MATCH_URL_ID should compile - this is a bug")
});

/// Lifecycle state of a facility match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchState {
    Pending,
    Confirmed,
    Rejected,
}

crate::impl_wire_status_conversions!(MatchState {
    Pending => "PENDING",
    Confirmed => "CONFIRMED",
    Rejected => "REJECTED",
});

impl MatchState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Check that `self -> next` is a permitted transition.
    ///
    /// # Errors
    ///
    /// Returns `OshError::InvalidState` unless `self` is `Pending` and `next`
    /// is terminal.
    pub fn transition(self, match_id: u64, next: MatchState) -> Result<MatchState> {
        match (self, next) {
            (Self::Pending, Self::Confirmed | Self::Rejected) => Ok(next),
            (current, _) => {
                Err(OshError::InvalidState { match_id, state: current.to_string() })
            }
        }
    }
}

/// Reference to a facility match, by numeric id or by its voting URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatchRef {
    Id(u64),
    /// `/api/facility-matches/{id}/confirm/` or `/reject/`, absolute or
    /// relative
    Url(String),
}

impl MatchRef {
    /// Resolve the numeric match id.
    ///
    /// # Errors
    ///
    /// Returns `OshError::InvalidInput` when a URL does not contain a
    /// `facility-matches/{id}` segment.
    pub fn match_id(&self) -> Result<u64> {
        match self {
            Self::Id(id) => Ok(*id),
            Self::Url(url) => match_id_from_url(url).ok_or_else(|| {
                OshError::InvalidInput(format!("No facility match id in URL: {url}"))
            }),
        }
    }
}

impl From<u64> for MatchRef {
    fn from(id: u64) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for MatchRef {
    fn from(url: &str) -> Self {
        Self::Url(url.to_string())
    }
}

impl From<String> for MatchRef {
    fn from(url: String) -> Self {
        Self::Url(url)
    }
}

impl fmt::Display for MatchRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Url(url) => f.write_str(url),
        }
    }
}

/// Extract `{id}` from a `facility-matches/{id}/...` URL.
pub fn match_id_from_url(url: &str) -> Option<u64> {
    MATCH_URL_ID
        .captures(url)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Detailed match record as returned by `GET /api/facility-matches/{id}/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityMatchRecord {
    pub id: u64,
    pub status: MatchState,
    pub confidence: f64,
    pub os_id: String,
    pub name: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(default)]
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_id_from_relative_and_absolute_urls() {
        assert_eq!(match_id_from_url("/api/facility-matches/42/confirm/"), Some(42));
        assert_eq!(
            match_id_from_url("https://opensupplyhub.org/api/facility-matches/7/reject/"),
            Some(7)
        );
        assert_eq!(match_id_from_url("/api/facility-matches/9"), Some(9));
        assert_eq!(match_id_from_url("/api/facilities/42/"), None);
    }

    #[test]
    fn test_match_ref_resolution() {
        assert_eq!(MatchRef::from(5u64).match_id().unwrap(), 5);
        assert_eq!(MatchRef::from("/api/facility-matches/11/confirm/").match_id().unwrap(), 11);
        assert!(matches!(
            MatchRef::from("not a url").match_id(),
            Err(OshError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_only_pending_may_transition() {
        assert_eq!(
            MatchState::Pending.transition(1, MatchState::Confirmed).unwrap(),
            MatchState::Confirmed
        );
        assert_eq!(
            MatchState::Pending.transition(1, MatchState::Rejected).unwrap(),
            MatchState::Rejected
        );

        let err = MatchState::Confirmed.transition(1, MatchState::Rejected).unwrap_err();
        assert_eq!(err, OshError::InvalidState { match_id: 1, state: "CONFIRMED".into() });
        assert!(MatchState::Pending.transition(1, MatchState::Pending).is_err());
    }

    #[test]
    fn test_state_parsing() {
        assert_eq!("pending".parse::<MatchState>(), Ok(MatchState::Pending));
        assert!(MatchState::Rejected.is_terminal());
        assert!(!MatchState::Pending.is_terminal());
    }
}
