//! Facility match engine
//!
//! Submits facility records, interprets the answer and drives the
//! `PENDING -> CONFIRMED | REJECTED` lifecycle of the matches it produces.

use std::collections::HashMap;
use std::sync::Arc;

use oshub_domain::constants::{FACILITIES_PATH, FACILITY_MATCHES_PATH};
use oshub_domain::{
    ClientConfig, FacilityMatchRecord, FacilityRecord, MatchCandidate, MatchRef, MatchState,
    Result, Submission, UploadResult,
};
use parking_lot::Mutex;
use tracing::{debug, info, instrument};

use super::interpret::{interpret_submission, interpret_vote, parse_match_record};
use crate::ports::{ApiRequest, Transport};
use crate::throttle::ThrottleExecutor;

#[derive(Debug, Clone)]
struct LedgerEntry {
    state: MatchState,
    /// OS ID of the candidate facility the match points at
    os_id: Option<String>,
}

/// Uploads facility records and votes on potential matches.
///
/// The engine remembers the state of every match it has seen. A match known
/// to be terminal is rejected locally; an unknown match is looked up before
/// voting.
pub struct FacilityMatchEngine {
    executor: ThrottleExecutor,
    public: bool,
    text_only_fallback: bool,
    ledger: Mutex<HashMap<u64, LedgerEntry>>,
}

impl FacilityMatchEngine {
    /// Create an engine issuing public uploads without text-only fallback.
    pub fn new(executor: ThrottleExecutor) -> Self {
        Self { executor, public: true, text_only_fallback: false, ledger: Mutex::new(HashMap::new()) }
    }

    /// Create an engine using the budget and upload flags of `config`.
    ///
    /// # Errors
    ///
    /// Returns `OshError::Config` when the throttle budget is not finite.
    pub fn from_config(transport: Arc<dyn Transport>, config: &ClientConfig) -> Result<Self> {
        Ok(Self::new(ThrottleExecutor::new(transport, config.throttle_budget_secs)?)
            .with_public(config.public)
            .with_text_only_fallback(config.text_only_fallback))
    }

    pub fn with_public(mut self, public: bool) -> Self {
        self.public = public;
        self
    }

    pub fn with_text_only_fallback(mut self, enabled: bool) -> Self {
        self.text_only_fallback = enabled;
        self
    }

    pub fn executor(&self) -> &ThrottleExecutor {
        &self.executor
    }

    /// Submit `record` and return its outcome.
    ///
    /// # Errors
    ///
    /// See [`Self::submit_detailed`].
    pub async fn submit(&self, record: &FacilityRecord, create: bool) -> Result<UploadResult> {
        self.submit_detailed(record, create).await.map(|submission| submission.result)
    }

    /// Submit `record` and return its outcome with the response metadata.
    ///
    /// With `create = false` nothing is persisted remotely; a record that
    /// would be new comes back as an empty potential match.
    ///
    /// # Errors
    ///
    /// - `OshError::InvalidInput` when name, address or country is blank (no
    ///   request is sent)
    /// - any executor error
    /// - `OshError::MalformedResponse` when the body cannot be interpreted
    #[instrument(skip(self, record), fields(name = %record.name, country = %record.country))]
    pub async fn submit_detailed(&self, record: &FacilityRecord, create: bool) -> Result<Submission> {
        record.validate()?;

        let request = ApiRequest::post(FACILITIES_PATH, Some(record.to_payload()))
            .with_flag("create", create)
            .with_flag("public", self.public)
            .with_flag("textonlyfallback", self.text_only_fallback);

        let response = self.executor.execute(&request).await?;
        let submission = interpret_submission(&response, create)?;
        self.observe_candidates(submission.result.candidates());

        debug!(
            status = %submission.result.status(),
            os_id = submission.result.os_id().unwrap_or_default(),
            candidates = submission.result.candidates().len(),
            "Facility submitted"
        );
        Ok(submission)
    }

    /// Fetch the detailed record of a match.
    ///
    /// # Errors
    ///
    /// Returns `OshError::InvalidInput` for a URL without a match id, any
    /// executor error, or `OshError::MalformedResponse`.
    #[instrument(skip(self, match_ref), fields(match_ref = %match_ref))]
    pub async fn get_match(&self, match_ref: &MatchRef) -> Result<FacilityMatchRecord> {
        let match_id = match_ref.match_id()?;
        let request = ApiRequest::get(format!("{FACILITY_MATCHES_PATH}{match_id}/"));
        let response = self.executor.execute(&request).await?;
        let record = parse_match_record(&response.body)?;

        let mut ledger = self.ledger.lock();
        let entry = ledger
            .entry(record.id)
            .or_insert_with(|| LedgerEntry { state: record.status, os_id: None });
        if !entry.state.is_terminal() {
            entry.state = record.status;
        }
        if entry.os_id.is_none() && !record.os_id.is_empty() {
            entry.os_id = Some(record.os_id.clone());
        }
        Ok(record)
    }

    /// Accept a potential match. The result is `Matched` with the OS ID of
    /// the accepted facility.
    ///
    /// # Errors
    ///
    /// Returns `OshError::InvalidState` when the match is not pending.
    pub async fn confirm(&self, match_ref: &MatchRef) -> Result<UploadResult> {
        self.vote(match_ref, MatchState::Confirmed).await
    }

    /// Decline a potential match. The result is `NewFacility` carrying the
    /// OS ID created for the uploaded record.
    ///
    /// # Errors
    ///
    /// Returns `OshError::InvalidState` when the match is not pending.
    pub async fn reject(&self, match_ref: &MatchRef) -> Result<UploadResult> {
        self.vote(match_ref, MatchState::Rejected).await
    }

    /// Last observed state of a match, if the engine has seen it.
    pub fn match_state(&self, match_id: u64) -> Option<MatchState> {
        self.ledger.lock().get(&match_id).map(|entry| entry.state)
    }

    #[instrument(skip(self, match_ref), fields(match_ref = %match_ref))]
    async fn vote(&self, match_ref: &MatchRef, outcome: MatchState) -> Result<UploadResult> {
        let match_id = match_ref.match_id()?;

        let known = self.ledger.lock().get(&match_id).cloned();
        let entry = match known {
            Some(entry) => entry,
            None => {
                let record = self.get_match(&MatchRef::Id(match_id)).await?;
                LedgerEntry {
                    state: record.status,
                    os_id: Some(record.os_id).filter(|id| !id.is_empty()),
                }
            }
        };
        entry.state.transition(match_id, outcome)?;

        let action = match outcome {
            MatchState::Confirmed => "confirm",
            _ => "reject",
        };
        let request = ApiRequest::post(format!("{FACILITY_MATCHES_PATH}{match_id}/{action}/"), None);
        let response = self.executor.execute(&request).await?;
        let result = interpret_vote(&response.body, outcome, entry.os_id.as_deref())?;

        self.ledger.lock().insert(match_id, LedgerEntry { state: outcome, os_id: entry.os_id });
        info!(match_id, status = %result.status(), "Facility match resolved");
        Ok(result)
    }

    fn observe_candidates(&self, candidates: &[MatchCandidate]) {
        let mut ledger = self.ledger.lock();
        for candidate in candidates {
            if let Some(match_id) = candidate.match_id {
                ledger.entry(match_id).or_insert_with(|| LedgerEntry {
                    state: MatchState::Pending,
                    os_id: Some(candidate.os_id.clone()),
                });
            }
        }
    }
}
