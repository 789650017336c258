//! Interpretation of create/match and facility-match response bodies

use oshub_domain::types::matching::match_id_from_url;
use oshub_domain::{
    FacilityMatchRecord, MatchCandidate, MatchState, OshError, Result, Submission,
    SubmissionMetadata, UploadResult,
};
use serde_json::Value;

use crate::throttle::ThrottledResponse;

/// Turn a create/match response into a [`Submission`].
///
/// With `create` false a `NEW_FACILITY` answer is a dry run: the record
/// would be new, but nothing was persisted, so it comes back as an empty
/// potential match even when the body carries an `os_id`.
///
/// # Errors
///
/// Returns `OshError::MalformedResponse` when the status is missing or
/// unknown, or the body lacks a field its status requires.
pub fn interpret_submission(response: &ThrottledResponse, create: bool) -> Result<Submission> {
    let body = &response.body;
    let status = str_field(body, "status")
        .ok_or_else(|| OshError::MalformedResponse(format!("missing status in {body}")))?;
    let os_id = str_field(body, "os_id").filter(|id| !id.is_empty());

    let result = match status {
        "MATCHED" => UploadResult::Matched { os_id: require_os_id(os_id, status)? },
        "NEW_FACILITY" if !create => UploadResult::PotentialMatch { candidates: Vec::new() },
        "NEW_FACILITY" => UploadResult::NewFacility { os_id: require_os_id(os_id, status)? },
        "POTENTIAL_MATCH" => UploadResult::PotentialMatch {
            candidates: body
                .get("matches")
                .and_then(Value::as_array)
                .map(|matches| matches.iter().filter_map(parse_candidate).collect())
                .unwrap_or_default(),
        },
        "ERROR_MATCHING" | "ERROR" => UploadResult::Error { reason: error_reason(body, status) },
        other => {
            return Err(OshError::MalformedResponse(format!("unknown status {other}")));
        }
    };

    Ok(Submission { result, metadata: metadata(body) })
}

/// Read one candidate in either the flat or the GeoJSON feature shape.
///
/// Candidates without an `os_id` cannot be confirmed and yield `None`.
pub fn parse_candidate(value: &Value) -> Option<MatchCandidate> {
    let properties = value.get("properties");
    let field = |key: &str| {
        str_field(value, key).or_else(|| properties.and_then(|p| str_field(p, key)))
    };

    let os_id = str_field(value, "os_id")
        .or_else(|| str_field(value, "id"))
        .or_else(|| properties.and_then(|p| str_field(p, "os_id")))
        .filter(|id| !id.trim().is_empty())?;

    let confirm_match_url = field("confirm_match_url").map(str::to_string);
    let reject_match_url = field("reject_match_url").map(str::to_string);
    let match_id = value
        .get("match_id")
        .and_then(Value::as_u64)
        .or_else(|| confirm_match_url.as_deref().and_then(match_id_from_url))
        .or_else(|| reject_match_url.as_deref().and_then(match_id_from_url));

    Some(MatchCandidate {
        os_id: os_id.trim().to_string(),
        name: field("name").unwrap_or_default().to_string(),
        address: field("address").unwrap_or_default().to_string(),
        confidence: value
            .get("confidence")
            .or_else(|| properties.and_then(|p| p.get("confidence")))
            .and_then(number)
            .unwrap_or(0.0),
        match_id,
        confirm_match_url,
        reject_match_url,
    })
}

/// Parse `GET /api/facility-matches/{id}/`.
///
/// # Errors
///
/// Returns `OshError::MalformedResponse` when `id` or `status` is missing or
/// not understood.
pub fn parse_match_record(body: &Value) -> Result<FacilityMatchRecord> {
    let id = body
        .get("id")
        .and_then(Value::as_u64)
        .ok_or_else(|| OshError::MalformedResponse(format!("facility match without id: {body}")))?;
    let status = str_field(body, "status")
        .ok_or_else(|| OshError::MalformedResponse(format!("facility match {id} without status")))?
        .parse::<MatchState>()
        .map_err(OshError::MalformedResponse)?;
    let location = body.get("location");

    Ok(FacilityMatchRecord {
        id,
        status,
        confidence: body.get("confidence").and_then(number).unwrap_or(0.0),
        os_id: str_field(body, "os_id").unwrap_or_default().to_string(),
        name: str_field(body, "name").unwrap_or_default().to_string(),
        address: str_field(body, "address").unwrap_or_default().to_string(),
        lat: location.and_then(|l| l.get("lat")).and_then(number),
        lon: location.and_then(|l| l.get("lng").or_else(|| l.get("lon"))).and_then(number),
        is_active: body.get("is_active").and_then(Value::as_bool).unwrap_or(false),
    })
}

/// Result of a confirm or reject call.
///
/// Confirming yields the accepted facility; rejecting yields the facility
/// created for the uploaded record. `known_os_id` is the candidate's OS ID
/// as recorded when the match was first seen, used when the body omits it.
///
/// # Errors
///
/// Returns `OshError::MalformedResponse` when no OS ID can be determined.
pub fn interpret_vote(
    body: &Value,
    outcome: MatchState,
    known_os_id: Option<&str>,
) -> Result<UploadResult> {
    let os_id = str_field(body, "os_id").filter(|id| !id.is_empty());
    match outcome {
        MatchState::Confirmed => os_id
            .or(known_os_id)
            .map(|os_id| UploadResult::Matched { os_id: os_id.to_string() })
            .ok_or_else(|| missing_os_id("CONFIRMED")),
        MatchState::Rejected => os_id
            .or_else(|| str_field(body, "new_os_id").filter(|id| !id.is_empty()))
            .map(|os_id| UploadResult::NewFacility { os_id: os_id.to_string() })
            .ok_or_else(|| missing_os_id("REJECTED")),
        MatchState::Pending => {
            Err(OshError::MalformedResponse("a vote cannot leave a match PENDING".into()))
        }
    }
}

fn metadata(body: &Value) -> SubmissionMetadata {
    let coordinates = body
        .get("geocoded_geometry")
        .and_then(|g| g.get("coordinates"))
        .and_then(Value::as_array);
    let coordinate = |index: usize, key: &str| {
        coordinates
            .and_then(|c| c.get(index))
            .and_then(number)
            .or_else(|| body.get(key).and_then(number))
    };

    SubmissionMetadata {
        item_id: body.get("item_id").and_then(Value::as_u64),
        lon: coordinate(0, "lon"),
        lat: coordinate(1, "lat"),
        geocoded_address: str_field(body, "geocoded_address").map(str::to_string),
    }
}

fn error_reason(body: &Value, status: &str) -> String {
    str_field(body, "detail")
        .or_else(|| str_field(body, "message"))
        .map(str::to_string)
        .or_else(|| body.get("errors").filter(|e| !e.is_null()).map(Value::to_string))
        .unwrap_or_else(|| status.to_string())
}

fn require_os_id(os_id: Option<&str>, status: &str) -> Result<String> {
    os_id.map(str::to_string).ok_or_else(|| missing_os_id(status))
}

fn missing_os_id(status: &str) -> OshError {
    OshError::MalformedResponse(format!("{status} response without os_id"))
}

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

/// Numbers may arrive as JSON numbers or as formatted strings.
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
