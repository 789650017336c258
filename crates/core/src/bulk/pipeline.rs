//! Record-by-record bulk submission
//!
//! Every input row produces exactly one output row, in input order. Failures
//! are written into the row and never stop the batch.

use oshub_domain::constants::{
    COLUMN_CLEANSED, COLUMN_DIAGNOSIS, COLUMN_ERROR, COLUMN_STATUS, DIAGNOSIS_VALID,
};
use oshub_domain::{FacilityRecord, OshError, Result, Row, Submission, UploadStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::cleanse::cleanse_row;
use super::mapping::ColumnMapping;
use crate::matching::FacilityMatchEngine;

/// Options for [`bulk_submit`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulkOptions {
    /// Strip `N/A` placeholders and stray separators from text cells
    pub cleanse: bool,
    /// Persist records the dry run reports as unmatched
    pub auto_create: bool,
    pub column_mapping: ColumnMapping,
}

/// Per-status counts over processed rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkSummary {
    pub total: usize,
    pub new_facility: usize,
    pub matched: usize,
    pub potential_match: usize,
    pub error: usize,
    pub timeout: usize,
    /// Rows rejected before submission for missing columns
    pub invalid: usize,
}

impl BulkSummary {
    pub fn from_rows(rows: &[Row]) -> Self {
        let mut summary = Self { total: rows.len(), ..Self::default() };
        for row in rows {
            let status = row
                .get(COLUMN_STATUS)
                .and_then(Value::as_str)
                .and_then(|s| s.parse::<UploadStatus>().ok());
            match status {
                Some(UploadStatus::NewFacility) => summary.new_facility += 1,
                Some(UploadStatus::Matched) => summary.matched += 1,
                Some(UploadStatus::PotentialMatch) => summary.potential_match += 1,
                Some(UploadStatus::Timeout) => summary.timeout += 1,
                Some(UploadStatus::Error) | None => summary.error += 1,
            }
            let diagnosed_invalid = row
                .get(COLUMN_DIAGNOSIS)
                .and_then(Value::as_str)
                .is_some_and(|d| d != DIAGNOSIS_VALID);
            if diagnosed_invalid {
                summary.invalid += 1;
            }
        }
        summary
    }
}

/// Check the required columns of a mapped row.
///
/// # Errors
///
/// Returns the diagnosis text, e.g. `"MISSING column(s) name, country"`.
pub fn diagnose(row: &Row) -> std::result::Result<FacilityRecord, String> {
    FacilityRecord::from_row(row)
        .map_err(|missing| format!("MISSING column(s) {}", missing.join(", ")))
}

/// Submit `records` one at a time and return one result row per record.
#[instrument(skip_all, fields(records = records.len(), cleanse = options.cleanse, auto_create = options.auto_create))]
pub async fn bulk_submit(
    engine: &FacilityMatchEngine,
    records: Vec<Row>,
    options: &BulkOptions,
) -> Vec<Row> {
    let mut rows = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        rows.push(process_record(engine, index, record, options).await);
    }

    let summary = BulkSummary::from_rows(&rows);
    info!(
        total = summary.total,
        new_facility = summary.new_facility,
        matched = summary.matched,
        potential_match = summary.potential_match,
        error = summary.error,
        timeout = summary.timeout,
        invalid = summary.invalid,
        "Bulk upload finished"
    );
    rows
}

async fn process_record(
    engine: &FacilityMatchEngine,
    index: usize,
    record: Row,
    options: &BulkOptions,
) -> Row {
    let mut row = options.column_mapping.apply(record);
    if options.cleanse {
        cleanse_row(&mut row);
    }

    match diagnose(&row) {
        Ok(facility) => {
            row.insert(COLUMN_DIAGNOSIS.into(), Value::String(DIAGNOSIS_VALID.into()));
            match submit_record(engine, &facility, options.auto_create).await {
                Ok(submission) => {
                    submission.result.merge_into(&mut row);
                    submission.metadata.merge_into(&mut row);
                    debug!(index, status = %submission.result.status(), "Record processed");
                }
                Err(err) => {
                    warn!(index, error = %err, error_type = err.label(), "Record failed");
                    write_failure(&mut row, &err);
                }
            }
        }
        Err(diagnosis) => {
            debug!(index, %diagnosis, "Record not submitted");
            row.insert(COLUMN_DIAGNOSIS.into(), Value::String(diagnosis.clone()));
            row.insert(COLUMN_STATUS.into(), Value::String(UploadStatus::Error.to_string()));
            row.insert(COLUMN_ERROR.into(), Value::String(diagnosis));
        }
    }

    row.insert(COLUMN_CLEANSED.into(), Value::Bool(options.cleanse));
    row
}

async fn submit_record(
    engine: &FacilityMatchEngine,
    facility: &FacilityRecord,
    auto_create: bool,
) -> Result<Submission> {
    let submission = engine.submit_detailed(facility, false).await?;
    if auto_create && submission.result.is_unmatched() {
        return engine.submit_detailed(facility, true).await;
    }
    Ok(submission)
}

fn write_failure(row: &mut Row, err: &OshError) {
    let status = if err.is_timeout() { UploadStatus::Timeout } else { UploadStatus::Error };
    row.insert(COLUMN_STATUS.into(), Value::String(status.to_string()));
    row.insert(COLUMN_ERROR.into(), Value::String(err.detail()));
}
