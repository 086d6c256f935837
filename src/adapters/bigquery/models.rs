//! BigQuery `tabledata.insertAll` wire models

use crate::domain::{Batch, Event};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Request body for `tabledata.insertAll`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertAllRequest<'a> {
    pub kind: &'static str,
    pub skip_invalid_rows: bool,
    pub ignore_unknown_values: bool,
    pub rows: Vec<InsertRow<'a>>,
}

/// One row of an insert request
#[derive(Debug, Serialize)]
pub struct InsertRow<'a> {
    pub json: &'a Event,
}

impl<'a> InsertAllRequest<'a> {
    /// Builds a request with one row per event, in batch order
    ///
    /// Invalid rows are skipped, so valid rows of a partially rejected batch
    /// are still written.
    pub fn from_batch(batch: &'a Batch) -> Self {
        Self {
            kind: "bigquery#tableDataInsertAllRequest",
            skip_invalid_rows: true,
            ignore_unknown_values: false,
            rows: batch.iter().map(|json| InsertRow { json }).collect(),
        }
    }
}

/// Response body of `tabledata.insertAll`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertAllResponse {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub insert_errors: Vec<RowInsertErrors>,
}

/// Errors reported for one row
#[derive(Debug, Clone, Deserialize)]
pub struct RowInsertErrors {
    pub index: u64,
    #[serde(default)]
    pub errors: Vec<ErrorProto>,
}

/// A single warehouse error entry
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorProto {
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub debug_info: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Outcome of an insert the warehouse answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Every row was accepted
    Accepted,
    /// One or more rows were rejected
    Rejected(Vec<RowRejection>),
}

/// Rejection details for one row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRejection {
    /// Position of the row in the request, 0-based
    pub index: u64,
    pub reasons: Vec<String>,
    pub messages: Vec<String>,
}

impl fmt::Display for RowRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "index: {} error: {}", self.index, self.messages.join(" "))?;
        if !self.reasons.is_empty() {
            write!(f, " reason: {}", self.reasons.join(", "))?;
        }
        Ok(())
    }
}

impl From<InsertAllResponse> for InsertOutcome {
    fn from(response: InsertAllResponse) -> Self {
        if response.insert_errors.is_empty() {
            return InsertOutcome::Accepted;
        }

        let rejections = response
            .insert_errors
            .into_iter()
            .map(|row| RowRejection {
                index: row.index,
                reasons: row.errors.iter().filter_map(|e| e.reason.clone()).collect(),
                messages: row.errors.into_iter().filter_map(|e| e.message).collect(),
            })
            .collect();
        InsertOutcome::Rejected(rejections)
    }
}
