//! Score a CSV of applicants, one per row, without letting a bad row stop the batch.

mod parser;

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::workflows::assessment::{
    profile_from_submission, score_profile, RiskClassification, RiskResult,
};


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRowResult {
    pub row: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub status: BatchStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<RiskResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// Percentage of rows scored, rounded to two decimals.
    pub success_rate: f64,
    pub results: Vec<BatchRowResult>,
}

impl BatchSummary {
    fn from_results(results: Vec<BatchRowResult>) -> Self {
        let total = results.len();
        let successful = results
            .iter()
            .filter(|row| row.status == BatchStatus::Success)
            .count();
        let success_rate = if total == 0 {
            0.0
        } else {
            ((successful as f64 / total as f64) * 10_000.0).round() / 100.0
        };

        Self {
            total,
            successful,
            failed: total - successful,
            success_rate,
            results,
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &BatchRowResult> {
        self.results
            .iter()
            .filter(|row| row.status == BatchStatus::Failed)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("failed to read batch file: {0}")]
    Io(#[from] io::Error),
    #[error("malformed batch csv: {0}")]
    Csv(#[from] csv::Error),
}

pub fn score_batch<R: Read>(reader: R) -> Result<BatchSummary, BatchError> {
    let records = parser::parse_records(reader)?;
    let mut results = Vec::with_capacity(records.len());

    for record in records {
        let outcome: Result<RiskResult, (String, Vec<String>)> = match record.submission {
            Err(error) => Err((error, Vec::new())),
            Ok(submission) => profile_from_submission(&submission)
                .map(|profile| score_profile(&profile))
                .map_err(|error| {
                    let missing = error
                        .missing_fields()
                        .iter()
                        .map(|field| field.to_string())
                        .collect();
                    (error.to_string(), missing)
                }),
        };

        let result = match outcome {
            Ok(result) => BatchRowResult {
                row: record.row,
                label: record.label,
                status: BatchStatus::Success,
                result: Some(result),
                error: None,
                missing_fields: Vec::new(),
            },
            Err((error, missing_fields)) => {
                warn!(row = record.row, %error, "batch row not scored");
                BatchRowResult {
                    row: record.row,
                    label: record.label,
                    status: BatchStatus::Failed,
                    result: None,
                    error: Some(error),
                    missing_fields,
                }
            }
        };
        results.push(result);
    }

    let summary = BatchSummary::from_results(results);
    info!(
        total = summary.total,
        successful = summary.successful,
        failed = summary.failed,
        "batch scored"
    );
    Ok(summary)
}

pub fn score_batch_file(path: impl AsRef<Path>) -> Result<BatchSummary, BatchError> {
    let file = File::open(path.as_ref())?;
    score_batch(file)
}

/// Flat CSV export: one line per input row.
pub fn write_results_csv<W: Write>(summary: &BatchSummary, writer: W) -> Result<(), BatchError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in &summary.results {
        csv_writer.serialize(ExportRow {
            row: row.row,
            label: row.label.as_deref().unwrap_or(""),
            status: row.status,
            score: row.result.as_ref().map(|result| result.score),
            classification: row.result.as_ref().map(|result| result.classification),
            error: row.error.as_deref().unwrap_or(""),
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_results_file(summary: &BatchSummary, path: impl AsRef<Path>) -> Result<(), BatchError> {
    let file = File::create(path.as_ref())?;
    write_results_csv(summary, file)
}

#[derive(Serialize)]
struct ExportRow<'a> {
    row: usize,
    label: &'a str,
    status: BatchStatus,
    score: Option<u32>,
    classification: Option<RiskClassification>,
    error: &'a str,
}
