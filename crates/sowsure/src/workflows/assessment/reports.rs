//! Hazard report downloads: fetching the source PDF for a point and naming it for saving
//! or serving as an attachment.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::info;

use crate::integrations::CollaboratorError;
use crate::workflows::location::{CoordinateError, Coordinates};

pub const DEFAULT_REPORT_DIR: &str = "hazard-reports";
const UNKNOWN_LOCATION: &str = "Unknown Location";
const MAX_ADDRESS_CHARS: usize = 50;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error(transparent)]
    Coordinates(#[from] CoordinateError),
    #[error("hazard report unavailable: {0}")]
    Upstream(#[from] CollaboratorError),
    #[error("could not save hazard report: {0}")]
    Io(#[from] std::io::Error),
}

/// Attachment name for a served report, e.g. `Hazard_Report_Quezon_City_14.676_121.0437.pdf`.
///
/// The address keeps only ASCII letters, digits and whitespace, with whitespace runs
/// collapsed to `_` and the result capped at 50 characters.
pub fn report_download_name(address: Option<&str>, coordinates: Coordinates) -> String {
    let address = address
        .map(str::trim)
        .filter(|address| !address.is_empty())
        .unwrap_or(UNKNOWN_LOCATION);

    let kept: String = address
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();
    let cleaned: String = kept
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .take(MAX_ADDRESS_CHARS)
        .collect();

    format!(
        "Hazard_Report_{cleaned}_{}_{}.pdf",
        coordinates.lat, coordinates.lng
    )
}

/// File name for a saved report: `hazard-report-{lng}-{lat}-{timestamp_ms}.pdf`.
pub fn report_file_name(coordinates: Coordinates, timestamp_ms: i64) -> String {
    format!(
        "hazard-report-{}-{}-{timestamp_ms}.pdf",
        coordinates.lng, coordinates.lat
    )
}

/// Write report bytes under `dir`, creating the directory when needed.
pub fn save_report(
    dir: &Path,
    coordinates: Coordinates,
    document: &[u8],
    timestamp_ms: i64,
) -> Result<PathBuf, ReportError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(report_file_name(coordinates, timestamp_ms));
    fs::write(&path, document)?;
    info!(path = %path.display(), bytes = document.len(), "saved hazard report");
    Ok(path)
}

pub(crate) fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
