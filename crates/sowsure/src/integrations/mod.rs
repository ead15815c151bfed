//! Seams to the external services an assessment depends on, plus their HTTP clients.

pub mod nominatim;
pub mod openai;
pub mod pdf;
pub mod ulap;

use async_trait::async_trait;

use crate::workflows::assessment::{AdvisoryContext, HazardAnalysis};
use crate::workflows::location::{Coordinates, GeocodeCandidate};

pub use nominatim::NominatimGeocoder;
pub use openai::OpenAiClient;
pub use pdf::PdfTextExtractor;
pub use ulap::UlapReportSource;

/// Failure talking to an external collaborator.
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{service} responded with status {status}")]
    Status { service: &'static str, status: u16 },
    #[error("unexpected response: {0}")]
    Malformed(String),
    #[error("hazard report is empty or unreadable")]
    UnreadableReport,
}

/// Source of hazard assessment documents for a point.
#[async_trait]
pub trait HazardReportSource: Send + Sync {
    async fn fetch_report(&self, coordinates: Coordinates) -> Result<Vec<u8>, CollaboratorError>;
}

/// Converts report bytes into plain text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(&self, document: &[u8]) -> Result<String, CollaboratorError>;
}

/// What the analyzer needs to describe hazards at a location.
#[derive(Debug, Clone, PartialEq)]
pub struct HazardAnalysisRequest {
    pub coordinates: Coordinates,
    pub address: Option<String>,
    pub report_text: String,
}

#[async_trait]
pub trait HazardAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        request: &HazardAnalysisRequest,
    ) -> Result<HazardAnalysis, CollaboratorError>;
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<GeocodeCandidate>, CollaboratorError>;
}

/// Produces raw recommendation text; parsing and fallback happen in the caller.
#[async_trait]
pub trait RecommendationAdvisor: Send + Sync {
    async fn advise(&self, context: &AdvisoryContext) -> Result<String, CollaboratorError>;
}

/// First `max_chars` characters of `text`, never splitting a UTF-8 sequence.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::truncate_chars;

    #[test]
    fn truncation_respects_character_boundaries() {
        assert_eq!(truncate_chars("Pasig", 10), "Pasig");
        assert_eq!(truncate_chars("Parañaque", 5), "Parañ");
        assert_eq!(truncate_chars("", 3), "");
    }
}
