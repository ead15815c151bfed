use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::domain::{ApplicantSubmission, HazardProfile};
use super::hazards::{HazardAnalysis, HazardBasis, HazardNormalizer, NormalizedHazards};
use super::intake::{profile_from_submission, ValidationError};
use super::recommendations::{recommend, AdvisoryContext, RecommendationOutcome};
use super::reports::{now_ms, save_report, ReportError};
use super::scoring::{score_profile, score_risk, RiskResult};
use crate::integrations::{
    CollaboratorError, Geocoder, HazardAnalysisRequest, HazardAnalyzer, HazardReportSource, RecommendationAdvisor,
    TextExtractor,
};
use crate::workflows::location::{Coordinates, GeocodeCandidate, LocationError, LocationResolver};

/// Reports with less extractable text than this are treated as unreadable.
pub const MIN_REPORT_TEXT_CHARS: usize = 100;

/// Where to look up hazards for an applicant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardLookup {
    pub coordinates: Coordinates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Hazard levels for a location, with the analysis behind them when one was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardAssessment {
    pub levels: HazardProfile,
    pub basis: HazardBasis,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<HazardAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRequest {
    pub applicant: ApplicantSubmission,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<HazardLookup>,
}

/// Guaranteed score plus best-effort hazard context and recommendations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentReport {
    pub result: RiskResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hazards: Option<HazardAssessment>,
    pub recommendations: RecommendationOutcome,
}

/// Composes the normalizer, scorer and external collaborators into one assessment.
///
/// Every collaborator is optional except text extraction; a missing one degrades to the
/// documented fallback rather than failing the request.
#[derive(Clone)]
pub struct AssessmentService {
    normalizer: HazardNormalizer,
    reports: Option<Arc<dyn HazardReportSource>>,
    extractor: Option<Arc<dyn TextExtractor>>,
    analyzer: Option<Arc<dyn HazardAnalyzer>>,
    advisor: Option<Arc<dyn RecommendationAdvisor>>,
    locations: LocationResolver,
}

impl AssessmentService {
    /// Service with no external collaborators: scores, normalizes and falls back.
    pub fn new(normalizer: HazardNormalizer) -> Self {
        Self {
            normalizer,
            reports: None,
            extractor: None,
            analyzer: None,
            advisor: None,
            locations: LocationResolver::offline(),
        }
    }

    pub fn with_reports(mut self, reports: Arc<dyn HazardReportSource>) -> Self {
        self.reports = Some(reports);
        self
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn with_analyzer(mut self, analyzer: Arc<dyn HazardAnalyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    pub fn with_advisor(mut self, advisor: Arc<dyn RecommendationAdvisor>) -> Self {
        self.advisor = Some(advisor);
        self
    }

    pub fn with_geocoder(mut self, geocoder: Arc<dyn Geocoder>) -> Self {
        self.locations = LocationResolver::new(geocoder);
        self
    }

    pub fn normalizer(&self) -> HazardNormalizer {
        self.normalizer
    }

    pub fn score(&self, submission: &ApplicantSubmission) -> Result<RiskResult, ValidationError> {
        score_risk(submission)
    }

    pub fn normalize(&self, analysis: Option<&HazardAnalysis>) -> NormalizedHazards {
        self.normalizer.normalize(analysis)
    }

    pub async fn resolve_location(
        &self,
        query: &str,
    ) -> Result<Vec<GeocodeCandidate>, LocationError> {
        self.locations.resolve(query).await
    }

    /// Source hazard report PDF for a point.
    pub async fn fetch_report(&self, coordinates: Coordinates) -> Result<Vec<u8>, ReportError> {
        coordinates.validate()?;
        let reports = self
            .reports
            .as_ref()
            .ok_or(CollaboratorError::NotConfigured("hazard report service"))?;
        Ok(reports.fetch_report(coordinates).await?)
    }

    /// Fetch the report for a point and save it under `dir`.
    pub async fn download_report(
        &self,
        coordinates: Coordinates,
        dir: &Path,
    ) -> Result<PathBuf, ReportError> {
        let document = self.fetch_report(coordinates).await?;
        save_report(dir, coordinates, &document, now_ms())
    }

    /// Fetch, extract, analyze and normalize hazards for a point. Never fails.
    pub async fn assess_hazards(&self, lookup: &HazardLookup) -> HazardAssessment {
        match self.analyze_location(lookup).await {
            Ok(analysis) => {
                let NormalizedHazards { levels, basis } = self.normalizer.normalize(Some(&analysis));
                info!(
                    lat = lookup.coordinates.lat,
                    lng = lookup.coordinates.lng,
                    ?basis,
                    "hazard assessment completed"
                );
                HazardAssessment {
                    levels,
                    basis,
                    analysis: Some(analysis),
                    warning: None,
                }
            }
            Err(warning) => {
                warn!(
                    lat = lookup.coordinates.lat,
                    lng = lookup.coordinates.lng,
                    %warning,
                    "hazard assessment fell back to defaults"
                );
                let NormalizedHazards { levels, basis } = self.normalizer.normalize(None);
                HazardAssessment {
                    levels,
                    basis,
                    analysis: None,
                    warning: Some(warning),
                }
            }
        }
    }

    async fn analyze_location(&self, lookup: &HazardLookup) -> Result<HazardAnalysis, String> {
        lookup
            .coordinates
            .validate()
            .map_err(|error| error.to_string())?;

        let reports = self
            .reports
            .as_ref()
            .ok_or("hazard report service is not configured")?;
        let extractor = self
            .extractor
            .as_ref()
            .ok_or("hazard report text extraction is not configured")?;
        let analyzer = self
            .analyzer
            .as_ref()
            .ok_or("hazard analysis service is not configured")?;

        let document = reports
            .fetch_report(lookup.coordinates)
            .await
            .map_err(|error| format!("hazard report unavailable: {error}"))?;
        let text = extractor
            .extract_text(&document)
            .await
            .map_err(|error| format!("hazard report could not be read: {error}"))?;

        if text.trim().chars().count() < MIN_REPORT_TEXT_CHARS {
            return Err(CollaboratorError::UnreadableReport.to_string());
        }

        let request = HazardAnalysisRequest {
            coordinates: lookup.coordinates,
            address: lookup.address.clone(),
            report_text: text,
        };
        analyzer
            .analyze(&request)
            .await
            .map_err(|error| format!("hazard analysis failed: {error}"))
    }

    /// Score an applicant, filling unset hazard levels from the location when one is given.
    ///
    /// Levels supplied in the submission always win over looked-up ones.
    pub async fn assess(
        &self,
        request: AssessmentRequest,
    ) -> Result<AssessmentReport, ValidationError> {
        let AssessmentRequest {
            mut applicant,
            location,
        } = request;

        let hazards = match &location {
            Some(lookup) if !applicant.hazards.is_complete() => {
                ensure_financials_complete(&applicant)?;
                let assessment = self.assess_hazards(lookup).await;
                applicant.hazards.fill_from(assessment.levels);
                Some(assessment)
            }
            _ => None,
        };

        let profile = profile_from_submission(&applicant)?;
        let result = score_profile(&profile);
        info!(
            score = result.score,
            classification = %result.classification,
            "applicant scored"
        );

        let context = AdvisoryContext {
            profile,
            result: result.clone(),
            address: location.and_then(|lookup| lookup.address),
        };
        let recommendations = recommend(self.advisor.as_deref(), &context).await;

        Ok(AssessmentReport {
            result,
            hazards,
            recommendations,
        })
    }
}

/// Reject incomplete financials before spending a network round trip on hazards.
fn ensure_financials_complete(applicant: &ApplicantSubmission) -> Result<(), ValidationError> {
    let mut probe = applicant.clone();
    probe.hazards.fill_from(HazardProfile::conservative());
    profile_from_submission(&probe).map(|_| ())
}
