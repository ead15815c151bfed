use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::integrations::{
    CollaboratorError, HazardAnalysisRequest, HazardAnalyzer, HazardReportSource,
    RecommendationAdvisor, TextExtractor,
};
use crate::workflows::assessment::{
    AdvisoryContext, ApplicantProfile, ApplicantSubmission, AssessmentService, BankingHistory,
    HazardAnalysis, HazardFinding, HazardLevel, HazardNormalizer, HazardProfile, IncomeSource,
    InsuranceCoverage, LandOwnership, LoanHistory,
};
use crate::workflows::location::Coordinates;

/// Diversified, insured cooperative member on low-hazard land.
pub(super) fn low_risk_profile() -> ApplicantProfile {
    ApplicantProfile {
        income: 300_000.0,
        expenses: 150_000.0,
        loan_payments: 50_000.0,
        income_sources: IncomeSource::Multiple,
        loan_history: LoanHistory::OnTime,
        land_ownership: LandOwnership::OwnedMedium,
        equipment_savings: 75_000.0,
        crops_storage: 30_000.0,
        collateral_ratio: 1.2,
        insurance: InsuranceCoverage::CropAndLife,
        banking_history: BankingHistory::SavingsAndGoodLoans,
        coop_member: true,
        hazards: HazardProfile::uniform(HazardLevel::Low),
    }
}

/// Same finances as [`low_risk_profile`] with every categorical field at its worst.
pub(super) fn very_high_risk_profile() -> ApplicantProfile {
    ApplicantProfile {
        loan_history: LoanHistory::Late5Plus,
        land_ownership: LandOwnership::Landless,
        insurance: InsuranceCoverage::Uninsured,
        banking_history: BankingHistory::Unbanked,
        coop_member: false,
        hazards: HazardProfile::uniform(HazardLevel::High),
        ..low_risk_profile()
    }
}

pub(super) fn low_risk_submission() -> ApplicantSubmission {
    ApplicantSubmission::from(&low_risk_profile())
}

pub(super) fn plain_service() -> AssessmentService {
    AssessmentService::new(HazardNormalizer::default())
}

pub(super) fn manila() -> Coordinates {
    Coordinates::new(14.5995, 120.9842)
}

pub(super) fn flooding_analysis() -> HazardAnalysis {
    HazardAnalysis {
        risk_level: Some("HIGH".to_string()),
        overall_summary: Some("Low-lying area exposed to seasonal flooding".to_string()),
        hazard_types: vec![
            HazardFinding {
                kind: "Flooding".to_string(),
                risk: Some("HIGH".to_string()),
                description: None,
            },
            HazardFinding {
                kind: "Earthquake Fault".to_string(),
                risk: Some("LOW".to_string()),
                description: None,
            },
        ],
        ..HazardAnalysis::default()
    }
}

pub(super) fn report_text() -> String {
    "Hazard assessment report. Flood susceptibility: HIGH. Ground rupture: none. "
        .repeat(3)
}

/// Hands out the same document every time and counts how often it was asked.
#[derive(Default)]
pub(super) struct FixedReports {
    pub(super) calls: AtomicUsize,
}

impl FixedReports {
    pub(super) fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HazardReportSource for FixedReports {
    async fn fetch_report(&self, _coordinates: Coordinates) -> Result<Vec<u8>, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(b"%PDF-1.4 stub".to_vec())
    }
}

pub(super) struct MissingReports;

#[async_trait]
impl HazardReportSource for MissingReports {
    async fn fetch_report(&self, _coordinates: Coordinates) -> Result<Vec<u8>, CollaboratorError> {
        Err(CollaboratorError::Status {
            service: "hazard reports",
            status: 404,
        })
    }
}

pub(super) struct FixedText(pub(super) String);

#[async_trait]
impl TextExtractor for FixedText {
    async fn extract_text(&self, _document: &[u8]) -> Result<String, CollaboratorError> {
        Ok(self.0.clone())
    }
}

pub(super) struct FixedAnalyzer(pub(super) HazardAnalysis);

#[async_trait]
impl HazardAnalyzer for FixedAnalyzer {
    async fn analyze(
        &self,
        _request: &HazardAnalysisRequest,
    ) -> Result<HazardAnalysis, CollaboratorError> {
        Ok(self.0.clone())
    }
}

pub(super) struct GarbledAnalyzer;

#[async_trait]
impl HazardAnalyzer for GarbledAnalyzer {
    async fn analyze(
        &self,
        _request: &HazardAnalysisRequest,
    ) -> Result<HazardAnalysis, CollaboratorError> {
        Err(CollaboratorError::Malformed("analysis was not JSON".to_string()))
    }
}

/// Replies with canned text, or fails when constructed with `None`.
pub(super) struct CannedAdvisor(pub(super) Option<String>);

#[async_trait]
impl RecommendationAdvisor for CannedAdvisor {
    async fn advise(&self, _context: &AdvisoryContext) -> Result<String, CollaboratorError> {
        self.0
            .clone()
            .ok_or(CollaboratorError::Status {
                service: "advisor",
                status: 503,
            })
    }
}

/// Service wired with stub report, extraction and analysis collaborators.
pub(super) fn connected_service(
    reports: Arc<dyn HazardReportSource>,
    text: String,
    analyzer: Arc<dyn HazardAnalyzer>,
) -> AssessmentService {
    plain_service()
        .with_reports(reports)
        .with_extractor(Arc::new(FixedText(text)))
        .with_analyzer(analyzer)
}

pub(super) fn advisor_reply() -> String {
    r#"Here is my advice:
```json
{
  "priorityRecommendations": ["Enroll in PCIC crop insurance"],
  "financialImprovements": ["Open a savings account with a rural bank"],
  "riskMitigation": ["Plant flood-tolerant rice varieties"],
  "nextSteps": ["Visit the municipal agriculture office"],
  "potentialScoreImprovement": {"description": "Insurance alone lowers the penalty", "targetScore": 12}
}
```"#
        .to_string()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
