//! Farmer loan risk assessment: intake validation, hazard normalization, scoring and
//! recommendations, composed by [`AssessmentService`].

pub mod domain;
pub mod hazards;
pub mod intake;
pub mod recommendations;
pub mod reports;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    ApplicantProfile, ApplicantSubmission, BankingHistory, HazardCategory, HazardLevel,
    HazardProfile, HazardSelection, IncomeSource, InsuranceCoverage, LandOwnership, LoanHistory,
    UnknownVariant,
};
pub use hazards::{
    categorize, map_risk_level, normalize_hazards, HazardAnalysis, HazardBasis, HazardFinding,
    HazardMergePolicy, HazardNormalizer, NormalizedHazards,
};
pub use intake::{profile_from_submission, ValidationError};
pub use recommendations::{
    extract_json_object, fallback_recommendations, parse_recommendations, recommend,
    AdvisoryContext, LoanRecommendations, RecommendationOutcome, RecommendationSource,
    ScoreImprovement, TargetScore,
};
pub use reports::{
    report_download_name, report_file_name, save_report, ReportError, DEFAULT_REPORT_DIR,
};
pub use router::assessment_router;
pub use scoring::{score_profile, score_risk, RiskClassification, RiskFactor, RiskResult, ScoreComponent};
pub use service::{
    AssessmentReport, AssessmentRequest, AssessmentService, HazardAssessment, HazardLookup,
};
