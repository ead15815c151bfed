mod classification;
mod rules;

pub use classification::RiskClassification;

use super::domain::{ApplicantProfile, ApplicantSubmission};
use super::intake::{profile_from_submission, ValidationError};
use serde::{Deserialize, Serialize};

/// Rule group that contributed points to a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactor {
    IncomeSufficiency,
    DebtToIncome,
    IncomeStability,
    LoanHistory,
    LandOwnership,
    Collateral,
    Insurance,
    BankingHistory,
    CooperativeMembership,
    SeismicHazard,
    FloodTyphoonHazard,
    OtherHazard,
    AssetBuffer,
}

/// Discrete contribution to a score, kept so lenders can audit the total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub factor: RiskFactor,
    pub points: i32,
    pub notes: String,
}

/// Penalty score and classification for one applicant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskResult {
    pub score: u32,
    pub classification: RiskClassification,
    pub components: Vec<ScoreComponent>,
}

/// Score a complete profile. Pure and deterministic.
pub fn score_profile(profile: &ApplicantProfile) -> RiskResult {
    let components = rules::score_components(profile);
    let total: i32 = components.iter().map(|component| component.points).sum();
    let score = u32::try_from(total.max(0)).unwrap_or(0);

    RiskResult {
        score,
        classification: RiskClassification::from_score(score),
        components,
    }
}

/// Validate a submission and score it. Incomplete submissions never produce a score.
pub fn score_risk(submission: &ApplicantSubmission) -> Result<RiskResult, ValidationError> {
    let profile = profile_from_submission(submission)?;
    Ok(score_profile(&profile))
}
