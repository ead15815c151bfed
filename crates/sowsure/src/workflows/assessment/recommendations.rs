//! Best-effort loan improvement guidance layered over a computed risk score.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::domain::ApplicantProfile;
use super::scoring::RiskResult;
use crate::integrations::RecommendationAdvisor;

/// Structured guidance returned by the advisor or the fixed fallback set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanRecommendations {
    pub priority_recommendations: Vec<String>,
    pub financial_improvements: Vec<String>,
    pub risk_mitigation: Vec<String>,
    pub next_steps: Vec<String>,
    pub potential_score_improvement: ScoreImprovement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreImprovement {
    pub description: String,
    pub target_score: TargetScore,
}

/// Advisors return the target either as prose ("10-20 points lower") or a bare number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetScore {
    Points(f64),
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationSource {
    Advisor,
    Fallback,
}

/// Recommendations tagged with their provenance so clients can tell them apart from the score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationOutcome {
    pub source: RecommendationSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub recommendations: LoanRecommendations,
}

impl RecommendationOutcome {
    fn fallback(reason: impl Into<String>) -> Self {
        Self {
            source: RecommendationSource::Fallback,
            reason: Some(reason.into()),
            recommendations: fallback_recommendations(),
        }
    }
}

/// Inputs handed to the advisor: the scored profile and where the farm is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvisoryContext {
    pub profile: ApplicantProfile,
    pub result: RiskResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Generic guidance used whenever the advisor is unavailable or its reply is unusable.
pub fn fallback_recommendations() -> LoanRecommendations {
    LoanRecommendations {
        priority_recommendations: strings(&[
            "Improve your net disposable income ratio by reducing monthly expenses",
            "Consider joining a farming cooperative for better support and lower risk classification",
            "Explore crop insurance options to protect against disasters",
        ]),
        financial_improvements: strings(&[
            "Diversify income sources beyond farming",
            "Build emergency savings equivalent to 3-6 months of expenses",
        ]),
        risk_mitigation: strings(&[
            "Maintain good banking relationships with regular savings deposits",
            "Keep detailed records of all farming activities and finances",
        ]),
        next_steps: strings(&[
            "Contact local agricultural extension office for guidance",
            "Research available government support programs for farmers",
        ]),
        potential_score_improvement: ScoreImprovement {
            description: "Following these recommendations could improve your risk profile"
                .to_string(),
            target_score: TargetScore::Text(
                "Could potentially reduce penalty score by 10-20 points".to_string(),
            ),
        },
    }
}

/// Slice from the first `{` to the last `}`, dropping markdown fences or prose around it.
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (start < end).then(|| &raw[start..=end])
}

/// Parse advisor output into recommendations. Missing sections are a parse failure.
pub fn parse_recommendations(raw: &str) -> Result<LoanRecommendations, serde_json::Error> {
    let candidate = extract_json_object(raw).unwrap_or(raw);
    serde_json::from_str(candidate)
}

/// Ask the advisor for guidance, substituting the fallback set on any failure.
///
/// Never fails: recommendations only augment the score.
pub async fn recommend(
    advisor: Option<&dyn RecommendationAdvisor>,
    context: &AdvisoryContext,
) -> RecommendationOutcome {
    let Some(advisor) = advisor else {
        debug!("recommendation advisor not configured; using fallback set");
        return RecommendationOutcome::fallback("advisor not configured");
    };

    let raw = match advisor.advise(context).await {
        Ok(raw) => raw,
        Err(error) => {
            warn!(error = %error, "recommendation advisor failed");
            return RecommendationOutcome::fallback(format!("advisor unavailable: {error}"));
        }
    };

    match parse_recommendations(&raw) {
        Ok(recommendations) => RecommendationOutcome {
            source: RecommendationSource::Advisor,
            reason: None,
            recommendations,
        },
        Err(error) => {
            warn!(error = %error, "recommendation advisor reply was malformed");
            RecommendationOutcome::fallback(format!("advisor reply could not be parsed: {error}"))
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}
