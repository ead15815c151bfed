//! Chat completion client used for hazard report analysis and loan recommendations.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{
    truncate_chars, CollaboratorError, HazardAnalysisRequest, HazardAnalyzer,
    RecommendationAdvisor,
};
use crate::workflows::assessment::{extract_json_object, AdvisoryContext, HazardAnalysis};

pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
/// Value shipped in `.env.example`; treated the same as an absent key.
pub const PLACEHOLDER_API_KEY: &str = "your_openai_api_key_here";
/// Report text beyond this many characters is not sent to the model.
pub const REPORT_TEXT_LIMIT: usize = 8000;

const MAX_TOKENS: u32 = 1500;

const ANALYSIS_SYSTEM_PROMPT: &str = "You are a disaster risk analyst for Philippine locations. \
Reply only with the JSON object requested.";

const ADVISOR_SYSTEM_PROMPT: &str = "You advise Filipino farmers on agricultural loan applications. \
Reply only with the JSON object requested.";

/// Whether `key` looks like a real credential.
pub fn is_usable_api_key(key: &str) -> bool {
    let key = key.trim();
    !key.is_empty() && key != PLACEHOLDER_API_KEY
}

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CollaboratorError> {
        let api_key = api_key.into();
        if !is_usable_api_key(&api_key) {
            return Err(CollaboratorError::NotConfigured("OPENAI_API_KEY"));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
    ) -> Result<String, CollaboratorError> {
        let body = json!({
            "model": &self.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_prompt}
            ],
            "temperature": temperature,
            "max_tokens": MAX_TOKENS,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CollaboratorError::Status {
                service: "language model",
                status: status.as_u16(),
            });
        }

        let completion: CompletionResponse = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| CollaboratorError::Malformed("completion contained no content".into()))
    }
}

#[async_trait]
impl HazardAnalyzer for OpenAiClient {
    async fn analyze(
        &self,
        request: &HazardAnalysisRequest,
    ) -> Result<HazardAnalysis, CollaboratorError> {
        let prompt = analysis_prompt(request);
        let raw = self.complete(ANALYSIS_SYSTEM_PROMPT, &prompt, 0.3).await?;
        debug!(model = %self.model, chars = raw.len(), "hazard analysis completed");

        let candidate = extract_json_object(&raw).unwrap_or(&raw);
        serde_json::from_str(candidate)
            .map_err(|error| CollaboratorError::Malformed(format!("hazard analysis: {error}")))
    }
}

#[async_trait]
impl RecommendationAdvisor for OpenAiClient {
    async fn advise(&self, context: &AdvisoryContext) -> Result<String, CollaboratorError> {
        let prompt = advisory_prompt(context);
        self.complete(ADVISOR_SYSTEM_PROMPT, &prompt, 0.7).await
    }
}

pub(crate) fn analysis_prompt(request: &HazardAnalysisRequest) -> String {
    let location = request.address.as_deref().unwrap_or("Unknown location");
    format!(
        "Analyze this Philippine hazard assessment report.\n\
         Location: {location}\n\
         Coordinates: {lat}, {lng}\n\n\
         REPORT:\n{report}\n\n\
         Return JSON with this shape:\n\
         {{\"riskLevel\": \"LOW|MODERATE|HIGH|VERY HIGH\", \
         \"overallSummary\": \"two or three sentences\", \
         \"hazardTypes\": [{{\"type\": \"hazard name\", \"risk\": \"LOW|MODERATE|HIGH|VERY HIGH\", \"description\": \"short description\"}}], \
         \"recommendations\": [\"action\"], \
         \"keyFindings\": [\"finding\"]}}",
        lat = request.coordinates.lat,
        lng = request.coordinates.lng,
        report = truncate_chars(&request.report_text, REPORT_TEXT_LIMIT),
    )
}

pub(crate) fn advisory_prompt(context: &AdvisoryContext) -> String {
    let profile = &context.profile;
    let result = &context.result;

    let mut lines = vec![
        "Suggest how this farmer can improve their loan risk profile.".to_string(),
        format!("Risk score: {} penalty points", result.score),
        format!(
            "Classification: {} ({})",
            result.classification,
            result.classification.lending_guidance()
        ),
    ];
    if let Some(address) = &context.address {
        lines.push(format!("Farm location: {address}"));
    }
    lines.extend([
        format!("Income: {:.0}", profile.income),
        format!("Expenses: {:.0}", profile.expenses),
        format!("Loan payments: {:.0}", profile.loan_payments),
        format!("Income sources: {}", profile.income_sources.label()),
        format!("Loan history: {}", profile.loan_history.label()),
        format!("Land ownership: {}", profile.land_ownership.label()),
        format!("Equipment and savings: {:.0}", profile.equipment_savings),
        format!("Crops in storage: {:.0}", profile.crops_storage),
        format!("Collateral ratio: {}", profile.collateral_ratio),
        format!("Insurance: {}", profile.insurance.label()),
        format!("Banking history: {}", profile.banking_history.label()),
        format!(
            "Cooperative member: {}",
            if profile.coop_member { "yes" } else { "no" }
        ),
        format!(
            "Hazards: seismic={}, flood_typhoon={}, other={}",
            profile.hazards.seismic, profile.hazards.flood_typhoon, profile.hazards.other
        ),
        "Largest penalties:".to_string(),
    ]);

    let mut penalties: Vec<_> = result
        .components
        .iter()
        .filter(|component| component.points > 0)
        .collect();
    penalties.sort_by(|a, b| b.points.cmp(&a.points));
    lines.extend(
        penalties
            .into_iter()
            .take(5)
            .map(|component| format!("- {} (+{})", component.notes, component.points)),
    );

    lines.push(String::new());
    lines.push(
        "Return JSON with keys priorityRecommendations, financialImprovements, riskMitigation \
         and nextSteps (arrays of strings) plus potentialScoreImprovement \
         {\"description\": string, \"targetScore\": string}."
            .to_string(),
    );
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::location::Coordinates;

    #[test]
    fn placeholder_and_blank_keys_are_unusable() {
        assert!(!is_usable_api_key(""));
        assert!(!is_usable_api_key("  "));
        assert!(!is_usable_api_key(PLACEHOLDER_API_KEY));
        assert!(is_usable_api_key("sk-test"));
        assert!(matches!(
            OpenAiClient::new(PLACEHOLDER_API_KEY, DEFAULT_OPENAI_MODEL, DEFAULT_OPENAI_URL, Duration::from_secs(1)),
            Err(CollaboratorError::NotConfigured(_))
        ));
    }

    #[test]
    fn analysis_prompt_truncates_report_text() {
        let request = HazardAnalysisRequest {
            coordinates: Coordinates::new(15.4858, 120.9658),
            address: None,
            report_text: "x".repeat(REPORT_TEXT_LIMIT + 500),
        };

        let prompt = analysis_prompt(&request);
        assert!(prompt.contains("Unknown location"));
        assert!(prompt.contains(&"x".repeat(REPORT_TEXT_LIMIT)));
        assert!(!prompt.contains(&"x".repeat(REPORT_TEXT_LIMIT + 1)));
    }
}
