use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tracing::{debug, warn};

use super::{truncate_chars, CollaboratorError, HazardReportSource};
use crate::workflows::location::Coordinates;

pub const DEFAULT_ULAP_URL: &str =
    "https://ulap-reports.georisk.gov.ph/api/reports/hazard-assessments";
const USER_AGENT: &str = "sowsure/0.1 (hazard assessment)";

/// GeoRisk ULAP hazard assessment reports, addressed as `{base}/{lng}/{lat}`.
#[derive(Debug, Clone)]
pub struct UlapReportSource {
    client: reqwest::Client,
    base_url: String,
}

impl UlapReportSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, CollaboratorError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn report_url(&self, coordinates: Coordinates) -> String {
        format!("{}/{}/{}", self.base_url, coordinates.lng, coordinates.lat)
    }
}

#[async_trait]
impl HazardReportSource for UlapReportSource {
    async fn fetch_report(&self, coordinates: Coordinates) -> Result<Vec<u8>, CollaboratorError> {
        let url = self.report_url(coordinates);
        debug!(%url, "fetching hazard report");

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/pdf, */*")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(%url, status = status.as_u16(), "hazard report request rejected");
            return Err(CollaboratorError::Status {
                service: "hazard report service",
                status: status.as_u16(),
            });
        }

        let is_pdf = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("application/pdf"));
        if !is_pdf {
            let body = response.text().await.unwrap_or_default();
            return Err(CollaboratorError::Malformed(format!(
                "no PDF report available for this location: {}",
                truncate_chars(&body, 200)
            )));
        }

        let bytes = response.bytes().await?;
        debug!(%url, bytes = bytes.len(), "downloaded hazard report");
        Ok(bytes.to_vec())
    }
}
