use metrics_exporter_prometheus::PrometheusHandle;
use sowsure::config::AppConfig;
use sowsure::error::AppError;
use sowsure::integrations::{
    NominatimGeocoder, OpenAiClient, PdfTextExtractor, UlapReportSource,
};
use sowsure::workflows::assessment::{AssessmentService, HazardNormalizer};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Wire the assessment service to the configured upstream services.
///
/// Without an OpenAI key the service still scores and normalizes; hazard analysis and
/// recommendations fall back to their defaults.
pub(crate) fn build_service(config: &AppConfig) -> Result<AssessmentService, AppError> {
    let upstream = &config.upstream;
    let normalizer = HazardNormalizer::new(config.assessment.merge_policy);

    let mut service = AssessmentService::new(normalizer)
        .with_reports(Arc::new(UlapReportSource::new(
            upstream.ulap_base_url.clone(),
            upstream.upstream_timeout,
        )?))
        .with_extractor(Arc::new(PdfTextExtractor))
        .with_geocoder(Arc::new(NominatimGeocoder::new(
            upstream.nominatim_base_url.clone(),
            upstream.geocoder_timeout,
        )?));

    match upstream.openai_api_key.as_deref() {
        Some(key) => {
            let client = Arc::new(OpenAiClient::new(
                key,
                upstream.openai_model.clone(),
                upstream.openai_base_url.clone(),
                upstream.upstream_timeout,
            )?);
            info!(model = client.model(), "hazard analysis and recommendations enabled");
            service = service.with_analyzer(client.clone()).with_advisor(client);
        }
        None => warn!("OPENAI_API_KEY not set; hazard analysis and recommendations use fallbacks"),
    }

    Ok(service)
}
