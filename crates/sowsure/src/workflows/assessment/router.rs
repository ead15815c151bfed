use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::ApplicantSubmission;
use super::hazards::HazardAnalysis;
use super::reports::report_download_name;
use super::service::{AssessmentRequest, AssessmentService, HazardLookup};
use crate::error::AppError;
use crate::workflows::location::Coordinates;

/// HTTP endpoints for scoring, hazard lookups and geocoding.
pub fn assessment_router(service: Arc<AssessmentService>) -> Router {
    Router::new()
        .route("/api/v1/risk/score", post(score_handler))
        .route("/api/v1/hazards/normalize", post(normalize_handler))
        .route("/api/v1/hazards/assess", post(assess_hazards_handler))
        .route("/api/v1/hazards/report", get(report_handler))
        .route("/api/v1/assessments", post(assessment_handler))
        .route("/api/v1/geocode", get(geocode_handler))
        .with_state(service)
}

pub(crate) async fn score_handler(
    State(service): State<Arc<AssessmentService>>,
    axum::Json(submission): axum::Json<ApplicantSubmission>,
) -> Result<Response, AppError> {
    let result = service.score(&submission)?;
    Ok((StatusCode::OK, axum::Json(result)).into_response())
}

pub(crate) async fn normalize_handler(
    State(service): State<Arc<AssessmentService>>,
    axum::Json(analysis): axum::Json<Option<HazardAnalysis>>,
) -> Response {
    let normalized = service.normalize(analysis.as_ref());
    (StatusCode::OK, axum::Json(normalized)).into_response()
}

pub(crate) async fn assess_hazards_handler(
    State(service): State<Arc<AssessmentService>>,
    axum::Json(lookup): axum::Json<HazardLookup>,
) -> Response {
    let assessment = service.assess_hazards(&lookup).await;
    (StatusCode::OK, axum::Json(assessment)).into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReportQuery {
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lng: Option<f64>,
    #[serde(default)]
    address: Option<String>,
}

/// Source hazard report PDF as a download attachment.
pub(crate) async fn report_handler(
    State(service): State<Arc<AssessmentService>>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, AppError> {
    let (Some(lat), Some(lng)) = (query.lat, query.lng) else {
        let payload = json!({ "error": "query parameters 'lat' and 'lng' are required" });
        return Ok((StatusCode::BAD_REQUEST, axum::Json(payload)).into_response());
    };

    let coordinates = Coordinates::new(lat, lng);
    let document = service.fetch_report(coordinates).await?;
    let filename = report_download_name(query.address.as_deref(), coordinates);
    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ),
    ];
    Ok((StatusCode::OK, headers, document).into_response())
}

pub(crate) async fn assessment_handler(
    State(service): State<Arc<AssessmentService>>,
    axum::Json(request): axum::Json<AssessmentRequest>,
) -> Result<Response, AppError> {
    let report = service.assess(request).await?;
    Ok((StatusCode::OK, axum::Json(report)).into_response())
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeocodeQuery {
    #[serde(default)]
    q: Option<String>,
}

pub(crate) async fn geocode_handler(
    State(service): State<Arc<AssessmentService>>,
    Query(query): Query<GeocodeQuery>,
) -> Result<Response, AppError> {
    let Some(q) = query.q.filter(|q| !q.trim().is_empty()) else {
        let payload = json!({ "error": "query parameter 'q' is required" });
        return Ok((StatusCode::BAD_REQUEST, axum::Json(payload)).into_response());
    };

    let candidates = service.resolve_location(&q).await?;
    Ok((StatusCode::OK, axum::Json(candidates)).into_response())
}
