use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::workflows::assessment::assessment_router;

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).expect("request")
}

#[tokio::test]
async fn score_endpoint_returns_result() {
    let app = assessment_router(Arc::new(plain_service()));
    let body = serde_json::to_value(low_risk_submission()).expect("serialize");

    let response = app
        .oneshot(post_json("/api/v1/risk/score", body))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["score"], 1);
    assert_eq!(payload["classification"], "Low Risk");
    assert_eq!(payload["components"].as_array().map(Vec::len), Some(13));
}

#[tokio::test]
async fn score_endpoint_lists_missing_fields() {
    let app = assessment_router(Arc::new(plain_service()));
    let body = json!({
        "income": "",
        "expenses": 150000,
        "loan_payments": 50000,
        "income_sources": "multiple",
        "loan_history": "on_time",
        "land_ownership": "owned_medium",
        "equipment_savings": 75000,
        "crops_storage": 30000,
        "collateral_ratio": 1.2,
        "insurance": "crop_life",
        "banking_history": "savings_and_good_loans",
        "coop_member": true,
        "hazards": { "seismic": "low", "flood_typhoon": "low" }
    });

    let response = app
        .oneshot(post_json("/api/v1/risk/score", body))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert_eq!(payload["missing_fields"], json!(["income", "hazards.other"]));
}

#[tokio::test]
async fn normalize_endpoint_accepts_null() {
    let app = assessment_router(Arc::new(plain_service()));

    let response = app
        .oneshot(post_json("/api/v1/hazards/normalize", Value::Null))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["basis"], "default");
    assert_eq!(payload["levels"]["seismic"], "moderate");
}

#[tokio::test]
async fn normalize_endpoint_categorizes_findings() {
    let app = assessment_router(Arc::new(plain_service()));
    let body = json!({
        "riskLevel": "HIGH",
        "hazardTypes": [
            { "type": "Flooding", "risk": "HIGH" },
            { "type": "Earthquake Fault", "risk": "LOW" }
        ]
    });

    let response = app
        .oneshot(post_json("/api/v1/hazards/normalize", body))
        .await
        .expect("response");

    let payload = read_json_body(response).await;
    assert_eq!(
        payload["levels"],
        json!({ "seismic": "low", "flood_typhoon": "high", "other": "moderate" })
    );
}

#[tokio::test]
async fn hazard_assessment_endpoint_reports_fallback_warning() {
    let app = assessment_router(Arc::new(plain_service()));
    let body = json!({ "coordinates": { "lat": 14.5995, "lng": 120.9842 } });

    let response = app
        .oneshot(post_json("/api/v1/hazards/assess", body))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["basis"], "default");
    assert!(payload["warning"].is_string());
}

#[tokio::test]
async fn assessment_endpoint_returns_fallback_recommendations() {
    let app = assessment_router(Arc::new(plain_service()));
    let body = json!({ "applicant": serde_json::to_value(low_risk_submission()).expect("serialize") });

    let response = app
        .oneshot(post_json("/api/v1/assessments", body))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["result"]["score"], 1);
    assert_eq!(payload["recommendations"]["source"], "fallback");
    assert!(payload["recommendations"]["recommendations"]["nextSteps"].is_array());
    assert!(payload.get("hazards").is_none());
}

#[tokio::test]
async fn geocode_requires_a_query() {
    let app = assessment_router(Arc::new(plain_service()));

    let response = app.oneshot(get("/api/v1/geocode")).await.expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn geocode_rejects_short_addresses() {
    let app = assessment_router(Arc::new(plain_service()));

    let response = app
        .oneshot(get("/api/v1/geocode?q=ab"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn geocode_resolves_gazetteer_cities_offline() {
    let app = assessment_router(Arc::new(plain_service()));

    let response = app
        .oneshot(get("/api/v1/geocode?q=Cebu"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn geocode_without_remote_geocoder_is_not_found() {
    let app = assessment_router(Arc::new(plain_service()));

    let response = app
        .oneshot(get("/api/v1/geocode?q=Barangay%20Malusog"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn normalize_endpoint_applies_overall_rating_when_hazard_list_is_null() {
    let app = assessment_router(Arc::new(plain_service()));
    let body = json!({ "riskLevel": "HIGH", "overallSummary": "x", "hazardTypes": null });

    let response = app
        .oneshot(post_json("/api/v1/hazards/normalize", body))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["basis"], "overall_risk");
    assert_eq!(payload["levels"]["flood_typhoon"], "high");
}

#[tokio::test]
async fn report_endpoint_serves_pdf_attachment() {
    let reports = Arc::new(FixedReports::default());
    let service = plain_service().with_reports(reports.clone());
    let app = assessment_router(Arc::new(service));

    let response = app
        .oneshot(get(
            "/api/v1/hazards/report?lat=14.676&lng=121.0437&address=Quezon%20City%2C%20NCR",
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"].to_str().ok(),
        Some("application/pdf")
    );
    assert_eq!(
        response.headers()["content-disposition"].to_str().ok(),
        Some("attachment; filename=\"Hazard_Report_Quezon_City_NCR_14.676_121.0437.pdf\"")
    );
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    assert_eq!(&body[..], b"%PDF-1.4 stub");
    assert_eq!(reports.call_count(), 1);
}

#[tokio::test]
async fn report_endpoint_rejects_missing_or_invalid_coordinates() {
    let reports = Arc::new(FixedReports::default());
    let app = assessment_router(Arc::new(plain_service().with_reports(reports.clone())));

    let missing = app
        .clone()
        .oneshot(get("/api/v1/hazards/report?lat=14.676"))
        .await
        .expect("response");
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    let invalid = app
        .oneshot(get("/api/v1/hazards/report?lat=95&lng=121.0"))
        .await
        .expect("response");
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    assert_eq!(reports.call_count(), 0);
}

#[tokio::test]
async fn report_endpoint_without_report_service_is_bad_gateway() {
    let app = assessment_router(Arc::new(plain_service()));

    let response = app
        .oneshot(get("/api/v1/hazards/report?lat=14.676&lng=121.0437"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let payload = read_json_body(response).await;
    assert_eq!(
        payload["error"],
        "upstream error: hazard report service is not configured"
    );
}
