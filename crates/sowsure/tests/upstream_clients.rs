use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Path, Query};
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower::ServiceExt;

use sowsure::integrations::{
    CollaboratorError, Geocoder, HazardAnalysisRequest, HazardAnalyzer, HazardReportSource,
    NominatimGeocoder, OpenAiClient, RecommendationAdvisor, UlapReportSource,
};
use sowsure::workflows::assessment::{
    assessment_router, parse_recommendations, score_profile, AdvisoryContext, ApplicantProfile,
    AssessmentService, BankingHistory, HazardLevel, HazardNormalizer, HazardProfile,
    IncomeSource, InsuranceCoverage, LandOwnership, LoanHistory, ReportError, TargetScore,
};
use sowsure::workflows::location::{Coordinates, LocationError, LocationResolver};

const TIMEOUT: Duration = Duration::from_secs(5);

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock server");
    });
    format!("http://{addr}")
}

fn report_server() -> Router {
    Router::new()
        .route(
            "/reports/:lng/:lat",
            get(|Path((lng, lat)): Path<(String, String)>| async move {
                (
                    [(header::CONTENT_TYPE, "application/pdf")],
                    format!("%PDF-1.4 report for {lng} {lat}"),
                )
            }),
        )
        .route(
            "/html/:lng/:lat",
            get(|| async {
                (
                    [(header::CONTENT_TYPE, "text/html")],
                    "<html>No report for this area</html>",
                )
            }),
        )
}

#[tokio::test]
async fn report_source_requests_longitude_before_latitude() {
    let base = spawn(report_server()).await;
    let source = UlapReportSource::new(format!("{base}/reports/"), TIMEOUT).expect("client");

    let bytes = source
        .fetch_report(Coordinates::new(14.5995, 120.9842))
        .await
        .expect("pdf report");

    let body = String::from_utf8(bytes).expect("utf8");
    assert_eq!(body, "%PDF-1.4 report for 120.9842 14.5995");
}

#[tokio::test]
async fn non_pdf_report_is_malformed() {
    let base = spawn(report_server()).await;
    let source = UlapReportSource::new(format!("{base}/html"), TIMEOUT).expect("client");

    let err = source
        .fetch_report(Coordinates::new(14.5995, 120.9842))
        .await
        .expect_err("html is not a report");

    match err {
        CollaboratorError::Malformed(message) => {
            assert!(message.starts_with("no PDF report available"));
            assert!(message.contains("No report for this area"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn missing_report_surfaces_status() {
    let base = spawn(report_server()).await;
    let source = UlapReportSource::new(format!("{base}/absent"), TIMEOUT).expect("client");

    let err = source
        .fetch_report(Coordinates::new(10.3157, 123.8854))
        .await
        .expect_err("404");
    assert!(matches!(err, CollaboratorError::Status { status: 404, .. }));
}

fn report_service(base: &str, prefix: &str) -> AssessmentService {
    let source = UlapReportSource::new(format!("{base}/{prefix}"), TIMEOUT).expect("client");
    AssessmentService::new(HazardNormalizer::default()).with_reports(Arc::new(source))
}

#[tokio::test]
async fn report_download_saves_pdf_under_output_dir() {
    let base = spawn(report_server()).await;
    let service = report_service(&base, "reports");
    let dir = tempfile::tempdir().expect("tempdir");
    let output = dir.path().join("hazard-reports");

    let path = service
        .download_report(Coordinates::new(15.4865, 120.9734), &output)
        .await
        .expect("saved report");

    assert_eq!(path.parent(), Some(output.as_path()));
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .expect("file name");
    assert!(name.starts_with("hazard-report-120.9734-15.4865-"));
    assert!(name.ends_with(".pdf"));
    let saved = std::fs::read_to_string(&path).expect("read back");
    assert_eq!(saved, "%PDF-1.4 report for 120.9734 15.4865");
}

#[tokio::test]
async fn report_download_writes_nothing_when_report_is_missing() {
    let base = spawn(report_server()).await;
    let service = report_service(&base, "absent");
    let dir = tempfile::tempdir().expect("tempdir");
    let output = dir.path().join("hazard-reports");

    let err = service
        .download_report(Coordinates::new(10.3157, 123.8854), &output)
        .await
        .expect_err("404");

    assert!(matches!(
        err,
        ReportError::Upstream(CollaboratorError::Status { status: 404, .. })
    ));
    assert!(!output.exists());
}

#[tokio::test]
async fn report_route_relays_upstream_pdf() {
    let base = spawn(report_server()).await;
    let app = assessment_router(Arc::new(report_service(&base, "reports")));
    let request = Request::builder()
        .uri("/api/v1/hazards/report?lat=14.5995&lng=120.9842&address=Manila")
        .body(Body::empty())
        .expect("request");

    let response = app.oneshot(request).await.expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION].to_str().ok(),
        Some("attachment; filename=\"Hazard_Report_Manila_14.5995_120.9842.pdf\"")
    );
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    assert_eq!(&body[..], b"%PDF-1.4 report for 120.9842 14.5995");
}

#[tokio::test]
async fn report_route_maps_non_pdf_reply_to_bad_gateway() {
    let base = spawn(report_server()).await;
    let app = assessment_router(Arc::new(report_service(&base, "html")));
    let request = Request::builder()
        .uri("/api/v1/hazards/report?lat=14.5995&lng=120.9842")
        .body(Body::empty())
        .expect("request");

    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

fn geocoder_server() -> Router {
    Router::new().route(
        "/search",
        get(|Query(params): Query<HashMap<String, String>>| async move {
            if params.get("countrycodes").map(String::as_str) != Some("ph")
                || params.get("format").map(String::as_str) != Some("json")
            {
                return (StatusCode::BAD_REQUEST, Json(json!([])));
            }
            let query = params.get("q").cloned().unwrap_or_default();
            let places = if query.contains("Shinjuku") {
                json!([{ "lat": "35.6938", "lon": "139.7034", "display_name": "Shinjuku, Tokyo, Japan" }])
            } else if query.contains("Nowhere") {
                json!([])
            } else {
                json!([
                    { "lat": "14.5896", "lon": "120.9747", "display_name": "Intramuros, Manila, Philippines" },
                    { "lat": "not-a-number", "lon": "120.0", "display_name": "Broken entry" },
                    { "lat": "35.6938", "lon": "139.7034", "display_name": "Intramuros Cafe, Tokyo, Japan" }
                ])
            };
            (StatusCode::OK, Json(places))
        }),
    )
}

#[tokio::test]
async fn geocoder_parses_places_and_skips_bad_coordinates() {
    let base = spawn(geocoder_server()).await;
    let geocoder = NominatimGeocoder::new(base, TIMEOUT).expect("client");

    let candidates = geocoder.search("Intramuros Walled City").await.expect("search");

    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].display_name, "Intramuros, Manila, Philippines");
    assert_eq!(candidates[0].coordinates, Coordinates::new(14.5896, 120.9747));
}

#[tokio::test]
async fn resolver_keeps_only_philippine_candidates() {
    let base = spawn(geocoder_server()).await;
    let resolver = LocationResolver::new(Arc::new(
        NominatimGeocoder::new(base, TIMEOUT).expect("client"),
    ));

    let candidates = resolver
        .resolve("Intramuros Walled City")
        .await
        .expect("resolves");
    assert_eq!(candidates.len(), 1);

    let outside = resolver
        .resolve("Shinjuku Station")
        .await
        .expect_err("outside");
    assert!(matches!(outside, LocationError::OutsidePhilippines(name) if name.contains("Tokyo")));

    let none = resolver.resolve("Nowhere Street").await.expect_err("empty");
    assert!(matches!(none, LocationError::NoResults(_)));
}

#[tokio::test]
async fn geocoder_error_status_is_reported() {
    let app = Router::new().route(
        "/search",
        get(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down").into_response() }),
    );
    let base = spawn(app).await;
    let resolver = LocationResolver::new(Arc::new(
        NominatimGeocoder::new(base, TIMEOUT).expect("client"),
    ));

    let err = resolver.resolve("Barangay Malusog").await.expect_err("429");
    assert!(matches!(
        err,
        LocationError::Geocoder(CollaboratorError::Status {
            service: "geocoder",
            status: 429
        })
    ));
}

fn completion_server(content: &'static str) -> Router {
    Router::new().route(
        "/chat/completions",
        post(move |headers: HeaderMap, Json(body): Json<Value>| async move {
            let authorized = headers
                .get(header::AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                == Some("Bearer test-key");
            if !authorized || body["model"] != "gpt-4o-mini" {
                return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "bad credentials" })));
            }
            (
                StatusCode::OK,
                Json(json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] })),
            )
        }),
    )
}

fn client(base: &str, key: &str) -> OpenAiClient {
    OpenAiClient::new(key, "gpt-4o-mini", base, TIMEOUT).expect("client")
}

fn analysis_request() -> HazardAnalysisRequest {
    HazardAnalysisRequest {
        coordinates: Coordinates::new(15.4865, 120.9734),
        address: Some("Cabanatuan, Nueva Ecija".to_string()),
        report_text: "Flood susceptibility HIGH. ".repeat(20),
    }
}

#[tokio::test]
async fn analyzer_parses_fenced_json_reply() {
    let reply = "Here you go:\n```json\n{\"riskLevel\": \"HIGH\", \"overallSummary\": \"Flood prone\", \"hazardTypes\": [{\"type\": \"Flooding\", \"risk\": \"HIGH\"}], \"recommendations\": [], \"keyFindings\": [\"river nearby\"]}\n```";
    let base = spawn(completion_server(reply)).await;

    let analysis = client(&base, "test-key")
        .analyze(&analysis_request())
        .await
        .expect("analysis");

    assert_eq!(analysis.risk_level.as_deref(), Some("HIGH"));
    assert_eq!(analysis.hazard_types.len(), 1);
    assert_eq!(analysis.hazard_types[0].kind, "Flooding");
    assert_eq!(analysis.key_findings, ["river nearby"]);
}

#[tokio::test]
async fn analyzer_rejects_prose_reply() {
    let base = spawn(completion_server("I could not read the report.")).await;

    let err = client(&base, "test-key")
        .analyze(&analysis_request())
        .await
        .expect_err("not json");
    assert!(matches!(err, CollaboratorError::Malformed(_)));
}

#[tokio::test]
async fn rejected_credentials_surface_status() {
    let base = spawn(completion_server("{}")).await;

    let err = client(&base, "wrong-key")
        .analyze(&analysis_request())
        .await
        .expect_err("401");
    assert!(matches!(err, CollaboratorError::Status { status: 401, .. }));
}

#[test]
fn placeholder_key_is_not_a_client() {
    let err = OpenAiClient::new("your_openai_api_key_here", "gpt-4o-mini", "http://localhost", TIMEOUT)
        .expect_err("placeholder key");
    assert!(matches!(err, CollaboratorError::NotConfigured("OPENAI_API_KEY")));
}

#[tokio::test]
async fn advisor_reply_feeds_recommendation_parsing() {
    let reply = r#"{"priorityRecommendations": ["Join the local irrigators association"], "financialImprovements": ["Track expenses monthly"], "riskMitigation": ["Enroll in PCIC insurance"], "nextSteps": ["Visit the Land Bank branch"], "potentialScoreImprovement": {"description": "Insurance and coop membership", "targetScore": "15-25 points lower"}}"#;
    let base = spawn(completion_server(reply)).await;

    let profile = ApplicantProfile {
        income: 180_000.0,
        expenses: 120_000.0,
        loan_payments: 30_000.0,
        income_sources: IncomeSource::Rice,
        loan_history: LoanHistory::Late1To2,
        land_ownership: LandOwnership::Tenant,
        equipment_savings: 10_000.0,
        crops_storage: 5_000.0,
        collateral_ratio: 0.6,
        insurance: InsuranceCoverage::Uninsured,
        banking_history: BankingHistory::SavingsOnly,
        coop_member: false,
        hazards: HazardProfile::uniform(HazardLevel::Moderate),
    };
    let result = score_profile(&profile);
    let context = AdvisoryContext {
        profile,
        result,
        address: None,
    };

    let raw = client(&base, "test-key").advise(&context).await.expect("advice");
    let parsed = parse_recommendations(&raw).expect("parses");

    assert_eq!(parsed.next_steps, ["Visit the Land Bank branch"]);
    assert_eq!(
        parsed.potential_score_improvement.target_score,
        TargetScore::Text("15-25 points lower".to_string())
    );
}
