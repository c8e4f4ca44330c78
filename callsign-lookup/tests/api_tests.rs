//! Integration tests for callsign-lookup HTTP endpoints
//!
//! Tests cover:
//! - Root form and health endpoint
//! - Lookup as HTML, JSON and JSONP, found and not found
//! - Upload login redirect, upload form, and streamed import report

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use callsign_common::{Member, MemberStore, MemoryMemberStore};
use callsign_lookup::api::{DisabledAuthenticator, HeaderAuthenticator};
use callsign_lookup::{build_router, AppState, ImportConfig};
use serde_json::Value;
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot` method

const USER_HEADER: &str = "x-authenticated-user";
const BOUNDARY: &str = "----callsign-test-boundary";

/// Test helper: store holding W1ABC
fn setup_store() -> Arc<MemoryMemberStore> {
    let member = Member {
        callsign: "W1ABC".to_string(),
        last_name: "Doe".to_string(),
        name: "John".to_string(),
        street: "1 Main St".to_string(),
        city: "Boston".to_string(),
        state: "MA".to_string(),
        zip: "02101".to_string(),
        quarter_expiring: 4,
        year_expiring: 2024,
        ..Default::default()
    };
    Arc::new(MemoryMemberStore::with_members([
        member,
        Member::with_callsign("K2XYZ"),
    ]))
}

/// Test helper: app with header authentication
fn setup_app(store: Arc<MemoryMemberStore>) -> Router {
    let auth = HeaderAuthenticator::new(USER_HEADER, "/login").unwrap();
    let config = ImportConfig {
        writers: 4,
        queue_capacity: 4,
    };
    build_router(AppState::new(store, Arc::new(auth), config))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Test helper: multipart upload of `csv` as the `csvfile` field
fn upload_request(csv: &str) -> Request<Body> {
    let body = format!(
        "--{b}\r\n\
         Content-Disposition: form-data; name=\"csvfile\"; filename=\"roster.csv\"\r\n\
         Content-Type: text/csv\r\n\
         \r\n\
         {csv}\r\n\
         --{b}--\r\n",
        b = BOUNDARY,
        csv = csv
    );
    Request::builder()
        .method("POST")
        .uri("/update")
        .header(USER_HEADER, "alice@example.org")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_text(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    String::from_utf8(bytes.to_vec()).expect("Body should be UTF-8")
}

async fn body_json(body: Body) -> Value {
    serde_json::from_str(&body_text(body).await).expect("Should parse JSON")
}

// =============================================================================
// Root and health
// =============================================================================

#[tokio::test]
async fn test_root_serves_lookup_form() {
    let app = setup_app(setup_store());

    let response = app.oneshot(get("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response.into_body()).await;
    assert!(html.contains(r#"action="/lookup""#));
    assert!(html.contains(r#"name="callsign""#));
}

#[tokio::test]
async fn test_health_reports_member_count() {
    let app = setup_app(setup_store());

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "callsign-lookup");
    assert_eq!(body["members"], 2);
    assert!(body["version"].is_string());
    assert!(!body["git_hash"].as_str().unwrap_or_default().is_empty());
}

// =============================================================================
// Lookup
// =============================================================================

#[tokio::test]
async fn test_lookup_html_normalizes_callsign() {
    let app = setup_app(setup_store());

    let response = app
        .oneshot(get("/lookup?callsign=%20w1abc%20"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response.into_body()).await;
    assert!(html.contains("<h3>W1ABC</h3>"));
    assert!(html.contains("Boston, MA 02101"));
    assert!(html.contains("Expires: Q4 2024"));
}

#[tokio::test]
async fn test_lookup_html_not_found() {
    let app = setup_app(setup_store());

    let response = app.oneshot(get("/lookup?callsign=N0NE")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_text(response.into_body()).await.contains("Not Found."));
}

#[tokio::test]
async fn test_lookup_json_found() {
    let app = setup_app(setup_store());

    let response = app
        .oneshot(get("/lookup?callsign=w1abc&format=json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-member-found"], "true");
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );
    let body = body_json(response.into_body()).await;
    assert_eq!(body["Callsign"], "W1ABC");
    assert_eq!(body["LastName"], "Doe");
    assert_eq!(body["QuarterExpiring"], 4);
    assert_eq!(body["YearExpiring"], 2024);
}

#[tokio::test]
async fn test_lookup_json_not_found_is_zero_record() {
    let app = setup_app(setup_store());

    let response = app
        .oneshot(get("/lookup?callsign=N0NE&format=json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-member-found"], "false");
    let body = body_json(response.into_body()).await;
    assert_eq!(body["Callsign"], "");
    assert_eq!(body["YearExpiring"], 0);
}

#[tokio::test]
async fn test_lookup_jsonp_wraps_record() {
    let app = setup_app(setup_store());

    let response = app
        .clone()
        .oneshot(get("/lookup?callsign=W1ABC&format=json&jsonp=handle"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/javascript"
    );
    let script = body_text(response.into_body()).await;
    assert!(script.starts_with("handle({"));
    assert!(script.ends_with("});"));
    assert!(script.contains(r#""Callsign":"W1ABC""#));

    let response = app
        .oneshot(get("/lookup?callsign=W1ABC&format=json&callback=app.cb"))
        .await
        .unwrap();
    assert!(body_text(response.into_body()).await.starts_with("app.cb({"));
}

#[tokio::test]
async fn test_lookup_rejects_unsafe_jsonp_name() {
    let app = setup_app(setup_store());

    let response = app
        .oneshot(get(
            "/lookup?callsign=W1ABC&format=json&jsonp=alert(1)%3Bcb",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Update
// =============================================================================

#[tokio::test]
async fn test_update_redirects_anonymous_to_login() {
    let app = setup_app(setup_store());

    let response = app.oneshot(get("/update")).await.unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers()[header::LOCATION],
        "/login?continue=%2Fupdate"
    );
}

#[tokio::test]
async fn test_update_form_for_signed_in_user() {
    let app = setup_app(setup_store());
    let request = Request::builder()
        .uri("/update")
        .header(USER_HEADER, "alice@example.org")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response.into_body()).await;
    assert!(html.contains("Hello, alice@example.org!"));
    assert!(html.contains(r#"enctype="multipart/form-data""#));
}

#[tokio::test]
async fn test_post_without_file_shows_form() {
    let app = setup_app(setup_store());
    let request = Request::builder()
        .method("POST")
        .uri("/update")
        .header(USER_HEADER, "alice@example.org")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response.into_body()).await.contains("Hello, alice@example.org!"));
}

#[tokio::test]
async fn test_upload_streams_report_and_replaces_directory() {
    let store = setup_store();
    let app = setup_app(store.clone());
    let csv = "CALL,LASTNAME,NAME,QTREXP,YEAREXP\n\
               W1ABC,Doe,Johnny,1,2025\n\
               N3NEW,Smith,Ann,x,2026\n\
               n3new,Smith,Ann,2,2026\n";

    let response = app.oneshot(upload_request(csv)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let report = body_text(response.into_body()).await;
    assert!(report.contains("Adding N3NEW"));
    assert!(report.contains("Cannot parse N3NEW's Quarter Expiring as a number"));
    assert!(report.contains("Deleting K2XYZ"));
    assert!(report.contains("Added 1, updated 1, deleted 1."));
    assert!(report.contains("Found 1 duplicates:"));
    assert!(report.contains("<li>N3NEW</li>"));
    assert!(report.trim_end().ends_with("</body></html>"));

    assert_eq!(store.scan_keys().await.unwrap(), vec!["N3NEW", "W1ABC"]);
    let updated = store.get("W1ABC").await.unwrap().unwrap();
    assert_eq!(updated.name, "Johnny");
    assert_eq!(updated.city, "");
    assert_eq!(updated.year_expiring, 2025);
}

#[tokio::test]
async fn test_upload_with_auth_disabled() {
    let store = Arc::new(MemoryMemberStore::new());
    let state = AppState::new(
        store.clone(),
        Arc::new(DisabledAuthenticator),
        ImportConfig::default(),
    );
    let app = build_router(state);
    let request = Request::builder()
        .uri("/update")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response.into_body()).await.contains("Hello, anonymous!"));
}

#[tokio::test]
async fn test_upload_without_header_row_fails_before_streaming() {
    let store = setup_store();
    let app = setup_app(store.clone());

    let response = app.oneshot(upload_request("")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(store.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let store = setup_store();
    let auth = HeaderAuthenticator::new(USER_HEADER, "/login").unwrap();
    let state = AppState::new(store.clone(), Arc::new(auth), ImportConfig::default())
        .with_max_upload_bytes(256);
    let app = build_router(state);

    let mut csv = String::from("CALL,NAME\n");
    for i in 0..100 {
        csv.push_str(&format!("K{}BIG,Member {}\n", i, i));
    }

    let response = app.oneshot(upload_request(&csv)).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(store.count().await.unwrap(), 2);
}
