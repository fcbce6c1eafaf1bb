/// HTTP contract tests against the full router with fake transports
mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use common::{app_state, test_config, FakeBackup, FakeEmail};
use tradein_lead_api::api::app::{build_router, routes, with_cross_origin, with_rate_limit};

fn router(email: Arc<FakeEmail>, backup: Option<Arc<FakeBackup>>) -> Router {
    build_router(app_state(email, backup))
}

fn json_request(body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/leads")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ORIGIN, "https://dealer.example")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn valid_lead() -> String {
    json!({
        "name": "Jane Doe",
        "email": "jane@example.com",
        "phoneRaw": "(555) 123-4567",
        "vin": "1hgcm82633a004352",
        "year": "2020",
        "make": "honda",
        "model": "Civic"
    })
    .to_string()
}

fn assert_cors(response: &axum::response::Response) {
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_HEADERS).unwrap(),
        "content-type"
    );
}

#[tokio::test]
async fn test_valid_lead_returns_ok() {
    let email = Arc::new(FakeEmail::default());
    let response = router(email.clone(), None)
        .oneshot(json_request(&valid_lead()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_cors(&response);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body, json!({ "ok": true }));
    assert_eq!(email.sent().len(), 1);
}

#[tokio::test]
async fn test_honeypot_returns_silent_success() {
    let email = Arc::new(FakeEmail::default());
    let body = json!({ "name": "Bot", "company": "Acme" }).to_string();
    let response = router(email.clone(), None)
        .oneshot(json_request(&body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_cors(&response);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body, json!({ "ok": true, "silent": true }));
    assert!(email.sent().is_empty());
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let email = Arc::new(FakeEmail::default());
    let response = router(email.clone(), None)
        .oneshot(json_request("{\"name\": "))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_cors(&response);
    assert_eq!(body_text(response).await, "Invalid JSON");
    assert!(email.sent().is_empty());
}

#[tokio::test]
async fn test_missing_fields_is_bad_request() {
    let email = Arc::new(FakeEmail::default());
    let body = json!({ "name": "Jane Doe" }).to_string();
    let response = router(email.clone(), None)
        .oneshot(json_request(&body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_cors(&response);
    assert_eq!(body_text(response).await, "Missing required fields");
}

#[tokio::test]
async fn test_put_is_method_not_allowed_with_cors() {
    let email = Arc::new(FakeEmail::default());
    let request = Request::builder()
        .method(Method::PUT)
        .uri("/api/leads/form")
        .body(Body::empty())
        .unwrap();
    let response = router(email, None).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_cors(&response);
}

#[tokio::test]
async fn test_get_is_method_not_allowed() {
    let email = Arc::new(FakeEmail::default());
    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/leads")
        .body(Body::empty())
        .unwrap();
    let response = router(email, None).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_cors(&response);
    assert_eq!(body_text(response).await, "Method Not Allowed");
}

#[tokio::test]
async fn test_email_failure_is_bad_gateway() {
    let email = Arc::new(FakeEmail::failing());
    let response = router(email, None)
        .oneshot(json_request(&valid_lead()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_cors(&response);
    assert_eq!(body_text(response).await, "Failed to send lead");
}

#[tokio::test]
async fn test_backup_failure_still_succeeds() {
    let email = Arc::new(FakeEmail::default());
    let backup = Arc::new(FakeBackup::failing());
    let response = router(email.clone(), Some(backup.clone()))
        .oneshot(json_request(&valid_lead()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(email.sent().len(), 1);
    assert_eq!(backup.documents().len(), 1);
}

#[tokio::test]
async fn test_options_is_answered() {
    let email = Arc::new(FakeEmail::default());
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/leads")
        .body(Body::empty())
        .unwrap();
    let response = router(email.clone(), None).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_cors(&response);
    assert!(email.sent().is_empty());
}

#[tokio::test]
async fn test_cors_preflight_is_answered() {
    let email = Arc::new(FakeEmail::default());
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/leads")
        .header(header::ORIGIN, "https://dealer.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();
    let response = router(email, None).oneshot(request).await.unwrap();

    assert!(response.status().is_success());
    assert_cors(&response);
    let methods = response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_METHODS)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(methods.contains("POST"));
}

#[tokio::test]
async fn test_multipart_form_submission() {
    let email = Arc::new(FakeEmail::default());
    let boundary = "X-LEAD-BOUNDARY";
    let mut body = String::new();
    for (name, value) in [
        ("name", "Jane Doe"),
        ("email", "jane@example.com"),
        ("phoneRaw", "555.123.4567"),
        ("vin", "1hgcm82633a004352"),
        ("condition", "Fair"),
    ] {
        body.push_str(&format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
            boundary, name, value
        ));
    }
    body.push_str(&format!(
        "--{}\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"car.jpg\"\r\nContent-Type: image/jpeg\r\n\r\nJPEGDATA\r\n",
        boundary
    ));
    body.push_str(&format!("--{}--\r\n", boundary));

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/leads/form")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();
    let response = router(email.clone(), None).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_cors(&response);
    let sent = email.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].text.contains("5551234567"));
    assert!(sent[0].text.contains("Fair"));
    assert!(!sent[0].text.contains("JPEGDATA"));
}

#[tokio::test]
async fn test_form_route_rejects_non_multipart() {
    let email = Arc::new(FakeEmail::default());
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/leads/form")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("name=Jane"))
        .unwrap();
    let response = router(email, None).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_cors(&response);
    assert_eq!(body_text(response).await, "Invalid form data");
}

#[tokio::test]
async fn test_health_endpoint() {
    let email = Arc::new(FakeEmail::default());
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = router(email, None).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "tradein-lead-api");
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let email = Arc::new(FakeEmail::default());
    let huge = format!("{{\"comments\":\"{}\"}}", "a".repeat(128 * 1024));
    let response = router(email.clone(), None)
        .oneshot(json_request(&huge))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_cors(&response);
    assert!(email.sent().is_empty());
}

fn health_from(ip: &str) -> Request<Body> {
    Request::builder()
        .uri("/health")
        .header("x-forwarded-for", ip)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_rate_limit_replenishes_at_configured_rate() {
    let mut config = test_config();
    config.rate_limit_per_second = 5;
    config.rate_limit_burst = 3;

    let email = Arc::new(FakeEmail::default());
    let app = with_cross_origin(
        with_rate_limit(routes(app_state(email, None)), &config).unwrap(),
    );

    // Burst is spent, the next request is limited
    for _ in 0..3 {
        let response = app.clone().oneshot(health_from("203.0.113.7")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    let limited = app.clone().oneshot(health_from("203.0.113.7")).await.unwrap();
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        limited.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );

    // Other clients keep their own budget
    let other = app.clone().oneshot(health_from("198.51.100.9")).await.unwrap();
    assert_eq!(other.status(), StatusCode::OK);

    // 5/s means a fresh token every 200ms, so 1.1s restores the whole burst
    tokio::time::sleep(Duration::from_millis(1100)).await;
    let mut allowed = 0;
    for _ in 0..3 {
        let response = app.clone().oneshot(health_from("203.0.113.7")).await.unwrap();
        if response.status() == StatusCode::OK {
            allowed += 1;
        }
    }
    assert_eq!(allowed, 3);
}
