// Built-in endpoints, routing errors and CORS over a real socket

use reqwest::blocking::Client;
use reqwest::{Method, StatusCode};
use serde_json::Value;

use super::test_harness::ServerTestHarness;

#[test]
fn test_health_endpoint() {
    let harness = ServerTestHarness::start().expect("server should start");

    let response = Client::new().get(harness.url("/health")).send().unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn test_metrics_endpoint_counts_requests() {
    let harness = ServerTestHarness::start().expect("server should start");
    let client = Client::new();

    client.get(harness.url("/health")).send().unwrap();
    let response = client.get(harness.url("/metrics")).send().unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let text = response.text().unwrap();
    assert!(text.contains("# TYPE http_requests_total counter"));
    assert!(text.contains("http_requests_by_status_total{status=\"200\"}"));
}

#[test]
fn test_unknown_path_and_wrong_method() {
    let harness = ServerTestHarness::start().expect("server should start");
    let client = Client::new();

    let response = client.get(harness.url("/does-not-exist")).send().unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client.get(harness.url("/resize_image")).send().unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()["allow"], "POST");
}

#[test]
fn test_cors_preflight() {
    let harness = ServerTestHarness::start().expect("server should start");

    let response = Client::new()
        .request(Method::OPTIONS, harness.url("/crop_image"))
        .header("Origin", "http://localhost:3000")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "Content-Type")
        .send()
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert!(headers["access-control-allow-methods"]
        .to_str()
        .unwrap()
        .contains("POST"));
    assert!(headers.contains_key("access-control-allow-headers"));
    assert_eq!(headers["vary"], "Origin");
}

#[test]
fn test_cors_on_actual_request() {
    let harness = ServerTestHarness::start().expect("server should start");

    let response = Client::new()
        .get(harness.url("/health"))
        .header("Origin", "http://localhost:3000")
        .send()
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
}
