// Server-side unit tests
// Routing, CORS decisions and endpoint responses without a socket

use imagepress::config::{Config, CorsConfig};
use imagepress::router::{Route, RouteMatch, Router};
use imagepress::server::endpoints;
use imagepress::server::{CorsDecision, CorsPolicy, ImageService};
use imagepress::upload::OperationKind;
use std::time::Instant;

#[test]
fn test_all_upload_endpoints_are_post_only() {
    let router = Router::new();
    for (path, kind) in [
        ("/resize_image", OperationKind::Resize),
        ("/crop_image", OperationKind::Crop),
        ("/adjust_contrast", OperationKind::Contrast),
    ] {
        assert_eq!(
            router.route("POST", path),
            RouteMatch::Found(Route::Upload(kind))
        );
        assert_eq!(router.route("GET", path), RouteMatch::MethodNotAllowed("POST"));
        assert_eq!(router.route("PUT", path), RouteMatch::MethodNotAllowed("POST"));
    }
}

#[test]
fn test_default_cors_allows_any_origin() {
    let policy = CorsPolicy::from_config(&CorsConfig::default());

    match policy.evaluate("OPTIONS", Some("http://localhost:3000"), Some("POST"), None) {
        CorsDecision::Preflight(headers) => {
            assert!(headers.contains(&("Access-Control-Allow-Origin", "*".to_string())));
            assert!(headers
                .iter()
                .any(|(name, value)| *name == "Access-Control-Allow-Methods"
                    && value.contains("POST")));
        }
        other => panic!("expected preflight, got {:?}", other),
    }
}

#[test]
fn test_health_endpoint_body() {
    let response = endpoints::handle_health(Instant::now());
    let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
    assert_eq!(body["status"], "healthy");
}

#[test]
fn test_not_found_is_json() {
    let response = endpoints::not_found("/nope");
    assert_eq!(response.status, 404);
    assert!(response.content_type.starts_with("application/json"));
}

#[test]
fn test_service_shares_metrics() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.storage.image_dir = dir.path().to_path_buf();

    let service = ImageService::new(&config);
    service.metrics().increment_request_count();
    assert_eq!(service.metrics().get_request_count(), 1);
}
