//! Response generators for the service.
//!
//! Functions return `EndpointResponse` instead of writing to the session so
//! they stay testable; the service writes the result out.

use bytes::Bytes;
use serde_json::json;
use std::time::Instant;

use super::cors::HeaderList;
use crate::metrics::Metrics;
use crate::upload::ApiResponse;

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

#[derive(Debug, Clone)]
pub struct EndpointResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Bytes,
    pub headers: HeaderList,
}

impl EndpointResponse {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            content_type: JSON_CONTENT_TYPE,
            body: Bytes::from(body.to_string()),
            headers: Vec::new(),
        }
    }

    pub fn message(status: u16, message: &str) -> Self {
        Self::json(status, json!({ "message": message }))
    }

    pub fn prometheus(body: String) -> Self {
        Self {
            status: 200,
            content_type: PROMETHEUS_CONTENT_TYPE,
            body: Bytes::from(body),
            headers: Vec::new(),
        }
    }

    /// Empty 204, used for preflights
    pub fn no_content() -> Self {
        Self {
            status: 204,
            content_type: JSON_CONTENT_TYPE,
            body: Bytes::new(),
            headers: Vec::new(),
        }
    }

    pub fn with_headers(mut self, headers: HeaderList) -> Self {
        self.headers.extend(headers);
        self
    }
}

impl From<ApiResponse> for EndpointResponse {
    fn from(response: ApiResponse) -> Self {
        Self {
            status: response.status,
            content_type: JSON_CONTENT_TYPE,
            body: response.body_bytes(),
            headers: Vec::new(),
        }
    }
}

/// `/health`: uptime and version
pub fn handle_health(start_time: Instant) -> EndpointResponse {
    EndpointResponse::json(
        200,
        json!({
            "status": "healthy",
            "uptime_seconds": start_time.elapsed().as_secs(),
            "version": env!("CARGO_PKG_VERSION"),
        }),
    )
}

/// `/metrics`: Prometheus text exposition
pub fn handle_metrics(metrics: &Metrics) -> EndpointResponse {
    EndpointResponse::prometheus(metrics.export_prometheus())
}

pub fn not_found(path: &str) -> EndpointResponse {
    EndpointResponse::message(404, &format!("No route for {}", path))
}

pub fn method_not_allowed(allow: &'static str) -> EndpointResponse {
    EndpointResponse::message(405, "Method not allowed")
        .with_headers(vec![("Allow", allow.to_string())])
}

pub fn origin_forbidden() -> EndpointResponse {
    EndpointResponse::message(403, "Origin not allowed")
}
