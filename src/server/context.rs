// Per-request context carried through the Pingora hooks

use std::time::Instant;
use uuid::Uuid;

use super::cors::HeaderList;

#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: String,
    method: String,
    path: String,
    start: Instant,
    cors_headers: HeaderList,
}

impl RequestContext {
    /// Generates a unique request ID (UUID v4) and starts the request clock
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            method: String::new(),
            path: String::new(),
            start: Instant::now(),
            cors_headers: Vec::new(),
        }
    }

    pub fn set_request(&mut self, method: &str, path: &str) {
        self.method = method.to_string();
        self.path = path.to_string();
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    pub fn set_cors_headers(&mut self, headers: HeaderList) {
        self.cors_headers = headers;
    }

    pub fn take_cors_headers(&mut self) -> HeaderList {
        std::mem::take(&mut self.cors_headers)
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
