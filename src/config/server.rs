//! Server configuration types.
//!
//! This module defines the server-level configuration including:
//! - Address and port bindings
//! - Worker threads and the transform concurrency bound
//! - Request body size limit
//! - Cross-origin policy
//!
//! Default values are sourced from `crate::constants`.

use serde::{Deserialize, Serialize};

use crate::constants::{
    CORS_ANY_ORIGIN, DEFAULT_ADDRESS, DEFAULT_CORS_HEADERS, DEFAULT_CORS_METHODS,
    DEFAULT_MAX_BODY_SIZE, DEFAULT_MAX_CONCURRENT_TRANSFORMS, DEFAULT_PORT, DEFAULT_THREADS,
};

fn default_address() -> String {
    DEFAULT_ADDRESS.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

// Default worker thread count
fn default_threads() -> usize {
    DEFAULT_THREADS
}

fn default_max_body_size() -> usize {
    DEFAULT_MAX_BODY_SIZE
}

fn default_max_concurrent_transforms() -> usize {
    DEFAULT_MAX_CONCURRENT_TRANSFORMS
}

fn default_allowed_origins() -> Vec<String> {
    vec![CORS_ANY_ORIGIN.to_string()]
}

fn default_allowed_methods() -> Vec<String> {
    DEFAULT_CORS_METHODS.iter().map(|m| m.to_string()).collect()
}

fn default_allowed_headers() -> Vec<String> {
    DEFAULT_CORS_HEADERS.iter().map(|h| h.to_string()).collect()
}

/// Cross-origin resource sharing policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins; `*` allows any origin (default: `["*"]`)
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
    /// Allowed methods (default: GET, POST, OPTIONS)
    #[serde(default = "default_allowed_methods")]
    pub allowed_methods: Vec<String>,
    /// Request headers a preflight may ask for
    #[serde(default = "default_allowed_headers")]
    pub allowed_headers: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
            allowed_methods: default_allowed_methods(),
            allowed_headers: default_allowed_headers(),
        }
    }
}

impl CorsConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.allowed_methods.is_empty() {
            return Err("server.cors.allowed_methods cannot be empty".to_string());
        }

        for method in &self.allowed_methods {
            if http::Method::from_bytes(method.to_uppercase().as_bytes()).is_err() {
                return Err(format!("Invalid CORS method '{}'", method));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Number of worker threads (default: 4)
    #[serde(default = "default_threads")]
    pub threads: usize,
    /// Maximum request body size in bytes (default: 32 MB)
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
    /// Transforms allowed to run at once on the blocking pool (default: 8)
    #[serde(default = "default_max_concurrent_transforms")]
    pub max_concurrent_transforms: usize,
    #[serde(default)]
    pub cors: CorsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
            threads: default_threads(),
            max_body_size: default_max_body_size(),
            max_concurrent_transforms: default_max_concurrent_transforms(),
            cors: CorsConfig::default(),
        }
    }
}
