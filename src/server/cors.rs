//! Cross-origin request handling.
//!
//! Requests without an `Origin` header are not CORS requests and pass
//! through untouched. Everything else either gets the allow headers or is
//! refused with 403.

use crate::config::CorsConfig;
use crate::constants::CORS_ANY_ORIGIN;

/// Preflight cache lifetime sent in `Access-Control-Max-Age`
const PREFLIGHT_MAX_AGE_SECS: u64 = 12 * 60 * 60;

pub type HeaderList = Vec<(&'static str, String)>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsDecision {
    /// No `Origin` header
    NotCors,
    /// Answer the preflight with 204 and these headers
    Preflight(HeaderList),
    /// Continue, adding these headers to the response
    Actual(HeaderList),
    /// Origin not in the allow list
    Forbidden,
}

#[derive(Debug, Clone)]
pub struct CorsPolicy {
    any_origin: bool,
    origins: Vec<String>,
    methods: Vec<String>,
    headers: Vec<String>,
}

impl CorsPolicy {
    pub fn from_config(config: &CorsConfig) -> Self {
        Self {
            any_origin: config.allowed_origins.iter().any(|o| o == CORS_ANY_ORIGIN),
            origins: config.allowed_origins.clone(),
            methods: config
                .allowed_methods
                .iter()
                .map(|m| m.to_ascii_uppercase())
                .collect(),
            headers: config.allowed_headers.clone(),
        }
    }

    fn origin_allowed(&self, origin: &str) -> bool {
        self.any_origin || self.origins.iter().any(|o| o == origin)
    }

    fn allow_origin_value(&self, origin: &str) -> String {
        if self.any_origin {
            CORS_ANY_ORIGIN.to_string()
        } else {
            origin.to_string()
        }
    }

    fn method_allowed(&self, requested: &str) -> bool {
        self.methods.iter().any(|m| m.eq_ignore_ascii_case(requested.trim()))
    }

    fn headers_allowed(&self, requested: &str) -> bool {
        requested
            .split(',')
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .all(|h| self.headers.iter().any(|a| a.eq_ignore_ascii_case(h)))
    }

    /// Decide how to treat a request.
    ///
    /// `request_method` and `request_headers` are the
    /// `Access-Control-Request-*` values of a preflight.
    pub fn evaluate(
        &self,
        method: &str,
        origin: Option<&str>,
        request_method: Option<&str>,
        request_headers: Option<&str>,
    ) -> CorsDecision {
        let Some(origin) = origin else {
            return CorsDecision::NotCors;
        };
        if !self.origin_allowed(origin) {
            return CorsDecision::Forbidden;
        }

        let mut headers: HeaderList = vec![
            ("Access-Control-Allow-Origin", self.allow_origin_value(origin)),
            ("Vary", "Origin".to_string()),
        ];

        if method.eq_ignore_ascii_case("OPTIONS") && request_method.is_some() {
            // Unlisted method: answer without allow headers so the browser
            // refuses the actual request
            if !request_method.is_some_and(|m| self.method_allowed(m)) {
                return CorsDecision::Preflight(headers);
            }
            headers.push(("Access-Control-Allow-Methods", self.methods.join(", ")));
            if let Some(requested) = request_headers {
                if self.headers_allowed(requested) {
                    headers.push(("Access-Control-Allow-Headers", self.headers.join(", ")));
                }
            }
            headers.push(("Access-Control-Max-Age", PREFLIGHT_MAX_AGE_SECS.to_string()));
            return CorsDecision::Preflight(headers);
        }

        CorsDecision::Actual(headers)
    }
}
