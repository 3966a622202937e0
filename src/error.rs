// Error types module

use std::fmt;

/// Startup and lifecycle errors for the service
///
/// Request-level failures are reported through `UploadError`; this type
/// covers what can stop the process before it serves anything.
#[derive(Debug, Clone)]
pub enum ServiceError {
    /// Configuration errors (invalid YAML, missing env vars, bad values)
    Config(String),

    /// Image directory missing, not a directory, or not writable
    Storage(String),

    /// Logging or server bootstrap failures
    Internal(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Config(msg) => write!(f, "Configuration error: {}", msg),
            ServiceError::Storage(msg) => write!(f, "Storage error: {}", msg),
            ServiceError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ServiceError {}
