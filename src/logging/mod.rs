// Logging module for structured logging using the tracing crate

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};
use crate::error::ServiceError;

/// Build the filter for the subscriber.
///
/// `RUST_LOG` wins over the configured level so operators can raise
/// verbosity without touching the config file.
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, ServiceError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| {
            ServiceError::Config(format!("Invalid log level '{}': {}", config.level, e))
        }),
    }
}

/// Initialize the tracing subscriber for structured logging
///
/// The subscriber is configured with:
/// - JSON or pretty formatting depending on `logging.format`
/// - Filtering from `RUST_LOG`, falling back to `logging.level`
/// - Output to stdout for container deployments
///
/// # Errors
///
/// Returns an error if the level directive is invalid or a global
/// subscriber has already been installed.
///
/// # Examples
///
/// ```
/// use imagepress::config::LoggingConfig;
/// use imagepress::logging::init_subscriber;
///
/// init_subscriber(&LoggingConfig::default()).expect("Failed to initialize logging");
/// tracing::info!("Application started");
/// ```
pub fn init_subscriber(config: &LoggingConfig) -> Result<(), ServiceError> {
    let filter = build_filter(config)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = match config.format {
        LogFormat::Json => builder.json().with_current_span(false).try_init(),
        LogFormat::Pretty => builder.try_init(),
    };

    result.map_err(|e| ServiceError::Internal(format!("Failed to install subscriber: {}", e)))
}
