// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::transform::ImageConfig;

pub mod logging;
pub mod server;
pub mod storage;

pub use logging::{LogFormat, LoggingConfig};
pub use server::{CorsConfig, ServerConfig};
pub use storage::StorageConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, String> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").map_err(|e| e.to_string())?;

        // First, check that all referenced environment variables exist
        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            std::env::var(var_name).map_err(|_| {
                format!(
                    "Environment variable '{}' is referenced but not set",
                    var_name
                )
            })?;
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        serde_yaml::from_str(&substituted).map_err(|e| e.to_string())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_yaml_with_env(&yaml)
    }

    /// Load the config file, falling back to built-in defaults when the file
    /// does not exist. Any other read or parse failure is an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::from_file(path)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.server.address.trim().is_empty() {
            return Err("Server address cannot be empty".to_string());
        }

        if self.server.threads == 0 {
            return Err("server.threads must be greater than 0".to_string());
        }

        if self.server.max_body_size == 0 {
            return Err("server.max_body_size must be greater than 0".to_string());
        }

        if self.server.max_concurrent_transforms == 0 {
            return Err("server.max_concurrent_transforms must be greater than 0".to_string());
        }

        self.server.cors.validate()?;

        if self.storage.image_dir.as_os_str().is_empty() {
            return Err("storage.image_dir cannot be empty".to_string());
        }

        self.image.validate()?;

        Ok(())
    }

    /// Socket address string handed to the listener
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.server.address, self.server.port)
    }
}
