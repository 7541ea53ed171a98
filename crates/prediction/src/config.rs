//! Prediction service configuration
//!
//! Configuration can be created programmatically, parsed from JSON, or
//! overridden from environment variables.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

/// Default prediction endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000/predict";

/// Default model requested from the service
pub const DEFAULT_MODEL_NAME: &str = "Densenet_T2_ABK_auc_079_nozone";

/// Errors while loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid value for {0}")]
    InvalidValue(String),
}

/// Prediction service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    /// Full URL of the predict endpoint
    pub endpoint: String,

    /// Model name sent with every request
    pub model_name: String,

    /// Prostate zone hint, empty for none
    pub zone: String,

    /// Request timeout in milliseconds, `None` waits indefinitely
    pub timeout_ms: Option<u64>,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model_name: DEFAULT_MODEL_NAME.to_string(),
            zone: String::new(),
            timeout_ms: None,
        }
    }
}

impl PredictionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the endpoint URL
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the model name
    pub fn with_model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    /// Set the zone hint
    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = zone.into();
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Request timeout, if any
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Parse configuration from a JSON string
    ///
    /// Missing keys keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&contents)
    }

    /// Load defaults overridden by environment variables
    ///
    /// Environment variables:
    /// - `RISK_PROBE_ENDPOINT`: predict endpoint URL
    /// - `RISK_PROBE_MODEL`: model name
    /// - `RISK_PROBE_TIMEOUT_MS`: request timeout in milliseconds
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a variable lookup
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("RISK_PROBE_ENDPOINT") {
            self.endpoint = val;
        }

        if let Some(val) = lookup("RISK_PROBE_MODEL") {
            self.model_name = val;
        }

        if let Some(val) = lookup("RISK_PROBE_TIMEOUT_MS") {
            let ms = val
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue("RISK_PROBE_TIMEOUT_MS".to_string()))?;
            self.timeout_ms = Some(ms);
        }

        Ok(self)
    }
}
