//! Probe tool configuration
//!
//! One `ProbeToolConfig` drives the interaction controller, the render
//! pipeline and the prediction client. It can be created programmatically,
//! parsed from JSON, or overridden from environment variables.

use crate::geometry::Color;
use crate::marker::Marker;
use probe_prediction::{ConfigError, PredictionConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// How a marker's display index is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelIndexing {
    /// Assigned at first render from the live marker count on the surface
    #[default]
    LiveCount,
    /// Assigned at creation from a counter starting at 1
    Sequential,
}

/// Visual parameters for marker rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderStyle {
    /// Handle radius in canvas pixels
    pub handle_radius: f64,

    /// Text line height in canvas pixels
    pub font_height: f64,

    /// Label anchor offset from the marker, in image units
    pub label_offset: (f64, f64),

    /// Extra spacing between the index label and the risk label
    pub risk_label_gap: f64,

    /// Text placed before the risk label
    pub risk_label_prefix: String,

    /// Color for inactive markers
    pub tool_color: Color,

    /// Color for active markers
    pub active_color: Color,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            handle_radius: 6.0,
            font_height: 15.0,
            label_offset: (3.0, -3.0),
            risk_label_gap: 5.0,
            risk_label_prefix: "Cancer risk: ".to_string(),
            tool_color: Color::WHITE,
            active_color: Color::GREEN_YELLOW,
        }
    }
}

impl RenderStyle {
    /// Color used for a marker's handle and labels
    pub fn color_for(&self, marker: &Marker) -> Color {
        match marker.color() {
            Some(color) => color,
            None if marker.is_active() => self.active_color,
            None => self.tool_color,
        }
    }
}

/// Complete tool configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeToolConfig {
    /// Name markers are stored under
    pub tool_name: String,

    /// Sibling tool whose markers count towards display indices
    pub legacy_tool_name: Option<String>,

    /// Hit-test radius in canvas pixels
    pub hit_radius: f64,

    /// Minimum spacing of throttled stats recomputes
    pub stats_throttle_ms: u64,

    /// Characters of the risk description kept for display
    pub risk_label_len: usize,

    /// Label shown while a request is in flight
    pub calculating_label: String,

    /// Label shown when a request failed
    pub failure_label: String,

    pub label_indexing: LabelIndexing,

    pub style: RenderStyle,

    pub prediction: PredictionConfig,
}

impl Default for ProbeToolConfig {
    fn default() -> Self {
        Self {
            tool_name: "AIProbe".to_string(),
            legacy_tool_name: Some("Probe".to_string()),
            hit_radius: 5.0,
            stats_throttle_ms: 110,
            risk_label_len: 5,
            calculating_label: "calculating...".to_string(),
            failure_label: "error".to_string(),
            label_indexing: LabelIndexing::LiveCount,
            style: RenderStyle::default(),
            prediction: PredictionConfig::default(),
        }
    }
}

impl ProbeToolConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tool name
    pub fn with_tool_name(mut self, name: impl Into<String>) -> Self {
        self.tool_name = name.into();
        self
    }

    /// Set or clear the legacy sibling tool
    pub fn with_legacy_tool_name(mut self, name: Option<String>) -> Self {
        self.legacy_tool_name = name;
        self
    }

    /// Set the display index policy
    pub fn with_label_indexing(mut self, indexing: LabelIndexing) -> Self {
        self.label_indexing = indexing;
        self
    }

    /// Set the stats throttle interval
    pub fn with_stats_throttle(mut self, interval: Duration) -> Self {
        self.stats_throttle_ms = interval.as_millis() as u64;
        self
    }

    /// Set the failure label
    pub fn with_failure_label(mut self, label: impl Into<String>) -> Self {
        self.failure_label = label.into();
        self
    }

    /// Set the prediction client configuration
    pub fn with_prediction(mut self, prediction: PredictionConfig) -> Self {
        self.prediction = prediction;
        self
    }

    pub fn stats_throttle(&self) -> Duration {
        Duration::from_millis(self.stats_throttle_ms)
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
    /// Reads `RISK_PROBE_THROTTLE_MS` plus the prediction variables
    /// understood by `PredictionConfig::from_env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a variable lookup
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("RISK_PROBE_THROTTLE_MS") {
            self.stats_throttle_ms = val
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue("RISK_PROBE_THROTTLE_MS".to_string()))?;
        }

        self.prediction = self.prediction.with_env_overrides(&lookup)?;
        Ok(self)
    }
}
