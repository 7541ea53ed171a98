//! Prediction service request and response bodies

use crate::projection::PatientPoint;
use crate::{RiskError, RiskResult};
use serde::{Deserialize, Serialize};

/// JSON body posted to the prediction endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRequest {
    /// Case identifier (patient name)
    pub case: String,
    pub model_name: String,
    pub zone: String,
    /// Projected point as `[x, y, z]`
    pub lps: [f64; 3],
}

impl PredictionRequest {
    pub fn new(
        case: impl Into<String>,
        model_name: impl Into<String>,
        zone: impl Into<String>,
        lps: PatientPoint,
    ) -> Self {
        Self {
            case: case.into(),
            model_name: model_name.into(),
            zone: zone.into(),
            lps: lps.to_array(),
        }
    }

    pub fn to_json(&self) -> RiskResult<String> {
        serde_json::to_string(self).map_err(|e| RiskError::Encode(e.to_string()))
    }
}

/// Prediction service reply
///
/// Only `description` is used; other fields are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PredictionResponse {
    pub description: String,
}

impl PredictionResponse {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }

    /// Parse a response body
    pub fn from_json(body: &str) -> RiskResult<Self> {
        serde_json::from_str(body).map_err(|e| RiskError::InvalidResponse(e.to_string()))
    }

    /// First `max_chars` characters of the description
    pub fn short_label(&self, max_chars: usize) -> String {
        self.description.chars().take(max_chars).collect()
    }
}
