//! Blocking prediction service client

use crate::config::PredictionConfig;
use crate::wire::{PredictionRequest, PredictionResponse};
use crate::{RiskError, RiskResult};

/// One request/response round trip to the prediction service
///
/// Implementations block the calling thread; `RiskEstimator` calls them from
/// worker threads.
pub trait PredictionService: Send + Sync {
    fn predict(&self, request: &PredictionRequest) -> RiskResult<PredictionResponse>;
}

/// HTTP implementation of `PredictionService`
pub struct HttpPredictionService {
    agent: ureq::Agent,
    endpoint: String,
}

impl HttpPredictionService {
    pub fn new(config: &PredictionConfig) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        Self {
            agent: builder.build(),
            endpoint: config.endpoint.clone(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl PredictionService for HttpPredictionService {
    fn predict(&self, request: &PredictionRequest) -> RiskResult<PredictionResponse> {
        let body = request.to_json()?;

        let resp = self
            .agent
            .post(&self.endpoint)
            .set("Content-Type", "application/json")
            .send_string(&body)
            .map_err(|e| match e {
                ureq::Error::Status(code, _) => RiskError::Status(code),
                other => RiskError::Network(other.to_string()),
            })?;

        let body = resp
            .into_string()
            .map_err(|e| RiskError::InvalidResponse(e.to_string()))?;

        PredictionResponse::from_json(&body)
    }
}
