//! Risk prediction for probe markers.
//!
//! This crate is UI-free:
//! - It projects an image-space point into patient space using image plane metadata.
//! - It posts the projected point to the prediction service and parses the risk description.
//! - It runs each request on a worker thread and hands completions back over a channel,
//!   so the caller decides on which thread results are applied.

mod client;
mod config;
mod estimator;
mod projection;
mod wire;

pub use client::{HttpPredictionService, PredictionService};
pub use config::{ConfigError, PredictionConfig};
pub use estimator::{RiskCompletion, RiskEstimator, RiskHandle, RiskRequestId};
pub use projection::{
    image_point_to_patient_point, ImagePlane, ImagePoint, MetadataProvider, PatientPoint,
};
pub use wire::{PredictionRequest, PredictionResponse};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RiskError {
    #[error("network error: {0}")]
    Network(String),
    #[error("prediction service returned status {0}")]
    Status(u16),
    #[error("failed to encode request: {0}")]
    Encode(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("missing {what} metadata for image {image_id}")]
    MissingMetadata {
        image_id: String,
        what: &'static str,
    },
    #[error("prediction worker exited without a result")]
    WorkerLost,
}

pub type RiskResult<T> = Result<T, RiskError>;
