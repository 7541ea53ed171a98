//! Errors surfaced by the probe tool

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProbeError {
    #[error("pointer event for tool {tool} has no image coordinates")]
    MissingImageCoordinates { tool: String },
}

pub type ProbeResult<T> = Result<T, ProbeError>;
