//! Risk probe annotation tool
//!
//! A probe marker sits on a point of a displayed image. It shows the pixel
//! value under it and a short cancer-risk estimate fetched from a remote
//! prediction service. Markers can be dragged; each consumed drag requests a
//! fresh estimate.
//!
//! The host viewer owns the event loop. It forwards pointer events and
//! frames to a [`RiskProbeTool`], and between frames calls
//! [`RiskProbeTool::poll_completions`] so results of background requests are
//! written into markers on the loop thread.
//!
//! # Example
//!
//! ```ignore
//! let mut tool = RiskProbeTool::with_http(ProbeToolConfig::from_env()?, transform, pixels, metadata);
//! let mut store = MarkerCollection::new();
//!
//! tool.place_marker(&mut store, &PointerEvent::new(surface, "img-1", canvas, image_point))?;
//! loop {
//!     tool.poll_completions(&mut store);
//!     for surface in tool.take_redraw_requests() {
//!         tool.render(&mut store, &Frame::new(surface, &image, Instant::now()), &mut ctx);
//!     }
//! }
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod geometry;
pub mod host;
pub mod interaction;
pub mod marker;
pub mod render;
pub mod stats;
pub mod store;
pub mod tool;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::{LabelIndexing, ProbeToolConfig, RenderStyle};
pub use error::{ProbeError, ProbeResult};
pub use event::{Frame, PointerEvent};
pub use geometry::{CanvasPoint, Color, ImagePoint};
pub use host::{CanvasTransform, DrawContext, ImageInfo, PixelSource};
pub use interaction::{InteractionController, MarkerKey};
pub use marker::{Marker, MarkerId, PixelStats, PixelValues};
pub use render::RenderPipeline;
pub use stats::{PixelStatsCache, StatsRefresh};
pub use store::{MarkerCollection, MarkerStore, SurfaceId};
pub use tool::{AnnotationTool, RiskProbeTool, ToolServices};

pub use probe_prediction::{
    ConfigError, HttpPredictionService, ImagePlane, MetadataProvider, PredictionConfig,
    PredictionRequest, PredictionResponse, PredictionService, RiskError, RiskHandle, RiskResult,
};
