//! The probe tool as seen by a host viewer
//!
//! A host drives every tool through [`AnnotationTool`]. [`RiskProbeTool`]
//! adds the loop hooks the host needs for the background risk requests:
//! draining completions, collecting redraw requests and the next wakeup.

use crate::config::ProbeToolConfig;
use crate::error::ProbeResult;
use crate::event::{Frame, PointerEvent};
use crate::geometry::CanvasPoint;
use crate::host::{CanvasTransform, DrawContext, PixelSource};
use crate::interaction::InteractionController;
use crate::marker::{Marker, MarkerId};
use crate::render::RenderPipeline;
use crate::store::{MarkerStore, SurfaceId};
use probe_prediction::{HttpPredictionService, MetadataProvider, PredictionService, RiskEstimator};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Capabilities a host expects from an annotation tool
pub trait AnnotationTool {
    /// Name the tool's markers are stored under
    fn name(&self) -> &str;

    /// Index of the marker under `point`, if any
    fn hit_test(&self, store: &dyn MarkerStore, surface: SurfaceId, point: CanvasPoint) -> Option<usize>;

    /// Returns `true` if the event hit a marker
    fn on_pointer_down(&mut self, store: &mut dyn MarkerStore, event: &PointerEvent) -> bool;

    /// Returns `true` if the event consumed a drag
    fn on_pointer_move(&mut self, store: &mut dyn MarkerStore, event: &PointerEvent) -> bool;

    /// Build a new marker for a placement event
    fn create_measurement(&mut self, event: &PointerEvent) -> ProbeResult<Marker>;

    /// Draw this tool's markers, returning how many were drawn
    fn render(&mut self, store: &mut dyn MarkerStore, frame: &Frame<'_>, ctx: &mut dyn DrawContext) -> usize;
}

/// Host collaborators needed to build a `RiskProbeTool`
#[derive(Clone)]
pub struct ToolServices {
    pub transform: Arc<dyn CanvasTransform>,
    pub pixels: Arc<dyn PixelSource>,
    pub metadata: Arc<dyn MetadataProvider>,
    pub prediction: Arc<dyn PredictionService>,
}

/// Probe marker tool with pixel readout and a remote risk estimate
pub struct RiskProbeTool {
    config: ProbeToolConfig,
    interaction: InteractionController,
    pipeline: RenderPipeline,
}

impl RiskProbeTool {
    pub fn new(config: ProbeToolConfig, services: ToolServices) -> Self {
        let estimator = RiskEstimator::new(services.prediction, services.metadata, &config.prediction);
        let interaction =
            InteractionController::new(&config, Arc::clone(&services.transform), estimator);
        let pipeline = RenderPipeline::new(&config, services.transform, services.pixels);

        tracing::info!(
            tool = %config.tool_name,
            endpoint = %config.prediction.endpoint,
            model = %config.prediction.model_name,
            "probe tool ready"
        );

        Self {
            config,
            interaction,
            pipeline,
        }
    }

    /// Build a tool that posts to the configured HTTP endpoint
    pub fn with_http(
        config: ProbeToolConfig,
        transform: Arc<dyn CanvasTransform>,
        pixels: Arc<dyn PixelSource>,
        metadata: Arc<dyn MetadataProvider>,
    ) -> Self {
        let prediction = Arc::new(HttpPredictionService::new(&config.prediction));
        Self::new(
            config,
            ToolServices {
                transform,
                pixels,
                metadata,
                prediction,
            },
        )
    }

    pub fn config(&self) -> &ProbeToolConfig {
        &self.config
    }

    pub fn interaction(&self) -> &InteractionController {
        &self.interaction
    }

    pub fn pipeline(&self) -> &RenderPipeline {
        &self.pipeline
    }

    /// Create a marker for `event` and add it to the store
    pub fn place_marker(&mut self, store: &mut dyn MarkerStore, event: &PointerEvent) -> ProbeResult<MarkerId> {
        let marker = self.interaction.create_marker(event)?;
        let id = marker.id();
        store.insert(event.surface, &self.config.tool_name, marker);
        self.interaction.request_redraw(event.surface);
        Ok(id)
    }

    /// Release per-marker state after the host removed a marker
    pub fn forget_marker(&mut self, id: MarkerId) {
        self.pipeline.stats_mut().forget(id);
    }

    /// Apply risk results that have arrived
    pub fn poll_completions(&mut self, store: &mut dyn MarkerStore) -> usize {
        self.interaction.apply_completions(store)
    }

    /// Block up to `timeout` for one risk result
    pub fn wait_for_completion(&mut self, store: &mut dyn MarkerStore, timeout: Duration) -> bool {
        self.interaction.apply_next_completion(store, timeout)
    }

    pub fn take_redraw_requests(&mut self) -> Vec<SurfaceId> {
        self.interaction.take_redraw_requests()
    }

    /// When the host should render again to flush deferred stats
    pub fn next_wakeup(&self) -> Option<Instant> {
        self.pipeline.next_deadline()
    }
}

impl AnnotationTool for RiskProbeTool {
    fn name(&self) -> &str {
        &self.config.tool_name
    }

    fn hit_test(&self, store: &dyn MarkerStore, surface: SurfaceId, point: CanvasPoint) -> Option<usize> {
        let markers = store.markers(surface, &self.config.tool_name)?;
        self.interaction.hit_test(surface, markers, point)
    }

    fn on_pointer_down(&mut self, store: &mut dyn MarkerStore, event: &PointerEvent) -> bool {
        self.interaction.on_pointer_down(store, event).is_some()
    }

    fn on_pointer_move(&mut self, store: &mut dyn MarkerStore, event: &PointerEvent) -> bool {
        self.interaction.on_pointer_move(store, event).is_some()
    }

    fn create_measurement(&mut self, event: &PointerEvent) -> ProbeResult<Marker> {
        self.interaction.create_marker(event)
    }

    fn render(&mut self, store: &mut dyn MarkerStore, frame: &Frame<'_>, ctx: &mut dyn DrawContext) -> usize {
        self.pipeline.render_frame(store, frame, ctx)
    }
}
