//! Hit-testing, drag tracking and risk requests
//!
//! The controller owns the risk estimator. Completions are only applied to
//! markers when the host loop calls `apply_completions`, so every marker
//! mutation happens on the loop thread.

use crate::config::{LabelIndexing, ProbeToolConfig};
use crate::error::{ProbeError, ProbeResult};
use crate::event::PointerEvent;
use crate::geometry::{CanvasPoint, ImagePoint};
use crate::host::CanvasTransform;
use crate::marker::{Marker, MarkerId};
use crate::store::{MarkerStore, SurfaceId};
use probe_prediction::{RiskCompletion, RiskEstimator, RiskHandle};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

/// Routes a risk completion back to its marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerKey {
    pub surface: SurfaceId,
    pub marker: MarkerId,
}

/// Pointer interaction state machine for probe markers
pub struct InteractionController {
    tool_name: String,
    hit_radius: f64,
    calculating_label: String,
    failure_label: String,
    risk_label_len: usize,
    label_indexing: LabelIndexing,
    next_fid: u32,
    transform: Arc<dyn CanvasTransform>,
    estimator: RiskEstimator<MarkerKey>,
    redraws: BTreeSet<SurfaceId>,
}

impl InteractionController {
    pub fn new(
        config: &ProbeToolConfig,
        transform: Arc<dyn CanvasTransform>,
        estimator: RiskEstimator<MarkerKey>,
    ) -> Self {
        Self {
            tool_name: config.tool_name.clone(),
            hit_radius: config.hit_radius,
            calculating_label: config.calculating_label.clone(),
            failure_label: config.failure_label.clone(),
            risk_label_len: config.risk_label_len,
            label_indexing: config.label_indexing,
            next_fid: 1,
            transform,
            estimator,
            redraws: BTreeSet::new(),
        }
    }

    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    /// Index of the first visible marker within the hit radius of `point`
    ///
    /// Markers are scanned in store order. Distances are measured in canvas space.
    pub fn hit_test(&self, surface: SurfaceId, markers: &[Marker], point: CanvasPoint) -> Option<usize> {
        markers.iter().position(|marker| {
            marker.is_visible()
                && self
                    .transform
                    .pixel_to_canvas(surface, marker.anchor())
                    .distance_to(&point)
                    < self.hit_radius
        })
    }

    /// Start a drag on the marker under the pointer, if any
    pub fn on_pointer_down(&mut self, store: &mut dyn MarkerStore, event: &PointerEvent) -> Option<usize> {
        let markers = store.markers_mut(event.surface, &self.tool_name)?;
        let index = self.hit_test(event.surface, markers, event.canvas)?;

        markers[index].set_dragging(true);
        tracing::debug!(marker = %markers[index].id(), surface = event.surface, "drag started");
        Some(index)
    }

    /// Consume a pending drag on the marker under the pointer
    ///
    /// A consumed drag re-requests the risk label and invalidates the stats.
    /// Every move clears the drag flag on all of this tool's markers on the
    /// surface, so a drag never survives past the first move after
    /// pointer-down, whether or not that move hit the marker.
    pub fn on_pointer_move(&mut self, store: &mut dyn MarkerStore, event: &PointerEvent) -> Option<RiskHandle> {
        let markers = store.markers_mut(event.surface, &self.tool_name)?;
        let hit = self.hit_test(event.surface, markers, event.canvas);

        let mut consumed = None;
        if let Some(index) = hit {
            let marker = &mut markers[index];
            if marker.is_dragging() {
                marker.set_risk_label(self.calculating_label.as_str());
                marker.invalidate();
                consumed = Some((marker.id(), marker.anchor()));
            }
        }

        for marker in markers.iter_mut().filter(|marker| marker.is_dragging()) {
            tracing::debug!(marker = %marker.id(), "drag cancelled by pointer move");
            marker.set_dragging(false);
        }

        let (id, anchor) = consumed?;
        let key = MarkerKey {
            surface: event.surface,
            marker: id,
        };

        self.request_redraw(event.surface);
        tracing::debug!(marker = %key.marker, "drag consumed, re-estimating risk");
        Some(self.estimator.estimate(key, &event.image_id, anchor))
    }

    /// Build a marker at the pointer's image position and request its risk
    ///
    /// The caller inserts the returned marker into the store under this
    /// tool's name on `event.surface`; the risk result is applied there.
    pub fn create_marker(&mut self, event: &PointerEvent) -> ProbeResult<Marker> {
        let Some(anchor) = event.image else {
            tracing::error!(
                tool = %self.tool_name,
                "required image coordinates not supplied to create_marker"
            );
            return Err(ProbeError::MissingImageCoordinates {
                tool: self.tool_name.clone(),
            });
        };

        let marker = self.new_marker(anchor);
        let key = MarkerKey {
            surface: event.surface,
            marker: marker.id(),
        };
        self.estimator.estimate(key, &event.image_id, anchor);

        Ok(marker)
    }

    fn new_marker(&mut self, anchor: ImagePoint) -> Marker {
        let mut marker = Marker::new(anchor, self.calculating_label.as_str());
        if self.label_indexing == LabelIndexing::Sequential {
            marker.set_fid(self.next_fid);
            self.next_fid += 1;
        }
        marker
    }

    /// Apply every completion that has arrived, in arrival order
    ///
    /// Returns the number of completions applied to a marker.
    pub fn apply_completions(&mut self, store: &mut dyn MarkerStore) -> usize {
        let mut applied = 0;
        for completion in self.estimator.drain_completions() {
            if self.apply_completion(store, completion) {
                applied += 1;
            }
        }
        applied
    }

    /// Wait up to `timeout` for one completion and apply it
    ///
    /// Returns `false` if nothing arrived in time or the marker is gone.
    pub fn apply_next_completion(&mut self, store: &mut dyn MarkerStore, timeout: Duration) -> bool {
        match self.estimator.next_completion(timeout) {
            Some(completion) => self.apply_completion(store, completion),
            None => false,
        }
    }

    fn apply_completion(&mut self, store: &mut dyn MarkerStore, completion: RiskCompletion<MarkerKey>) -> bool {
        let RiskCompletion {
            request_id,
            key,
            outcome,
        } = completion;

        let Some(marker) = store.find_mut(key.surface, &self.tool_name, key.marker) else {
            tracing::debug!(request_id, marker = %key.marker, "risk result for removed marker dropped");
            return false;
        };

        match outcome {
            Ok(response) => marker.set_risk_label(response.short_label(self.risk_label_len)),
            Err(err) => {
                tracing::warn!(request_id, marker = %key.marker, "risk estimation failed: {err}");
                marker.set_risk_label(self.failure_label.as_str());
            }
        }

        self.request_redraw(key.surface);
        true
    }

    /// Ask the host to redraw a surface
    pub fn request_redraw(&mut self, surface: SurfaceId) {
        self.redraws.insert(surface);
    }

    /// Surfaces that need a redraw since the last call
    pub fn take_redraw_requests(&mut self) -> Vec<SurfaceId> {
        std::mem::take(&mut self.redraws).into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MarkerCollection;
    use crate::test_utils::{controller, ScriptedService, WAIT};
    use probe_prediction::{PredictionResponse, RiskError};

    const SURFACE: SurfaceId = 1;
    const TOOL: &str = "AIProbe";

    fn store_with(points: &[(f64, f64)]) -> MarkerCollection {
        let mut store = MarkerCollection::new();
        for (x, y) in points {
            store.insert(SURFACE, TOOL, Marker::new(ImagePoint::new(*x, *y), "0.10 "));
        }
        store
    }

    fn at(x: f64, y: f64) -> PointerEvent {
        PointerEvent::new(SURFACE, "img-1", CanvasPoint::new(x, y), ImagePoint::new(x, y))
    }

    #[test]
    fn test_hit_test_returns_first_marker_in_radius() {
        let controller = controller(ScriptedService::answering("x"), &ProbeToolConfig::default());
        let store = store_with(&[(100.0, 100.0), (102.0, 100.0)]);
        let markers = store.markers(SURFACE, TOOL).unwrap();

        assert_eq!(controller.hit_test(SURFACE, markers, CanvasPoint::new(101.0, 100.0)), Some(0));
        assert_eq!(controller.hit_test(SURFACE, markers, CanvasPoint::new(106.5, 100.0)), Some(1));
        // Radius is exclusive
        assert_eq!(controller.hit_test(SURFACE, markers, CanvasPoint::new(107.0, 100.0)), None);
    }

    #[test]
    fn test_hit_test_skips_hidden_markers() {
        let controller = controller(ScriptedService::answering("x"), &ProbeToolConfig::default());
        let mut store = store_with(&[(10.0, 10.0), (11.0, 10.0)]);
        store.markers_mut(SURFACE, TOOL).unwrap()[0].set_visible(false);
        let markers = store.markers(SURFACE, TOOL).unwrap();

        assert_eq!(controller.hit_test(SURFACE, markers, CanvasPoint::new(10.0, 10.0)), Some(1));

        let mut store = store_with(&[(10.0, 10.0)]);
        store.markers_mut(SURFACE, TOOL).unwrap()[0].set_visible(false);
        let markers = store.markers(SURFACE, TOOL).unwrap();
        assert_eq!(controller.hit_test(SURFACE, markers, CanvasPoint::new(10.0, 10.0)), None);
    }

    #[test]
    fn test_pointer_down_starts_drag_only_on_hit() {
        let mut controller = controller(ScriptedService::answering("x"), &ProbeToolConfig::default());
        let mut store = store_with(&[(50.0, 50.0)]);

        assert_eq!(controller.on_pointer_down(&mut store, &at(80.0, 80.0)), None);
        assert!(!store.markers(SURFACE, TOOL).unwrap()[0].is_dragging());

        assert_eq!(controller.on_pointer_down(&mut store, &at(51.0, 51.0)), Some(0));
        assert!(store.markers(SURFACE, TOOL).unwrap()[0].is_dragging());
    }

    #[test]
    fn test_pointer_events_without_markers_are_noops() {
        let mut controller = controller(ScriptedService::answering("x"), &ProbeToolConfig::default());
        let mut store = MarkerCollection::new();

        assert_eq!(controller.on_pointer_down(&mut store, &at(1.0, 1.0)), None);
        assert!(controller.on_pointer_move(&mut store, &at(1.0, 1.0)).is_none());
        assert!(controller.take_redraw_requests().is_empty());
    }

    #[test]
    fn test_move_without_drag_does_nothing() {
        let mut controller = controller(ScriptedService::answering("x"), &ProbeToolConfig::default());
        let mut store = store_with(&[(50.0, 50.0)]);
        let before = store.markers(SURFACE, TOOL).unwrap()[0].clone();

        assert!(controller.on_pointer_move(&mut store, &at(50.0, 50.0)).is_none());
        assert_eq!(store.markers(SURFACE, TOOL).unwrap()[0], before);
    }

    #[test]
    fn test_move_consumes_drag_and_reestimates() {
        let mut controller =
            controller(ScriptedService::answering("HIGHRISK"), &ProbeToolConfig::default());
        let mut store = store_with(&[(50.0, 50.0)]);
        store.markers_mut(SURFACE, TOOL).unwrap()[0].set_stats(crate::marker::PixelStats::OutOfBounds);

        controller.on_pointer_down(&mut store, &at(50.0, 50.0));
        let handle = controller.on_pointer_move(&mut store, &at(50.0, 50.0));
        assert!(handle.is_some());

        let marker = &store.markers(SURFACE, TOOL).unwrap()[0];
        assert_eq!(marker.risk_label(), "calculating...");
        assert!(!marker.is_dragging());
        assert!(marker.is_invalidated());
        assert_eq!(controller.take_redraw_requests(), vec![SURFACE]);

        // A second move without a new pointer-down is not a drag
        assert!(controller.on_pointer_move(&mut store, &at(50.0, 50.0)).is_none());

        assert!(controller.apply_next_completion(&mut store, WAIT));
        assert_eq!(store.markers(SURFACE, TOOL).unwrap()[0].risk_label(), "HIGHR");
        assert_eq!(controller.take_redraw_requests(), vec![SURFACE]);
    }

    #[test]
    fn test_move_off_marker_cancels_drag() {
        let mut controller = controller(ScriptedService::answering("x"), &ProbeToolConfig::default());
        let mut store = store_with(&[(50.0, 50.0)]);

        controller.on_pointer_down(&mut store, &at(50.0, 50.0));
        assert!(controller.on_pointer_move(&mut store, &at(200.0, 200.0)).is_none());
        assert!(!store.markers(SURFACE, TOOL).unwrap()[0].is_dragging());

        assert!(controller.on_pointer_move(&mut store, &at(210.0, 210.0)).is_none());
        // Back over the marker without a new pointer-down
        assert!(controller.on_pointer_move(&mut store, &at(50.0, 50.0)).is_none());

        let marker = &store.markers(SURFACE, TOOL).unwrap()[0];
        assert!(!marker.is_dragging());
        assert_eq!(marker.risk_label(), "0.10 ");
        assert!(controller.take_redraw_requests().is_empty());
        assert!(!controller.apply_next_completion(&mut store, Duration::from_millis(20)));
    }

    #[test]
    fn test_move_onto_other_marker_cancels_drag() {
        let mut controller = controller(ScriptedService::answering("x"), &ProbeToolConfig::default());
        let mut store = store_with(&[(50.0, 50.0), (80.0, 80.0)]);

        controller.on_pointer_down(&mut store, &at(50.0, 50.0));
        assert!(controller.on_pointer_move(&mut store, &at(80.0, 80.0)).is_none());

        let markers = store.markers(SURFACE, TOOL).unwrap();
        assert!(markers.iter().all(|marker| !marker.is_dragging()));
    }

    #[test]
    fn test_create_marker_defaults_and_request() {
        let mut controller = controller(
            ScriptedService::answering("0.42 probability"),
            &ProbeToolConfig::default(),
        );
        let mut store = MarkerCollection::new();

        let marker = controller.create_marker(&at(10.0, 10.0)).unwrap();
        assert_eq!(marker.anchor(), ImagePoint::new(10.0, 10.0));
        assert_eq!(marker.risk_label(), "calculating...");
        assert_eq!(marker.fid(), 0);
        assert!(marker.is_visible() && marker.is_active());
        assert!(marker.is_invalidated());
        assert!(!marker.is_dragging());

        let id = marker.id();
        store.insert(SURFACE, TOOL, marker);
        assert!(controller.apply_next_completion(&mut store, WAIT));
        assert_eq!(store.find_mut(SURFACE, TOOL, id).unwrap().risk_label(), "0.42 ");
    }

    #[test]
    fn test_create_marker_requires_image_coordinates() {
        let mut controller = controller(ScriptedService::answering("x"), &ProbeToolConfig::default());
        let mut store = MarkerCollection::new();
        let event = PointerEvent::canvas_only(SURFACE, "img-1", CanvasPoint::new(1.0, 1.0));

        let err = controller.create_marker(&event).unwrap_err();
        assert_eq!(
            err,
            ProbeError::MissingImageCoordinates {
                tool: TOOL.to_string()
            }
        );
        // No request was issued
        assert!(!controller.apply_next_completion(&mut store, Duration::from_millis(20)));
    }

    #[test]
    fn test_sequential_indexing_assigns_at_creation() {
        let config = ProbeToolConfig::default().with_label_indexing(LabelIndexing::Sequential);
        let mut controller = controller(ScriptedService::answering("x"), &config);

        let a = controller.create_marker(&at(1.0, 1.0)).unwrap();
        let b = controller.create_marker(&at(2.0, 2.0)).unwrap();
        assert_eq!((a.fid(), b.fid()), (1, 2));
    }

    #[test]
    fn test_failure_sets_fallback_label() {
        let mut controller = controller(
            ScriptedService::failing(RiskError::Status(500)),
            &ProbeToolConfig::default(),
        );
        let mut store = MarkerCollection::new();

        let marker = controller.create_marker(&at(5.0, 5.0)).unwrap();
        let id = marker.id();
        store.insert(SURFACE, TOOL, marker);

        assert!(controller.apply_next_completion(&mut store, WAIT));
        assert_eq!(store.find_mut(SURFACE, TOOL, id).unwrap().risk_label(), "error");
    }

    #[test]
    fn test_completion_for_removed_marker_is_dropped() {
        let mut controller = controller(ScriptedService::answering("x"), &ProbeToolConfig::default());
        let mut store = MarkerCollection::new();

        // Created but never inserted
        let _orphan = controller.create_marker(&at(5.0, 5.0)).unwrap();

        assert!(!controller.apply_next_completion(&mut store, WAIT));
        assert!(controller.take_redraw_requests().is_empty());
    }

    #[test]
    fn test_last_completion_wins() {
        let (service, gates) = ScriptedService::gated(&[50, 51]);
        let mut controller = controller(service, &ProbeToolConfig::default());
        let mut store = store_with(&[(50.0, 50.0)]);
        let id = store.markers(SURFACE, TOOL).unwrap()[0].id();

        // First request from a drag at x=50
        controller.on_pointer_down(&mut store, &at(50.0, 50.0));
        controller.on_pointer_move(&mut store, &at(50.0, 50.0)).unwrap();

        // Second request for the same marker, keyed on a distinct anchor
        let second_key = MarkerKey {
            surface: SURFACE,
            marker: id,
        };
        controller.estimator.estimate(second_key, "img-1", ImagePoint::new(51.0, 50.0));

        gates[&51].send(Ok(PredictionResponse::new("SECOND"))).unwrap();
        assert!(controller.apply_next_completion(&mut store, WAIT));
        assert_eq!(store.find_mut(SURFACE, TOOL, id).unwrap().risk_label(), "SECON");

        gates[&50].send(Ok(PredictionResponse::new("FIRST"))).unwrap();
        assert!(controller.apply_next_completion(&mut store, WAIT));
        assert_eq!(store.find_mut(SURFACE, TOOL, id).unwrap().risk_label(), "FIRST");
    }
}
