//! Shared fakes for unit tests

use crate::config::ProbeToolConfig;
use crate::geometry::{CanvasPoint, Color, ImagePoint};
use crate::host::{CanvasTransform, DrawContext, PixelSource};
use crate::interaction::{InteractionController, MarkerKey};
use crate::store::SurfaceId;
use probe_prediction::{
    ImagePlane, MetadataProvider, PredictionRequest, PredictionResponse, PredictionService,
    RiskEstimator, RiskError, RiskResult,
};
use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Upper bound for waiting on a background request in tests
pub const WAIT: Duration = Duration::from_secs(5);

/// Canvas space equals image space
pub struct IdentityTransform;

impl CanvasTransform for IdentityTransform {
    fn pixel_to_canvas(&self, _surface: SurfaceId, point: ImagePoint) -> CanvasPoint {
        CanvasPoint::new(point.x, point.y)
    }

    fn canvas_to_pixel(&self, _surface: SurfaceId, point: CanvasPoint) -> ImagePoint {
        ImagePoint::new(point.x, point.y)
    }
}

/// Pixel values derived from their position
pub struct GradientPixels;

impl GradientPixels {
    pub fn value(x: i64, y: i64) -> i32 {
        (x + y * 1000) as i32
    }
}

impl PixelSource for GradientPixels {
    fn stored_pixels(&self, _surface: SurfaceId, x: i64, y: i64, _width: u32, _height: u32) -> Vec<i32> {
        vec![Self::value(x, y)]
    }

    fn rgb_pixels(&self, _surface: SurfaceId, x: i64, y: i64, _width: u32, _height: u32) -> Vec<u8> {
        vec![x as u8, y as u8, 0]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Handle {
        center: CanvasPoint,
        radius: f64,
        color: Color,
    },
    Text {
        text: String,
        at: CanvasPoint,
        color: Color,
    },
}

/// Records draw calls in order
#[derive(Debug, Default)]
pub struct RecordingDraw {
    pub calls: Vec<DrawCall>,
}

impl RecordingDraw {
    pub fn texts(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DrawCall::Text { text, .. } => Some(text.as_str()),
                DrawCall::Handle { .. } => None,
            })
            .collect()
    }

    pub fn handle_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, DrawCall::Handle { .. }))
            .count()
    }
}

impl DrawContext for RecordingDraw {
    fn draw_handle(&mut self, center: CanvasPoint, radius: f64, color: Color) {
        self.calls.push(DrawCall::Handle {
            center,
            radius,
            color,
        });
    }

    fn draw_text_box(&mut self, text: &str, at: CanvasPoint, color: Color) {
        self.calls.push(DrawCall::Text {
            text: text.to_string(),
            at,
            color,
        });
    }
}

/// Metadata with an identity plane for every image
pub struct StaticMetadata;

impl MetadataProvider for StaticMetadata {
    fn patient_name(&self, _image_id: &str) -> Option<String> {
        Some("Case-001".to_string())
    }

    fn image_plane(&self, _image_id: &str) -> Option<ImagePlane> {
        Some(ImagePlane {
            image_position_patient: [0.0, 0.0, 0.0],
            row_cosines: [1.0, 0.0, 0.0],
            column_cosines: [0.0, 1.0, 0.0],
            row_pixel_spacing: 1.0,
            column_pixel_spacing: 1.0,
        })
    }
}

type Gate = Receiver<RiskResult<PredictionResponse>>;

enum Script {
    Answer(String),
    Fail(RiskError),
    Gated(Mutex<HashMap<i64, Gate>>),
}

/// Prediction service with canned answers
///
/// Gated services block each request until the test releases the gate keyed
/// by the request's patient x coordinate.
pub struct ScriptedService {
    script: Script,
}

impl ScriptedService {
    pub fn answering(description: &str) -> Arc<Self> {
        Arc::new(Self {
            script: Script::Answer(description.to_string()),
        })
    }

    pub fn failing(err: RiskError) -> Arc<Self> {
        Arc::new(Self {
            script: Script::Fail(err),
        })
    }

    pub fn gated(keys: &[i64]) -> (Arc<Self>, HashMap<i64, Sender<RiskResult<PredictionResponse>>>) {
        let mut gates = HashMap::new();
        let mut senders = HashMap::new();
        for key in keys {
            let (tx, rx) = mpsc::channel();
            gates.insert(*key, rx);
            senders.insert(*key, tx);
        }
        let service = Arc::new(Self {
            script: Script::Gated(Mutex::new(gates)),
        });
        (service, senders)
    }
}

impl PredictionService for ScriptedService {
    fn predict(&self, request: &PredictionRequest) -> RiskResult<PredictionResponse> {
        match &self.script {
            Script::Answer(description) => Ok(PredictionResponse::new(description.as_str())),
            Script::Fail(err) => Err(err.clone()),
            Script::Gated(gates) => {
                let gate = gates.lock().unwrap().remove(&(request.lps[0] as i64));
                match gate {
                    Some(gate) => gate.recv().map_err(|_| RiskError::WorkerLost)?,
                    None => Err(RiskError::Network("no gate for request".to_string())),
                }
            }
        }
    }
}

pub fn estimator(service: Arc<ScriptedService>, config: &ProbeToolConfig) -> RiskEstimator<MarkerKey> {
    RiskEstimator::new(service, Arc::new(StaticMetadata), &config.prediction)
}

pub fn controller(service: Arc<ScriptedService>, config: &ProbeToolConfig) -> InteractionController {
    InteractionController::new(config, Arc::new(IdentityTransform), estimator(service, config))
}
