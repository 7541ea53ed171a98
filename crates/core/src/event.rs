//! Typed pointer events and per-frame context

use crate::geometry::{CanvasPoint, ImagePoint};
use crate::host::{CanvasTransform, ImageInfo};
use crate::store::SurfaceId;
use std::time::Instant;

/// Pointer input delivered by the host
#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    /// Surface the pointer is over
    pub surface: SurfaceId,

    /// Image displayed on that surface
    pub image_id: String,

    /// Pointer position in canvas space
    pub canvas: CanvasPoint,

    /// Pointer position in image space, if the host resolved it
    pub image: Option<ImagePoint>,
}

impl PointerEvent {
    /// Create an event with both canvas and image coordinates
    pub fn new(
        surface: SurfaceId,
        image_id: impl Into<String>,
        canvas: CanvasPoint,
        image: ImagePoint,
    ) -> Self {
        Self {
            surface,
            image_id: image_id.into(),
            canvas,
            image: Some(image),
        }
    }

    /// Create an event carrying only canvas coordinates
    pub fn canvas_only(surface: SurfaceId, image_id: impl Into<String>, canvas: CanvasPoint) -> Self {
        Self {
            surface,
            image_id: image_id.into(),
            canvas,
            image: None,
        }
    }

    /// Create an event, deriving image coordinates through `transform`
    pub fn from_canvas(
        surface: SurfaceId,
        image_id: impl Into<String>,
        canvas: CanvasPoint,
        transform: &dyn CanvasTransform,
    ) -> Self {
        let image = transform.canvas_to_pixel(surface, canvas);
        Self::new(surface, image_id, canvas, image)
    }
}

/// Context for rendering one frame of one surface
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub surface: SurfaceId,
    pub image: &'a ImageInfo,
    pub now: Instant,
}

impl<'a> Frame<'a> {
    pub fn new(surface: SurfaceId, image: &'a ImageInfo, now: Instant) -> Self {
        Self {
            surface,
            image,
            now,
        }
    }
}
