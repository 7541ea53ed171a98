//! Services the host viewer provides to the probe tool

use crate::geometry::{CanvasPoint, Color, ImagePoint};
use crate::store::SurfaceId;

/// Conversion between image and canvas space for a surface
pub trait CanvasTransform {
    fn pixel_to_canvas(&self, surface: SurfaceId, point: ImagePoint) -> CanvasPoint;

    fn canvas_to_pixel(&self, surface: SurfaceId, point: CanvasPoint) -> ImagePoint;
}

/// Read access to the pixels of the image on a surface
pub trait PixelSource {
    /// Stored values of a `width` x `height` block, row-major
    fn stored_pixels(&self, surface: SurfaceId, x: i64, y: i64, width: u32, height: u32)
        -> Vec<i32>;

    /// Interleaved RGB bytes of a `width` x `height` block, row-major
    fn rgb_pixels(&self, surface: SurfaceId, x: i64, y: i64, width: u32, height: u32) -> Vec<u8>;
}

/// Drawing primitives in canvas space
pub trait DrawContext {
    fn draw_handle(&mut self, center: CanvasPoint, radius: f64, color: Color);

    fn draw_text_box(&mut self, text: &str, at: CanvasPoint, color: Color);
}

/// Description of the image currently shown on a surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    /// Host identifier of the image
    pub image_id: String,

    /// Width in pixels
    pub columns: u32,

    /// Height in pixels
    pub rows: u32,

    /// Whether pixels are RGB rather than stored values
    pub color: bool,
}

impl ImageInfo {
    pub fn new(image_id: impl Into<String>, columns: u32, rows: u32) -> Self {
        Self {
            image_id: image_id.into(),
            columns,
            rows,
            color: false,
        }
    }

    /// Mark the image as RGB
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Check if an integer pixel lies inside `[0, columns) x [0, rows)`
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < i64::from(self.columns) && y < i64::from(self.rows)
    }
}
