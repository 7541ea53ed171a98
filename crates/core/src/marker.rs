//! Probe marker data model
//!
//! A marker is a single user-placed point on an image. Its anchor is fixed at
//! creation; everything else on it is derived state that the interaction
//! controller and render pipeline refresh.

use crate::geometry::{Color, ImagePoint};

/// Unique identifier for a marker
///
/// Stable for the marker's lifetime. Used to route asynchronous results back
/// to the marker, never shown to the user.
pub type MarkerId = uuid::Uuid;

/// Raw pixel values read under a marker
#[derive(Debug, Clone, PartialEq)]
pub enum PixelValues {
    /// Stored (modality) values for grayscale images
    Stored(Vec<i32>),
    /// Interleaved RGB bytes for color images
    Rgb(Vec<u8>),
}

/// Cached pixel statistics for a marker
#[derive(Debug, Clone, PartialEq)]
pub enum PixelStats {
    /// The rounded anchor was outside the image
    OutOfBounds,
    /// Values read at the rounded anchor
    Sampled {
        x: i64,
        y: i64,
        stored_pixels: PixelValues,
    },
}

impl PixelStats {
    /// Integer pixel position, if sampled
    pub fn position(&self) -> Option<(i64, i64)> {
        match self {
            PixelStats::OutOfBounds => None,
            PixelStats::Sampled { x, y, .. } => Some((*x, *y)),
        }
    }

    /// Pixel values, if sampled
    pub fn stored_pixels(&self) -> Option<&PixelValues> {
        match self {
            PixelStats::OutOfBounds => None,
            PixelStats::Sampled { stored_pixels, .. } => Some(stored_pixels),
        }
    }

    pub fn is_sampled(&self) -> bool {
        matches!(self, PixelStats::Sampled { .. })
    }
}

/// A probe marker
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    /// Stable unique identifier
    id: MarkerId,

    /// Display index, 0 until assigned
    fid: u32,

    /// Image-space anchor (immutable)
    anchor: ImagePoint,

    /// Hidden markers are skipped by hit-testing and rendering
    visible: bool,

    /// Drawn with the active color
    active: bool,

    /// Explicit color, overrides active/inactive styling
    color: Option<Color>,

    /// Set by a confirmed pointer-down, consumed by the next pointer-move
    dragging: bool,

    /// Cached stats must be recomputed before next use
    invalidated: bool,

    /// Cached stats, `None` until first computed
    stats: Option<PixelStats>,

    /// Short risk description shown next to the marker
    risk_label: String,
}

impl Marker {
    /// Create a new marker at `anchor`
    pub fn new(anchor: ImagePoint, risk_label: impl Into<String>) -> Self {
        Self {
            id: MarkerId::new_v4(),
            fid: 0,
            anchor,
            visible: true,
            active: true,
            color: None,
            dragging: false,
            invalidated: true,
            stats: None,
            risk_label: risk_label.into(),
        }
    }

    /// Get the marker ID
    pub fn id(&self) -> MarkerId {
        self.id
    }

    /// Get the display index (0 = unassigned)
    pub fn fid(&self) -> u32 {
        self.fid
    }

    pub(crate) fn set_fid(&mut self, fid: u32) {
        self.fid = fid;
    }

    /// Get the anchor point
    pub fn anchor(&self) -> ImagePoint {
        self.anchor
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn color(&self) -> Option<Color> {
        self.color
    }

    pub fn set_color(&mut self, color: Option<Color>) {
        self.color = color;
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub(crate) fn set_dragging(&mut self, dragging: bool) {
        self.dragging = dragging;
    }

    pub fn is_invalidated(&self) -> bool {
        self.invalidated
    }

    /// Mark cached stats as stale
    pub fn invalidate(&mut self) {
        self.invalidated = true;
    }

    /// Cached stats, if computed
    pub fn stats(&self) -> Option<&PixelStats> {
        self.stats.as_ref()
    }

    /// Store fresh stats and clear the invalidated flag
    pub(crate) fn set_stats(&mut self, stats: PixelStats) {
        self.stats = Some(stats);
        self.invalidated = false;
    }

    pub fn risk_label(&self) -> &str {
        &self.risk_label
    }

    pub(crate) fn set_risk_label(&mut self, label: impl Into<String>) {
        self.risk_label = label.into();
    }
}
