//! Image-space to patient-space projection
//!
//! Image points are in pixel units of the displayed image. Patient points are
//! in millimetres in the patient (LPS) coordinate system described by the
//! image plane metadata.

/// Floating-point coordinate in image pixel space
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct ImagePoint {
    pub x: f64,
    pub y: f64,
}

impl ImagePoint {
    /// Create a new image point
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Translate by a delta in image units
    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Round to the integer pixel under this point
    ///
    /// Halves round towards positive infinity.
    pub fn rounded(&self) -> (i64, i64) {
        ((self.x + 0.5).floor() as i64, (self.y + 0.5).floor() as i64)
    }
}

/// Point in patient space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PatientPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl PatientPoint {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Components as an `[x, y, z]` array
    pub fn to_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

/// Orientation and spacing of an image slice in patient space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImagePlane {
    /// Patient position of the centre of the first transmitted pixel
    pub image_position_patient: [f64; 3],

    /// Direction cosines of the first row
    pub row_cosines: [f64; 3],

    /// Direction cosines of the first column
    pub column_cosines: [f64; 3],

    /// Distance between rows (mm)
    pub row_pixel_spacing: f64,

    /// Distance between columns (mm)
    pub column_pixel_spacing: f64,
}

/// Source of per-image metadata
///
/// Implemented by the host's metadata layer.
pub trait MetadataProvider {
    /// Patient (case) name for the image
    fn patient_name(&self, image_id: &str) -> Option<String>;

    /// Image plane description for the image
    fn image_plane(&self, image_id: &str) -> Option<ImagePlane>;
}

/// Project an image point into patient space
///
/// x advances along the row direction by column spacing, y advances along the
/// column direction by row spacing.
pub fn image_point_to_patient_point(point: ImagePoint, plane: &ImagePlane) -> PatientPoint {
    let along_row = point.x * plane.column_pixel_spacing;
    let along_column = point.y * plane.row_pixel_spacing;

    let mut out = [0.0; 3];
    for (axis, value) in out.iter_mut().enumerate() {
        *value = plane.image_position_patient[axis]
            + plane.row_cosines[axis] * along_row
            + plane.column_cosines[axis] * along_column;
    }

    PatientPoint::new(out[0], out[1], out[2])
}
