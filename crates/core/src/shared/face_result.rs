use std::collections::HashMap;

use crate::shared::constants::FEATURE_NAMES;

/// A 3D landmark `(x, y, z)` in the tracker's model space.
pub type Point3 = [f32; 3];

/// A 2D landmark in the tracker's image-indexed convention: `x` is the row
/// (vertical) coordinate and `y` the column.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub confidence: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, confidence: f32) -> Self {
        Self { x, y, confidence }
    }
}

/// Face bounds in image coordinates (`x` is the column of the left edge).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Everything the tracking engine reports about one face in one frame.
///
/// Failed pose fits still carry the full schema; the engine zeroes the pose
/// fields instead of leaving them out.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FaceResult {
    /// Stable across frames for the same tracked face.
    pub id: i32,
    pub confidence: f32,
    /// Whether the 3D pose fit succeeded.
    pub success: bool,
    pub pnp_error: f32,
    /// Eye openness `[right, left]` in `[0, 1]`. `None` when gaze tracking is off.
    pub eye_blink: Option<[f32; 2]>,
    pub quaternion: [f32; 4],
    pub euler: [f32; 3],
    pub translation: [f32; 3],
    /// Raw rotation vector; only written to the CSV log.
    pub rotation: [f32; 3],
    pub landmarks: Vec<Landmark>,
    /// Same indexing as `landmarks`.
    pub points_3d: Vec<Point3>,
    pub features: HashMap<String, f32>,
    pub bbox: BoundingBox,
}

impl FaceResult {
    /// Eye openness with absent blink data treated as fully open.
    pub fn eye_openness(&self) -> [f32; 2] {
        self.eye_blink.unwrap_or([1.0, 1.0])
    }

    pub fn feature(&self, name: &str) -> f32 {
        self.features.get(name).copied().unwrap_or(0.0)
    }

    /// Feature values in wire order.
    pub fn feature_values(&self) -> impl Iterator<Item = f32> + '_ {
        FEATURE_NAMES.iter().map(move |name| self.feature(name))
    }

    /// Applies the configured id offset and fills in default eye openness, so
    /// every sink sees the same values.
    pub fn normalized(mut self, id_offset: i32) -> Self {
        self.id = self.id.wrapping_add(id_offset);
        self.eye_blink = Some(self.eye_openness());
        self
    }
}
