//! Declared landmark counts of a tracking session.
//!
//! Telemetry records carry no length prefix, so producer and consumer must
//! agree on these counts up front.

use crate::shared::constants::{BASE_LANDMARK_COUNT, FEATURE_NAMES};

/// Bytes before the per-landmark arrays: timestamp, id, size, blinks,
/// success flag, fit error, quaternion, euler angles and translation.
pub const RECORD_HEADER_SIZE: usize = 8 + 4 + 2 * 4 + 2 * 4 + 1 + 4 + 4 * 4 + 3 * 4 + 3 * 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordLayout {
    pub landmarks: usize,
    pub points: usize,
}

impl RecordLayout {
    /// Gaze tracking on: two eye landmarks and two extra model points.
    pub const GAZE: RecordLayout = RecordLayout {
        landmarks: BASE_LANDMARK_COUNT + 2,
        points: BASE_LANDMARK_COUNT + 4,
    };

    pub const NO_GAZE: RecordLayout = RecordLayout {
        landmarks: BASE_LANDMARK_COUNT,
        points: BASE_LANDMARK_COUNT,
    };

    pub fn new(landmarks: usize, points: usize) -> Self {
        Self { landmarks, points }
    }

    pub fn for_gaze_tracking(enabled: bool) -> Self {
        if enabled {
            Self::GAZE
        } else {
            Self::NO_GAZE
        }
    }

    /// Exact byte width of one face record.
    pub fn record_size(&self) -> usize {
        RECORD_HEADER_SIZE
            + self.landmarks * 4
            + self.landmarks * 2 * 4
            + self.points * 3 * 4
            + FEATURE_NAMES.len() * 4
    }
}

impl Default for RecordLayout {
    fn default() -> Self {
        Self::GAZE
    }
}
