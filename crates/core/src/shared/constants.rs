pub const DEFAULT_TARGET_IP: &str = "127.0.0.1";
pub const DEFAULT_TARGET_PORT: u16 = 11573;

/// Frames with this many faces or more are never transmitted. Consumers size
/// their per-packet face tables on this limit, so raising it breaks the wire.
pub const MAX_TRANSMITTED_FACES: usize = 40;

/// Eye openness above this value counts as open.
pub const EYE_OPEN_THRESHOLD: f32 = 0.30;

/// Landmarks every tracker emits; gaze tracking appends one point per eye.
pub const BASE_LANDMARK_COUNT: usize = 66;
pub const RIGHT_EYE_LANDMARK: usize = 66;
pub const LEFT_EYE_LANDMARK: usize = 67;

/// Expression features in wire order. Missing features encode as 0.
pub const FEATURE_NAMES: [&str; 14] = [
    "eye_l",
    "eye_r",
    "eyebrow_steepness_l",
    "eyebrow_updown_l",
    "eyebrow_quirk_l",
    "eyebrow_steepness_r",
    "eyebrow_updown_r",
    "eyebrow_quirk_r",
    "mouth_corner_updown_l",
    "mouth_corner_inout_l",
    "mouth_corner_updown_r",
    "mouth_corner_inout_r",
    "mouth_open",
    "mouth_wide",
];

pub const DEFAULT_REINIT_BACKOFF_MS: u64 = 1;
pub const DEFAULT_POLL_BACKOFF_MS: u64 = 1;

/// Frame rate written into recorded preview videos.
pub const VIDEO_OUT_FPS: f64 = 24.0;
