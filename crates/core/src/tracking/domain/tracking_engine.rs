use crate::shared::face_result::FaceResult;
use crate::shared::frame::Frame;

/// Settings handed to the engine at construction.
///
/// Thread counts and similar knobs travel here explicitly rather than
/// through process-wide environment variables.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    pub frame_width: u32,
    pub frame_height: u32,
    /// Minimum detection confidence.
    pub threshold: f32,
    pub max_threads: usize,
    pub max_faces: usize,
    /// Frames a lost face is searched for before it is dropped.
    pub discard_after: usize,
    /// Frames between scans for additional faces.
    pub scan_every: usize,
    pub gaze_tracking: bool,
}

impl EngineConfig {
    pub fn for_frame_size(&self, width: u32, height: u32) -> Self {
        Self {
            frame_width: width,
            frame_height: height,
            ..self.clone()
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frame_width: 0,
            frame_height: 0,
            threshold: 0.65,
            max_threads: 1,
            max_faces: 1,
            discard_after: 10,
            scan_every: 3,
            gaze_tracking: true,
        }
    }
}

/// Face tracker boundary.
///
/// `predict` is synchronous: any worker threads the engine runs internally
/// have been joined into one consistent result set before it returns.
/// Results come back in detection order.
pub trait TrackingEngine: Send {
    fn predict(&mut self, frame: &Frame) -> Result<Vec<FaceResult>, Box<dyn std::error::Error>>;
}

/// Engines need the frame size, so they are built once the first frame arrives.
pub trait TrackingEngineFactory: Send {
    fn create(
        &self,
        config: &EngineConfig,
    ) -> Result<Box<dyn TrackingEngine>, Box<dyn std::error::Error>>;
}
