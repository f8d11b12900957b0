use crate::shared::face_result::FaceResult;
use crate::shared::frame_stamp::FrameStamp;

/// Per-face record of every processed frame.
///
/// Implementations must leave a valid log behind after each call, since the
/// process may be interrupted between frames.
pub trait TrackingLog: Send {
    fn write_frame(
        &mut self,
        stamp: &FrameStamp,
        faces: &[FaceResult],
    ) -> Result<(), Box<dyn std::error::Error>>;
}
