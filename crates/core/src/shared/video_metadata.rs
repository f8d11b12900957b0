/// Stream properties handed to a [`VideoWriter`](crate::video::domain::video_writer::VideoWriter).
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

impl VideoMetadata {
    pub fn new(width: u32, height: u32, fps: f64) -> Self {
        Self {
            width,
            height,
            fps,
        }
    }

    /// Integer frame rate used for encoder time bases; non-positive rates fall back to 30.
    pub fn timebase_fps(&self) -> i32 {
        let fps = self.fps.round() as i32;
        if fps <= 0 {
            30
        } else {
            fps
        }
    }
}
