use std::io::Read;

use crate::shared::frame::{Frame, CHANNELS};
use crate::video::domain::frame_source::FrameSource;

/// Reads headerless RGB24 frames of a fixed size from a byte stream
/// (typically stdin fed by another process).
///
/// A short read ends the stream and closes the source.
pub struct RawRgbFrameSource<R> {
    reader: Option<R>,
    width: u32,
    height: u32,
}

impl<R: Read + Send> RawRgbFrameSource<R> {
    pub fn new(reader: R, width: u32, height: u32) -> Self {
        Self {
            reader: Some(reader),
            width,
            height,
        }
    }

    fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize * CHANNELS
    }
}

impl<R: Read + Send> FrameSource for RawRgbFrameSource<R> {
    fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    fn is_ready(&self) -> bool {
        self.reader.is_some()
    }

    fn read(&mut self) -> Option<Frame> {
        let len = self.frame_len();
        let reader = self.reader.as_mut()?;
        let mut data = vec![0u8; len];
        match reader.read_exact(&mut data) {
            Ok(()) => Some(Frame::new(data, self.width, self.height, 0)),
            Err(e) => {
                log::debug!("Raw RGB stream ended: {e}");
                self.close();
                None
            }
        }
    }

    fn close(&mut self) {
        self.reader = None;
    }
}
