use std::path::PathBuf;

use crate::video::domain::frame_source::{FrameSource, FrameSourceFactory, SourceKind};

use super::ffmpeg_frame_source::FfmpegFrameSource;
use super::raw_rgb_frame_source::RawRgbFrameSource;

/// Where frames come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptureTarget {
    Camera(u32),
    File(PathBuf),
    /// Raw RGB24 frames on stdin.
    RawStdin,
}

impl CaptureTarget {
    /// An integer selects a camera index, anything else is a video file path.
    pub fn parse(capture: &str, raw_rgb: bool) -> Self {
        if raw_rgb {
            return CaptureTarget::RawStdin;
        }
        match capture.trim().parse::<u32>() {
            Ok(index) => CaptureTarget::Camera(index),
            Err(_) => CaptureTarget::File(PathBuf::from(capture)),
        }
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            CaptureTarget::Camera(_) => SourceKind::Camera,
            CaptureTarget::File(_) => SourceKind::File,
            CaptureTarget::RawStdin => SourceKind::RawStream,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CaptureConfig {
    pub target: CaptureTarget,
    pub width: u32,
    pub height: u32,
    /// Requested device frame rate; 0 leaves the device default.
    pub fps: u32,
}

/// Opens a fresh source for the configured target on every call.
pub struct CaptureFactory {
    config: CaptureConfig,
}

impl CaptureFactory {
    pub fn new(config: CaptureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }
}

impl FrameSourceFactory for CaptureFactory {
    fn open(&self) -> Box<dyn FrameSource> {
        let c = &self.config;
        match &c.target {
            CaptureTarget::Camera(index) => Box::new(FfmpegFrameSource::open_device(
                *index, c.width, c.height, c.fps,
            )),
            CaptureTarget::File(path) => Box::new(FfmpegFrameSource::open_file(path)),
            CaptureTarget::RawStdin => {
                Box::new(RawRgbFrameSource::new(std::io::stdin(), c.width, c.height))
            }
        }
    }

    fn kind(&self) -> SourceKind {
        self.config.target.kind()
    }
}
