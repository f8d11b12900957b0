use std::path::Path;

use thiserror::Error;

use crate::shared::frame::Frame;
use crate::video::domain::frame_source::FrameSource;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to open capture source {uri}: {source}")]
    Open {
        uri: String,
        #[source]
        source: ffmpeg_next::Error,
    },
    #[error("no video stream in {0}")]
    NoVideoStream(String),
    #[error("capture input format {0} is not available in this ffmpeg build")]
    MissingDeviceFormat(&'static str),
    #[error("failed to set up decoder for {uri}: {source}")]
    Decoder {
        uri: String,
        #[source]
        source: ffmpeg_next::Error,
    },
}

/// Decodes frames from a video file or a capture device via ffmpeg-next.
///
/// Each decoded frame is converted to RGB24. A source that fails to open is
/// still constructed; it just reports itself closed.
pub struct FfmpegFrameSource {
    decode: Option<DecodeState>,
    closes_at_end: bool,
}

// Safety: FfmpegFrameSource is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegFrameSource {}

impl FfmpegFrameSource {
    /// Opens a video file. End of file leaves the source open with reads
    /// failing, the same way file readers behave in most capture stacks.
    pub fn open_file(path: &Path) -> Self {
        let uri = path.display().to_string();
        let state = open_input(path).and_then(|ictx| DecodeState::new(ictx, &uri));
        Self::from_state(state, &uri, false)
    }

    /// Opens capture device `index` through the platform's ffmpeg input device.
    /// A device that stops delivering frames is treated as closed.
    pub fn open_device(index: u32, width: u32, height: u32, fps: u32) -> Self {
        let (format_name, url) = device_input(index);
        let state = open_device_input(format_name, &url, width, height, fps)
            .and_then(|ictx| DecodeState::new(ictx, &url));
        Self::from_state(state, &url, true)
    }

    fn from_state(state: Result<DecodeState, CaptureError>, uri: &str, closes_at_end: bool) -> Self {
        let decode = match state {
            Ok(state) => {
                log::debug!("Opened capture source {uri}");
                Some(state)
            }
            Err(e) => {
                log::warn!("{e}");
                None
            }
        };
        Self {
            decode,
            closes_at_end,
        }
    }
}

impl FrameSource for FfmpegFrameSource {
    fn is_open(&self) -> bool {
        self.decode.is_some()
    }

    fn is_ready(&self) -> bool {
        self.decode.is_some()
    }

    fn read(&mut self) -> Option<Frame> {
        let state = self.decode.as_mut()?;
        match state.next_frame() {
            Ok(Some(frame)) => Some(frame),
            Ok(None) => {
                if self.closes_at_end {
                    self.close();
                }
                None
            }
            Err(e) => {
                log::warn!("Frame decode failed: {e}");
                if self.closes_at_end {
                    self.close();
                }
                None
            }
        }
    }

    fn close(&mut self) {
        self.decode = None;
    }
}

fn open_input(path: &Path) -> Result<ffmpeg_next::format::context::Input, CaptureError> {
    let uri = path.display().to_string();
    ffmpeg_next::init().map_err(|source| CaptureError::Open {
        uri: uri.clone(),
        source,
    })?;
    ffmpeg_next::format::input(path).map_err(|source| CaptureError::Open { uri, source })
}

fn open_device_input(
    format_name: &'static str,
    url: &str,
    width: u32,
    height: u32,
    fps: u32,
) -> Result<ffmpeg_next::format::context::Input, CaptureError> {
    ffmpeg_next::init().map_err(|source| CaptureError::Open {
        uri: url.to_string(),
        source,
    })?;
    ffmpeg_next::device::register_all();

    let format = ffmpeg_next::device::input::video()
        .find(|f| f.name() == format_name)
        .ok_or(CaptureError::MissingDeviceFormat(format_name))?;

    let mut options = ffmpeg_next::Dictionary::new();
    options.set("video_size", &format!("{width}x{height}"));
    if fps > 0 {
        options.set("framerate", &fps.to_string());
    }

    let context = ffmpeg_next::format::open_with(
        url,
        &ffmpeg_next::format::format::Format::Input(format),
        options,
    )
    .map_err(|source| CaptureError::Open {
        uri: url.to_string(),
        source,
    })?;

    match context {
        ffmpeg_next::format::context::Context::Input(input) => Ok(input),
        _ => Err(CaptureError::NoVideoStream(url.to_string())),
    }
}

#[cfg(target_os = "macos")]
fn device_input(index: u32) -> (&'static str, String) {
    ("avfoundation", index.to_string())
}

#[cfg(target_os = "windows")]
fn device_input(index: u32) -> (&'static str, String) {
    ("dshow", format!("video={index}"))
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn device_input(index: u32) -> (&'static str, String) {
    ("video4linux2", format!("/dev/video{index}"))
}

/// Decoder state for one opened input. Frames are pulled on demand instead
/// of through an iterator because the caller polls one frame per loop turn.
struct DecodeState {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: Option<ffmpeg_next::software::scaling::Context>,
    video_stream_index: usize,
    flushing: bool,
    done: bool,
}

impl DecodeState {
    fn new(ictx: ffmpeg_next::format::context::Input, uri: &str) -> Result<Self, CaptureError> {
        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| CaptureError::NoVideoStream(uri.to_string()))?;
        let video_stream_index = stream.index();

        let decoder = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
            .and_then(|ctx| ctx.decoder().video())
            .map_err(|source| CaptureError::Decoder {
                uri: uri.to_string(),
                source,
            })?;

        Ok(Self {
            ictx,
            decoder,
            scaler: None,
            video_stream_index,
            flushing: false,
            done: false,
        })
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, ffmpeg_next::Error> {
        if self.done {
            return Ok(None);
        }

        if let Some(frame) = self.try_receive()? {
            return Ok(Some(frame));
        }

        if self.flushing {
            self.done = true;
            return Ok(None);
        }

        loop {
            let Some((stream, packet)) = self.ictx.packets().next() else {
                let _ = self.decoder.send_eof();
                self.flushing = true;
                if let Some(frame) = self.try_receive()? {
                    return Ok(Some(frame));
                }
                self.done = true;
                return Ok(None);
            };

            if stream.index() != self.video_stream_index {
                continue;
            }

            if self.decoder.send_packet(&packet).is_err() {
                continue;
            }

            if let Some(frame) = self.try_receive()? {
                return Ok(Some(frame));
            }
        }
    }

    fn try_receive(&mut self) -> Result<Option<Frame>, ffmpeg_next::Error> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }

        let width = decoded.width();
        let height = decoded.height();

        // Devices may only settle on a pixel format once frames arrive.
        if self.scaler.is_none() {
            self.scaler = Some(ffmpeg_next::software::scaling::Context::get(
                decoded.format(),
                width,
                height,
                ffmpeg_next::format::Pixel::RGB24,
                width,
                height,
                ffmpeg_next::software::scaling::Flags::BILINEAR,
            )?);
        }
        let scaler = self.scaler.as_mut().ok_or(ffmpeg_next::Error::Bug)?;

        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
        scaler.run(&decoded, &mut rgb_frame)?;

        let pixels = extract_rgb_pixels(&rgb_frame, width, height);
        Ok(Some(Frame::new(pixels, width, height, 0)))
    }
}

/// Copies pixel data out of an ffmpeg frame, dropping per-row stride padding.
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let row_bytes = width as usize * 3;

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + row_bytes]);
    }
    pixels
}
