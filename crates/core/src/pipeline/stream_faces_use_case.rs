use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::recording::domain::frame_painter::FramePainter;
use crate::recording::domain::overlay_plan::OverlayPlan;
use crate::recording::domain::point_dump::PointDump;
use crate::recording::domain::tracking_log::TrackingLog;
use crate::shared::constants::VIDEO_OUT_FPS;
use crate::shared::face_result::{FaceResult, Point3};
use crate::shared::frame::Frame;
use crate::shared::frame_stamp::FrameStamp;
use crate::shared::record_layout::RecordLayout;
use crate::shared::video_metadata::VideoMetadata;
use crate::telemetry::domain::packet_encoder::TelemetryEncoder;
use crate::telemetry::domain::transport::TelemetryTransport;
use crate::tracking::domain::symmetrizer::symmetrize;
use crate::tracking::domain::tracking_engine::{EngineConfig, TrackingEngine, TrackingEngineFactory};
use crate::video::domain::video_writer::VideoWriter;

use super::clock::Clock;
use super::pacer::Pacer;
use super::pipeline_logger::{PipelineLogger, PER_FACE_TRACKING_STAGE};
use super::source_supervisor::{SourcePoll, SourceSupervisor};

#[derive(Clone, Debug, PartialEq)]
pub struct StreamSettings {
    pub engine: EngineConfig,
    pub layout: RecordLayout,
    /// Added to every face id before any output sees it.
    pub face_id_offset: i32,
    /// Overlay level for the recorded video (0-4).
    pub visualize: u8,
    /// Minimum time per iteration; zero runs unpaced.
    pub frame_interval: Duration,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            layout: RecordLayout::default(),
            face_id_offset: 0,
            visualize: 0,
            frame_interval: Duration::ZERO,
        }
    }
}

/// What happened during one run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StreamReport {
    /// Frames handed to the tracking engine.
    pub frames: usize,
    pub packets_sent: usize,
    /// Packets the transport refused, e.g. datagrams over the size limit.
    pub send_failures: usize,
    /// Frames with faces that were not transmitted (too many faces).
    pub suppressed_frames: usize,
    pub reinits: usize,
    /// Stopped by the cancel flag rather than by the source ending.
    pub interrupted: bool,
}

struct VideoOutput {
    writer: Box<dyn VideoWriter>,
    path: PathBuf,
    painter: Box<dyn FramePainter>,
    opened: bool,
}

/// The streaming main loop: poll the source, track, transmit, record, pace.
///
/// Runs until the source finishes or the cancel flag is set. A cancelled run
/// finishes the frame in progress, then dumps the symmetrized points of the
/// last tracked face if a dump is configured.
pub struct StreamFacesUseCase {
    supervisor: SourceSupervisor,
    engine_factory: Box<dyn TrackingEngineFactory>,
    engine: Option<Box<dyn TrackingEngine>>,
    encoder: TelemetryEncoder,
    transport: Box<dyn TelemetryTransport>,
    logger: Box<dyn PipelineLogger>,
    tracking_log: Option<Box<dyn TrackingLog>>,
    video: Option<VideoOutput>,
    point_dump: Option<Box<dyn PointDump>>,
    pacer: Pacer,
    settings: StreamSettings,
    cancelled: Arc<AtomicBool>,
    last_points: Option<Vec<Point3>>,
}

impl StreamFacesUseCase {
    pub fn new(
        supervisor: SourceSupervisor,
        engine_factory: Box<dyn TrackingEngineFactory>,
        transport: Box<dyn TelemetryTransport>,
        logger: Box<dyn PipelineLogger>,
        clock: Arc<dyn Clock>,
        settings: StreamSettings,
    ) -> Self {
        Self {
            supervisor,
            engine_factory,
            engine: None,
            encoder: TelemetryEncoder::new(settings.layout),
            transport,
            logger,
            tracking_log: None,
            video: None,
            point_dump: None,
            pacer: Pacer::new(clock, settings.frame_interval),
            settings,
            cancelled: Arc::new(AtomicBool::new(false)),
            last_points: None,
        }
    }

    pub fn with_tracking_log(mut self, log: Box<dyn TrackingLog>) -> Self {
        self.tracking_log = Some(log);
        self
    }

    /// The writer is opened on the first frame, once the size is known.
    pub fn with_video_output(
        mut self,
        writer: Box<dyn VideoWriter>,
        path: &Path,
        painter: Box<dyn FramePainter>,
    ) -> Self {
        self.video = Some(VideoOutput {
            writer,
            path: path.to_path_buf(),
            painter,
            opened: false,
        });
        self
    }

    pub fn with_point_dump(mut self, dump: Box<dyn PointDump>) -> Self {
        self.point_dump = Some(dump);
        self
    }

    pub fn with_cancel_flag(mut self, cancelled: Arc<AtomicBool>) -> Self {
        self.cancelled = cancelled;
        self
    }

    pub fn execute(&mut self) -> Result<StreamReport, Box<dyn std::error::Error>> {
        let mut report = StreamReport::default();
        let outcome = self.run_loop(&mut report);
        let shutdown = self.shutdown(&mut report);
        outcome?;
        shutdown?;
        Ok(report)
    }

    fn run_loop(&mut self, report: &mut StreamReport) -> Result<(), Box<dyn std::error::Error>> {
        loop {
            if self.cancelled.load(Ordering::SeqCst) {
                report.interrupted = true;
                return Ok(());
            }
            match self.supervisor.poll() {
                SourcePoll::Finished => return Ok(()),
                SourcePoll::Idle => continue,
                SourcePoll::Frame(frame) => self.process_frame(frame, report)?,
            }
            self.pacer.wait();
        }
    }

    fn process_frame(
        &mut self,
        mut frame: Frame,
        report: &mut StreamReport,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let (width, height) = frame.dimensions();
        let stamp = FrameStamp::now(frame.index(), width, height);
        if self.engine.is_none() {
            self.start_session(width, height)?;
        }

        let faces = self.track(&frame);
        for face in &faces {
            self.logger.face_status(face);
        }

        let t0 = Instant::now();
        match self.encoder.encode_frame(&stamp, &faces) {
            Some(packet) => match self.transport.send(&packet) {
                Ok(()) => report.packets_sent += 1,
                Err(e) => {
                    if report.send_failures == 0 {
                        log::warn!(
                            "Sending {} bytes of tracking data for {} faces failed: {e}",
                            packet.len(),
                            faces.len()
                        );
                    } else {
                        log::debug!("Telemetry send failed: {e}");
                    }
                    report.send_failures += 1;
                }
            },
            None if !faces.is_empty() => report.suppressed_frames += 1,
            None => {}
        }
        self.logger.timing("send", elapsed_ms(t0));

        if let Some(tracking_log) = self.tracking_log.as_mut() {
            tracking_log.write_frame(&stamp, &faces)?;
        }

        if let Some(video) = self.video.as_mut() {
            let t0 = Instant::now();
            // Recorded video always shows landmarks.
            let plan = OverlayPlan::for_faces(&faces, self.settings.visualize.max(1));
            video.painter.paint(&mut frame, &plan);
            video.writer.write(&frame)?;
            self.logger.timing("video", elapsed_ms(t0));
        }

        if let Some(first) = faces.first() {
            self.last_points = Some(first.points_3d.clone());
        }
        report.frames += 1;
        self.logger.frame(frame.index());
        Ok(())
    }

    /// Creates the engine and opens the video writer for the session's frame size.
    fn start_session(&mut self, width: u32, height: u32) -> Result<(), Box<dyn std::error::Error>> {
        let config = self.settings.engine.for_frame_size(width, height);
        self.engine = Some(self.engine_factory.create(&config)?);
        log::debug!("Tracking engine ready for {width}x{height} frames");

        if let Some(video) = self.video.as_mut() {
            let metadata = VideoMetadata::new(width, height, VIDEO_OUT_FPS);
            video.writer.open(&video.path, &metadata)?;
            video.opened = true;
        }
        Ok(())
    }

    /// Runs the engine; a failing engine counts as a frame without faces.
    fn track(&mut self, frame: &Frame) -> Vec<FaceResult> {
        let Some(engine) = self.engine.as_mut() else {
            return Vec::new();
        };
        let t0 = Instant::now();
        let faces = match engine.predict(frame) {
            Ok(faces) => faces,
            Err(e) => {
                log::warn!("Tracking failed on frame {}: {e}", frame.index());
                Vec::new()
            }
        };
        let duration_ms = elapsed_ms(t0);
        self.logger.timing("track", duration_ms);
        self.logger.metric("faces", faces.len() as f64);
        if !faces.is_empty() {
            self.logger
                .timing(PER_FACE_TRACKING_STAGE, duration_ms / faces.len() as f64);
        }

        let offset = self.settings.face_id_offset;
        faces.into_iter().map(|face| face.normalized(offset)).collect()
    }

    fn shutdown(&mut self, report: &mut StreamReport) -> Result<(), Box<dyn std::error::Error>> {
        report.reinits = self.supervisor.reinit_count();
        self.supervisor.close();

        if report.interrupted {
            self.logger.info("Quitting");
            self.dump_points();
        }

        self.logger.summary();

        if let Some(video) = self.video.as_mut() {
            if video.opened {
                video.writer.close()?;
            }
        }
        Ok(())
    }

    fn dump_points(&mut self) {
        let (Some(dump), Some(points)) = (self.point_dump.as_mut(), self.last_points.take()) else {
            return;
        };
        let mut points = points;
        if let Err(e) = symmetrize(&mut points) {
            log::warn!("Not dumping points: {e}");
            return;
        }
        if let Err(e) = dump.write(&points) {
            log::warn!("Failed to dump points: {e}");
        }
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
