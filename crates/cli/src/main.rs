use std::fs::File;
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::{ArgAction, Parser};

use facestream_core::pipeline::clock::{Clock, SystemClock};
use facestream_core::pipeline::pacer::Pacer;
use facestream_core::pipeline::pipeline_logger::{
    NullPipelineLogger, PipelineLogger, StdoutPipelineLogger,
};
use facestream_core::pipeline::source_supervisor::{SourceSupervisor, SupervisorConfig};
use facestream_core::pipeline::stream_faces_use_case::{StreamFacesUseCase, StreamSettings};
use facestream_core::recording::domain::overlay_plan::MAX_VISUALIZE_LEVEL;
use facestream_core::recording::infrastructure::csv_tracking_log::CsvTrackingLog;
use facestream_core::recording::infrastructure::glyph_painter::GlyphPainter;
use facestream_core::recording::infrastructure::json_point_dump::JsonPointDump;
use facestream_core::shared::constants::{
    DEFAULT_POLL_BACKOFF_MS, DEFAULT_REINIT_BACKOFF_MS, DEFAULT_TARGET_IP, DEFAULT_TARGET_PORT,
    MAX_TRANSMITTED_FACES,
};
use facestream_core::shared::record_layout::RecordLayout;
use facestream_core::telemetry::infrastructure::udp_transport::UdpTransport;
use facestream_core::tracking::domain::tracking_engine::EngineConfig;
use facestream_core::tracking::infrastructure::log_replay_engine::LogReplayEngineFactory;
use facestream_core::video::domain::frame_source::SourceKind;
use facestream_core::video::infrastructure::capture_factory::{
    CaptureConfig, CaptureFactory, CaptureTarget,
};
use facestream_core::video::infrastructure::ffmpeg_writer::FfmpegWriter;

/// Streams face tracking results over UDP.
#[derive(Parser)]
#[command(name = "facestream")]
struct Cli {
    /// IP address tracking data is sent to.
    #[arg(short, long, default_value = DEFAULT_TARGET_IP)]
    ip: String,

    /// Port tracking data is sent to.
    #[arg(short, long, default_value_t = DEFAULT_TARGET_PORT)]
    port: u16,

    /// Camera index (0, 1, ...) or video file.
    #[arg(short, long, default_value = "0")]
    capture: String,

    /// Read raw RGB24 frames of --width x --height from stdin.
    #[arg(long)]
    raw_rgb: bool,

    /// Camera and raw RGB width.
    #[arg(short = 'W', long, default_value_t = 640)]
    width: u32,

    /// Camera and raw RGB height.
    #[arg(short = 'H', long, default_value_t = 360)]
    height: u32,

    /// Camera frames per second. Video files are never paced.
    #[arg(short = 'F', long, default_value_t = 24)]
    fps: u32,

    /// Maximum number of tracking threads.
    #[arg(short, long, default_value_t = 1)]
    max_threads: usize,

    /// Minimum confidence for face detection (0.0-1.0).
    #[arg(short, long, default_value_t = 0.65)]
    threshold: f32,

    /// Maximum number of tracked faces.
    #[arg(long, default_value_t = 1)]
    faces: usize,

    /// Frames between scans for new faces.
    #[arg(long, default_value_t = 3)]
    scan_every: usize,

    /// Frames a lost face is searched for.
    #[arg(long, default_value_t = 10)]
    discard_after: usize,

    /// Overlay level of --video-out: 1 points, 2 face ids, 3 confidence, 4 point numbers.
    #[arg(short, long, default_value_t = 0)]
    visualize: u8,

    /// No per-face console output.
    #[arg(short, long)]
    silent: bool,

    /// Save the visualization as a video (FFV1, e.g. an .avi file).
    #[arg(long)]
    video_out: Option<PathBuf>,

    /// Log tracking data to this CSV file.
    #[arg(long)]
    log_data: Option<PathBuf>,

    /// Write the symmetrized 3D points of the last face here on Ctrl+C.
    #[arg(long)]
    dump_points: Option<PathBuf>,

    /// Loop a video file until interrupted.
    #[arg(long)]
    repeat_video: bool,

    /// Added to all face ids.
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    face_id_offset: i32,

    /// Eye landmarks and gaze points (68 landmarks / 70 points instead of 66 / 66).
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    gaze_tracking: bool,

    /// Tracking engine: replay faces from a CSV log written with --log-data.
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Pause after reopening the capture source, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_REINIT_BACKOFF_MS)]
    reinit_backoff_ms: u64,

    /// Pause while the capture source warms up, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_POLL_BACKOFF_MS)]
    poll_backoff_ms: u64,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    if cli.faces >= MAX_TRANSMITTED_FACES {
        log::info!(
            "Transmission of tracking data over network is not supported with {MAX_TRANSMITTED_FACES} or more faces."
        );
    }

    let cancelled = Arc::new(AtomicBool::new(false));
    if let Err(err) = ctrlc::set_handler({
        let cancelled = Arc::clone(&cancelled);
        move || {
            cancelled.store(true, Ordering::SeqCst);
        }
    }) {
        log::warn!("Failed to install Ctrl+C handler: {err}");
    }

    let layout = RecordLayout::for_gaze_tracking(cli.gaze_tracking);
    let replay = cli
        .replay
        .as_deref()
        .ok_or("No tracking engine available; pass --replay <log.csv>")?;
    let engine_factory = LogReplayEngineFactory::open(replay)?;
    let transport = UdpTransport::new(&cli.ip, cli.port)?;

    let target = CaptureTarget::parse(&cli.capture, cli.raw_rgb);
    let frame_interval = match target.kind() {
        SourceKind::File => Duration::ZERO,
        SourceKind::Camera | SourceKind::RawStream => Pacer::interval_for_fps(cli.fps as f64),
    };
    let factory = CaptureFactory::new(CaptureConfig {
        target,
        width: cli.width,
        height: cli.height,
        fps: cli.fps,
    });

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let supervisor = SourceSupervisor::new(
        Box::new(factory),
        Arc::clone(&clock),
        SupervisorConfig {
            repeat: cli.repeat_video,
            reinit_backoff: Duration::from_millis(cli.reinit_backoff_ms),
            poll_backoff: Duration::from_millis(cli.poll_backoff_ms),
        },
    );

    let logger: Box<dyn PipelineLogger> = if cli.silent {
        Box::new(NullPipelineLogger)
    } else {
        Box::new(StdoutPipelineLogger::new())
    };

    let settings = StreamSettings {
        engine: EngineConfig {
            threshold: cli.threshold,
            max_threads: cli.max_threads,
            max_faces: cli.faces,
            discard_after: cli.discard_after,
            scan_every: cli.scan_every,
            gaze_tracking: cli.gaze_tracking,
            ..EngineConfig::default()
        },
        layout,
        face_id_offset: cli.face_id_offset,
        visualize: cli.visualize,
        frame_interval,
    };

    let mut use_case = StreamFacesUseCase::new(
        supervisor,
        Box::new(engine_factory),
        Box::new(transport),
        logger,
        clock,
        settings,
    )
    .with_cancel_flag(cancelled);

    if let Some(tracking_log) = open_tracking_log(&cli, layout)? {
        use_case = use_case.with_tracking_log(Box::new(tracking_log));
    }
    if let Some(path) = &cli.video_out {
        use_case = use_case.with_video_output(
            Box::new(FfmpegWriter::new()),
            path,
            Box::new(GlyphPainter::new()),
        );
    }
    if let Some(path) = &cli.dump_points {
        use_case = use_case.with_point_dump(Box::new(JsonPointDump::new(path)));
    }

    let report = use_case.execute()?;
    log::info!(
        "Processed {} frames, sent {} packets ({} failed, {} suppressed, {} source reinits){}",
        report.frames,
        report.packets_sent,
        report.send_failures,
        report.suppressed_frames,
        report.reinits,
        if report.interrupted { ", interrupted" } else { "" }
    );
    Ok(())
}

/// The log records the configured rate for every source, paced or not.
fn open_tracking_log(
    cli: &Cli,
    layout: RecordLayout,
) -> Result<Option<CsvTrackingLog<File>>, Box<dyn std::error::Error>> {
    cli.log_data
        .as_deref()
        .map(|path| CsvTrackingLog::create(path, layout, cli.fps))
        .transpose()
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.width == 0 || cli.height == 0 {
        return Err(format!(
            "Width and height must be positive, got {}x{}",
            cli.width, cli.height
        )
        .into());
    }
    if !(0.0..=1.0).contains(&cli.threshold) {
        return Err(format!(
            "Threshold must be between 0.0 and 1.0, got {}",
            cli.threshold
        )
        .into());
    }
    if cli.max_threads == 0 {
        return Err("Max threads must be at least 1".into());
    }
    if cli.faces == 0 {
        return Err("Faces must be at least 1".into());
    }
    if cli.scan_every == 0 {
        return Err("Scan every must be at least 1".into());
    }
    if cli.visualize > MAX_VISUALIZE_LEVEL {
        return Err(format!(
            "Visualize must be between 0 and {MAX_VISUALIZE_LEVEL}, got {}",
            cli.visualize
        )
        .into());
    }
    if let Some(replay) = &cli.replay {
        if !replay.exists() {
            return Err(format!("Replay log not found: {}", replay.display()).into());
        }
    }
    Ok(())
}
