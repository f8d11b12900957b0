use std::collections::HashMap;
use std::time::Instant;

use crate::shared::face_result::FaceResult;
use crate::tracking::domain::eye_state::eye_states;

/// Timing stage holding engine time divided by the number of faces found.
pub const PER_FACE_TRACKING_STAGE: &str = "track_per_face";

/// Cross-cutting logger for pipeline orchestration events.
///
/// Decouples the streaming use case from specific output mechanisms so the
/// binary can choose between console output and silence.
pub trait PipelineLogger: Send {
    /// Called once per processed frame.
    fn frame(&mut self, index: usize);

    /// Report the status of one tracked face.
    fn face_status(&mut self, face: &FaceResult);

    /// Record how long a named pipeline stage took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. face count).
    fn metric(&mut self, name: &str, value: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-pipeline summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events.
///
/// Used for `--silent` and by tests where logger output is irrelevant.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn frame(&mut self, _index: usize) {}
    fn face_status(&mut self, _face: &FaceResult) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// One console line per tracked face.
pub fn face_status_line(face: &FaceResult) -> String {
    let (right, left) = eye_states(face);
    format!(
        "Confidence[{}]: {:.4} / 3D fitting error: {:.4} / Eyes: {}, {}",
        face.id,
        face.confidence,
        face.pnp_error,
        left.symbol(),
        right.symbol()
    )
}

/// Console logger that tracks per-stage timing and metrics, and reports
/// a summary when the stream ends.
pub struct StdoutPipelineLogger {
    timings: HashMap<String, Vec<f64>>,
    metrics: HashMap<String, Vec<f64>>,
    start_time: Instant,
    total_frames: usize,
    messages: Vec<String>,
}

impl StdoutPipelineLogger {
    pub fn new() -> Self {
        Self {
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            total_frames: 0,
            messages: Vec::new(),
        }
    }

    /// Mean engine time per detected face, over frames that had faces.
    pub fn average_tracking_ms(&self) -> Option<f64> {
        let values = self.timings.get(PER_FACE_TRACKING_STAGE)?;
        if values.is_empty() {
            return None;
        }
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }

    /// Returns the formatted summary string, or `None` if no data recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let frames = self.total_frames;
        let mut lines = Vec::new();

        lines.push(format!(
            "Pipeline summary ({frames} frames, {:.1}s total):",
            elapsed_ms / 1000.0
        ));

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = if durations.is_empty() {
                0.0
            } else {
                total_ms / durations.len() as f64
            };
            lines.push(format!(
                "  {stage:14}: avg {avg_ms:6.1}ms  total {total_ms:7.0}ms"
            ));
        }

        let mut metric_names: Vec<_> = self.metrics.keys().collect();
        metric_names.sort();
        for name in metric_names {
            let values = &self.metrics[name];
            let avg = if values.is_empty() {
                0.0
            } else {
                values.iter().sum::<f64>() / values.len() as f64
            };
            lines.push(format!("  {name}: avg {avg:.1}"));
        }

        if frames > 0 && elapsed_ms > 0.0 {
            let fps = frames as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {fps:.1} fps"));
        }

        if let Some(avg) = self.average_tracking_ms() {
            lines.push(format!(
                "Average tracking time per detected face: {avg:.2} ms"
            ));
        }

        Some(lines.join("\n"))
    }

    /// Returns the timing data for a given stage.
    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    /// Returns the metric data for a given name.
    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn frame(&mut self, index: usize) {
        self.total_frames = self.total_frames.max(index + 1);
    }

    fn face_status(&mut self, face: &FaceResult) {
        log::info!("{}", face_status_line(face));
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics
            .entry(name.to_string())
            .or_default()
            .push(value);
    }

    fn info(&mut self, message: &str) {
        self.messages.push(message.to_string());
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // --- NullPipelineLogger tests ---

    #[test]
    fn test_null_logger_all_methods_are_noop() {
        let mut logger = NullPipelineLogger;
        logger.frame(0);
        logger.face_status(&FaceResult::default());
        logger.timing("track", 5.0);
        logger.metric("faces", 3.0);
        logger.info("hello");
        logger.summary();
        // No panics = success
    }

    // --- face status line ---

    #[test]
    fn test_face_status_line_format() {
        let face = FaceResult {
            id: 2,
            confidence: 0.912_345,
            pnp_error: 12.5,
            eye_blink: Some([0.5, 0.1]),
            ..Default::default()
        };
        assert_eq!(
            face_status_line(&face),
            "Confidence[2]: 0.9123 / 3D fitting error: 12.5000 / Eyes: -, O"
        );
    }

    #[test]
    fn test_face_status_line_defaults_to_open_eyes() {
        let line = face_status_line(&FaceResult::default());
        assert!(line.ends_with("Eyes: O, O"));
    }

    // --- StdoutPipelineLogger tests ---

    #[test]
    fn test_timing_records_values() {
        let mut logger = StdoutPipelineLogger::new();
        logger.timing("track", 20.0);
        logger.timing("track", 30.0);
        logger.timing("encode", 5.0);

        let track = logger.timings_for("track").unwrap();
        assert_eq!(track.len(), 2);
        assert_relative_eq!(track[0], 20.0);
        assert_relative_eq!(track[1], 30.0);

        let encode = logger.timings_for("encode").unwrap();
        assert_eq!(encode.len(), 1);
    }

    #[test]
    fn test_metric_records_values() {
        let mut logger = StdoutPipelineLogger::new();
        logger.metric("faces", 3.0);
        logger.metric("faces", 4.0);

        let values = logger.metrics_for("faces").unwrap();
        assert_eq!(values.len(), 2);
        let avg = values.iter().sum::<f64>() / values.len() as f64;
        assert_relative_eq!(avg, 3.5);
    }

    #[test]
    fn test_summary_includes_timing_and_metrics() {
        let mut logger = StdoutPipelineLogger::new();
        logger.frame(9);
        logger.timing("track", 20.0);
        logger.metric("faces", 3.0);
        logger.metric("faces", 4.0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("Pipeline summary (10 frames"));
        assert!(summary.contains("track"));
        assert!(summary.contains("faces: avg 3.5"));
        assert!(summary.contains("fps"));
    }

    #[test]
    fn test_summary_reports_per_face_tracking_time() {
        let mut logger = StdoutPipelineLogger::new();
        logger.timing(PER_FACE_TRACKING_STAGE, 10.0);
        logger.timing(PER_FACE_TRACKING_STAGE, 20.0);

        assert_relative_eq!(logger.average_tracking_ms().unwrap(), 15.0);
        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("Average tracking time per detected face: 15.00 ms"));
    }

    #[test]
    fn test_no_faces_means_no_tracking_average() {
        let mut logger = StdoutPipelineLogger::new();
        logger.timing("track", 1.0);
        assert!(logger.average_tracking_ms().is_none());
        assert!(!logger
            .summary_string()
            .unwrap()
            .contains("Average tracking time"));
    }

    #[test]
    fn test_empty_summary_returns_none() {
        let logger = StdoutPipelineLogger::new();
        assert!(logger.summary_string().is_none());
    }

    #[test]
    fn test_frame_counts_highest_index() {
        let mut logger = StdoutPipelineLogger::new();
        for i in 0..20 {
            logger.frame(i);
        }
        assert_eq!(logger.total_frames, 20);
    }

    #[test]
    fn test_info_stores_messages() {
        let mut logger = StdoutPipelineLogger::new();
        logger.info("hello world");
        assert_eq!(logger.messages.len(), 1);
        assert_eq!(logger.messages[0], "hello world");
    }
}
