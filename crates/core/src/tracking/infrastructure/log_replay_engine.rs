//! Tracking engine that replays a previously written CSV tracking log.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use csv::{ReaderBuilder, StringRecord};
use thiserror::Error;

use crate::shared::constants::FEATURE_NAMES;
use crate::shared::face_result::{BoundingBox, FaceResult, Landmark, Point3};
use crate::shared::frame::Frame;
use crate::tracking::domain::tracking_engine::{EngineConfig, TrackingEngine, TrackingEngineFactory};

#[derive(Debug, Error)]
pub enum LogReplayError {
    #[error("cannot read tracking log: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed tracking log: {0}")]
    Csv(#[from] csv::Error),
    #[error("tracking log is empty")]
    Empty,
    #[error("tracking log has no {0} column")]
    MissingColumn(String),
    #[error("line {line}: bad value {value:?} in column {column}")]
    BadValue {
        line: u64,
        column: String,
        value: String,
    },
}

type FrameFaces = HashMap<usize, Vec<FaceResult>>;

/// Column positions resolved from the header record.
struct Columns {
    index: HashMap<String, usize>,
    landmarks: usize,
    points: usize,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self, LogReplayError> {
        let index: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, name)| (name.to_string(), i))
            .collect();
        let count = |prefix: &str| headers.iter().filter(|n| n.starts_with(prefix)).count() / 3;

        let columns = Self {
            landmarks: count("Landmark["),
            points: count("Point3D["),
            index,
        };
        for required in ["Frame", "FaceID", "Success3D"] {
            columns.position(required)?;
        }
        Ok(columns)
    }

    fn position(&self, name: &str) -> Result<usize, LogReplayError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| LogReplayError::MissingColumn(name.to_string()))
    }
}

/// One data record being decoded.
struct Row<'a> {
    line: u64,
    record: &'a StringRecord,
    columns: &'a Columns,
}

impl<'a> Row<'a> {
    fn raw(&self, column: &str) -> Result<&'a str, LogReplayError> {
        let position = self.columns.position(column)?;
        Ok(self.record.get(position).unwrap_or_default())
    }

    fn bad_value(&self, column: &str, value: &str) -> LogReplayError {
        LogReplayError::BadValue {
            line: self.line,
            column: column.to_string(),
            value: value.to_string(),
        }
    }

    fn parse<T: std::str::FromStr>(&self, column: &str) -> Result<T, LogReplayError> {
        let value = self.raw(column)?;
        value.trim().parse().map_err(|_| self.bad_value(column, value))
    }

    fn f32(&self, column: &str) -> Result<f32, LogReplayError> {
        self.parse(column)
    }

    /// Features are optional; absent columns read as 0.
    fn optional_f32(&self, column: &str) -> Result<f32, LogReplayError> {
        match self.columns.index.get(column) {
            Some(_) => self.f32(column),
            None => Ok(0.0),
        }
    }

    fn bool(&self, column: &str) -> Result<bool, LogReplayError> {
        match self.raw(column)?.trim() {
            "True" | "true" | "1" => Ok(true),
            "False" | "false" | "0" => Ok(false),
            other => Err(self.bad_value(column, other)),
        }
    }

    fn face(&self) -> Result<FaceResult, LogReplayError> {
        let triple = |prefix: &str, axes: [&str; 3]| -> Result<[f32; 3], LogReplayError> {
            Ok([
                self.f32(&format!("{prefix}.{}", axes[0]))?,
                self.f32(&format!("{prefix}.{}", axes[1]))?,
                self.f32(&format!("{prefix}.{}", axes[2]))?,
            ])
        };

        // The log stores landmarks as (y, x) and points as (x, -y, -z).
        let landmarks = (0..self.columns.landmarks)
            .map(|i| {
                let [y, x, c] = triple(&format!("Landmark[{i}]"), ["X", "Y", "Confidence"])?;
                Ok(Landmark::new(x, y, c))
            })
            .collect::<Result<Vec<_>, LogReplayError>>()?;
        let points_3d = (0..self.columns.points)
            .map(|i| {
                let [x, y, z] = triple(&format!("Point3D[{i}]"), ["X", "Y", "Z"])?;
                Ok([x, -y, -z])
            })
            .collect::<Result<Vec<Point3>, LogReplayError>>()?;
        let features = FEATURE_NAMES
            .iter()
            .map(|name| Ok((name.to_string(), self.optional_f32(name)?)))
            .collect::<Result<HashMap<_, _>, LogReplayError>>()?;

        let bbox = landmark_bounds(&landmarks);
        Ok(FaceResult {
            id: self.parse("FaceID")?,
            confidence: self.optional_f32("AverageConfidence")?,
            success: self.bool("Success3D")?,
            pnp_error: self.optional_f32("PnPError")?,
            eye_blink: Some([
                self.optional_f32("RightOpen")?,
                self.optional_f32("LeftOpen")?,
            ]),
            quaternion: [
                self.optional_f32("RotationQuat.X")?,
                self.optional_f32("RotationQuat.Y")?,
                self.optional_f32("RotationQuat.Z")?,
                self.optional_f32("RotationQuat.W")?,
            ],
            euler: triple("Euler", ["X", "Y", "Z"])?,
            rotation: triple("RVec", ["X", "Y", "Z"])?,
            translation: triple("TVec", ["X", "Y", "Z"])?,
            landmarks,
            points_3d,
            features,
            bbox,
        })
    }
}

/// Axis-aligned box around the landmarks; zero-sized when there are none.
fn landmark_bounds(landmarks: &[Landmark]) -> BoundingBox {
    if landmarks.is_empty() {
        return BoundingBox::default();
    }
    let (mut min_row, mut max_row) = (f32::MAX, f32::MIN);
    let (mut min_col, mut max_col) = (f32::MAX, f32::MIN);
    for lm in landmarks {
        min_row = min_row.min(lm.x);
        max_row = max_row.max(lm.x);
        min_col = min_col.min(lm.y);
        max_col = max_col.max(lm.y);
    }
    BoundingBox {
        x: min_col,
        y: min_row,
        width: max_col - min_col,
        height: max_row - min_row,
    }
}

/// Parses a tracking log into faces keyed by frame index.
///
/// Every record must have as many fields as the header.
pub fn read_tracking_log<R: Read>(reader: R) -> Result<FrameFaces, LogReplayError> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(reader);
    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Err(LogReplayError::Empty);
    }
    let columns = Columns::from_headers(&headers)?;

    let mut frames: FrameFaces = HashMap::new();
    let mut record = StringRecord::new();
    while reader.read_record(&mut record)? {
        let row = Row {
            line: record.position().map_or(0, |p| p.line()),
            record: &record,
            columns: &columns,
        };
        // Frame numbers in the log start at 1.
        let number: usize = row.parse("Frame")?;
        let index = number
            .checked_sub(1)
            .ok_or_else(|| row.bad_value("Frame", &number.to_string()))?;
        let face = row.face()?;
        frames.entry(index).or_default().push(face);
    }
    Ok(frames)
}

/// Returns the logged faces of the frame with the same index, and no faces
/// for frames the log does not cover.
pub struct LogReplayEngine {
    frames: Arc<FrameFaces>,
}

impl LogReplayEngine {
    pub fn new(frames: Arc<FrameFaces>) -> Self {
        Self { frames }
    }
}

impl TrackingEngine for LogReplayEngine {
    fn predict(&mut self, frame: &Frame) -> Result<Vec<FaceResult>, Box<dyn std::error::Error>> {
        Ok(self.frames.get(&frame.index()).cloned().unwrap_or_default())
    }
}

pub struct LogReplayEngineFactory {
    frames: Arc<FrameFaces>,
}

impl LogReplayEngineFactory {
    /// Reads the whole log up front so a malformed file fails at startup.
    pub fn open(path: &Path) -> Result<Self, LogReplayError> {
        let file = std::fs::File::open(path)?;
        let frames = read_tracking_log(file)?;
        log::info!(
            "Loaded {} logged frames from {}",
            frames.len(),
            path.display()
        );
        Ok(Self {
            frames: Arc::new(frames),
        })
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

impl TrackingEngineFactory for LogReplayEngineFactory {
    fn create(
        &self,
        config: &EngineConfig,
    ) -> Result<Box<dyn TrackingEngine>, Box<dyn std::error::Error>> {
        log::debug!(
            "Replaying tracking log for {}x{} frames",
            config.frame_width,
            config.frame_height
        );
        Ok(Box::new(LogReplayEngine::new(Arc::clone(&self.frames))))
    }
}
