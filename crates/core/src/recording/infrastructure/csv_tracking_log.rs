use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::{StringRecord, Terminator, WriterBuilder};

use crate::recording::domain::tracking_log::TrackingLog;
use crate::shared::constants::FEATURE_NAMES;
use crate::shared::face_result::FaceResult;
use crate::shared::frame_stamp::FrameStamp;
use crate::shared::record_layout::RecordLayout;

const FIXED_COLUMNS: [&str; 25] = [
    "Frame",
    "Time",
    "Width",
    "Height",
    "FPS",
    "Face",
    "FaceID",
    "RightOpen",
    "LeftOpen",
    "AverageConfidence",
    "Success3D",
    "PnPError",
    "RotationQuat.X",
    "RotationQuat.Y",
    "RotationQuat.Z",
    "RotationQuat.W",
    "Euler.X",
    "Euler.Y",
    "Euler.Z",
    "RVec.X",
    "RVec.Y",
    "RVec.Z",
    "TVec.X",
    "TVec.Y",
    "TVec.Z",
];

/// Column names of a log written with `layout`.
pub fn header_columns(layout: &RecordLayout) -> Vec<String> {
    let mut columns: Vec<String> = FIXED_COLUMNS.iter().map(|c| c.to_string()).collect();
    for i in 0..layout.landmarks {
        for axis in ["X", "Y", "Confidence"] {
            columns.push(format!("Landmark[{i}].{axis}"));
        }
    }
    for i in 0..layout.points {
        for axis in ["X", "Y", "Z"] {
            columns.push(format!("Point3D[{i}].{axis}"));
        }
    }
    columns.extend(FEATURE_NAMES.iter().map(|f| f.to_string()));
    columns
}

/// CSV log with one row per face per frame, CRLF line endings.
///
/// The `Frame` column counts frames from 1 (`FrameStamp::index + 1`).
/// Landmarks are written in `(y, x)` order and 3D points as `(x, -y, -z)`,
/// the same convention as telemetry packets.
pub struct CsvTrackingLog<W: Write + Send> {
    writer: csv::Writer<W>,
    layout: RecordLayout,
    fps: u32,
    record: StringRecord,
}

impl CsvTrackingLog<File> {
    pub fn create(
        path: &Path,
        layout: RecordLayout,
        fps: u32,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let file = File::create(path)
            .map_err(|e| format!("cannot create log {}: {e}", path.display()))?;
        let log = Self::new(file, layout, fps)?;
        log::info!("Logging tracking data to {}", path.display());
        Ok(log)
    }
}

impl<W: Write + Send> CsvTrackingLog<W> {
    /// Writes the header line immediately.
    pub fn new(writer: W, layout: RecordLayout, fps: u32) -> Result<Self, csv::Error> {
        let mut writer = WriterBuilder::new()
            .terminator(Terminator::CRLF)
            .from_writer(writer);
        writer.write_record(header_columns(&layout))?;
        writer.flush()?;
        Ok(Self {
            writer,
            layout,
            fps,
            record: StringRecord::new(),
        })
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(self) -> std::io::Result<W> {
        self.writer.into_inner().map_err(|e| e.into_error())
    }

    fn fill_record(&mut self, stamp: &FrameStamp, face_num: usize, face: &FaceResult) {
        let record = &mut self.record;
        record.clear();
        let mut push = |value: &dyn std::fmt::Display| record.push_field(&value.to_string());

        let [right, left] = face.eye_openness();
        push(&(stamp.index + 1));
        push(&stamp.timestamp);
        push(&stamp.width);
        push(&stamp.height);
        push(&self.fps);
        push(&face_num);
        push(&face.id);
        push(&right);
        push(&left);
        push(&face.confidence);
        push(&if face.success { "True" } else { "False" });
        push(&face.pnp_error);
        for value in face
            .quaternion
            .iter()
            .chain(&face.euler)
            .chain(&face.rotation)
            .chain(&face.translation)
        {
            push(value);
        }
        for i in 0..self.layout.landmarks {
            let [y, x, c] = face
                .landmarks
                .get(i)
                .map_or([0.0; 3], |lm| [lm.y, lm.x, lm.confidence]);
            push(&y);
            push(&x);
            push(&c);
        }
        for i in 0..self.layout.points {
            let [x, y, z] = face.points_3d.get(i).map_or([0.0; 3], |&[x, y, z]| [x, -y, -z]);
            push(&x);
            push(&y);
            push(&z);
        }
        for value in face.feature_values() {
            push(&value);
        }
    }
}

impl<W: Write + Send> TrackingLog for CsvTrackingLog<W> {
    fn write_frame(
        &mut self,
        stamp: &FrameStamp,
        faces: &[FaceResult],
    ) -> Result<(), Box<dyn std::error::Error>> {
        for (face_num, face) in faces.iter().enumerate() {
            self.fill_record(stamp, face_num, face);
            self.writer.write_record(&self.record)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
