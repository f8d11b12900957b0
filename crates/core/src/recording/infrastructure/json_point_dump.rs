use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::recording::domain::point_dump::PointDump;
use crate::shared::face_result::Point3;

/// Writes points as a pretty-printed JSON array of `[x, y, z]` arrays.
///
/// serde_json prints the shortest text that reads back to the same float,
/// so nothing is lost.
pub struct JsonPointDump {
    path: PathBuf,
}

impl JsonPointDump {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PointDump for JsonPointDump {
    fn write(&mut self, points: &[Point3]) -> Result<(), Box<dyn std::error::Error>> {
        let file = File::create(&self.path)
            .map_err(|e| format!("cannot create {}: {e}", self.path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, points)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        log::info!("Wrote {} points to {}", points.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_read_back_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.json");
        let points: Vec<Point3> = vec![
            [0.1, -0.2, 1.0 / 3.0],
            [123.456_79, 0.0, -7.5e-8],
        ];

        JsonPointDump::new(&path).write(&points).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let back: Vec<Point3> = serde_json::from_str(&text).unwrap();
        assert_eq!(back, points);
    }

    #[test]
    fn test_output_is_pretty_printed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.json");
        JsonPointDump::new(&path).write(&[[1.0, 2.0, 3.0]]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("[\n"));
        assert!(text.lines().count() > 1);
    }

    #[test]
    fn test_unwritable_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("points.json");
        assert!(JsonPointDump::new(&path).write(&[]).is_err());
    }
}
