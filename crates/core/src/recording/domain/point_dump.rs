use crate::shared::face_result::Point3;

/// Destination for the symmetrized 3D point set written at shutdown.
pub trait PointDump: Send {
    fn write(&mut self, points: &[Point3]) -> Result<(), Box<dyn std::error::Error>>;
}
