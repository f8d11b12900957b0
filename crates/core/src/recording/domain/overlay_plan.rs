//! What gets drawn for a face at a given visualization level.
//!
//! Levels add up: 1 draws landmark points, 2 adds the face id, 3 the
//! confidence, 4 the landmark indices.

use crate::shared::constants::BASE_LANDMARK_COUNT;
use crate::shared::face_result::FaceResult;
use crate::tracking::domain::eye_state::is_landmark_renderable;

pub const MAX_VISUALIZE_LEVEL: u8 = 4;

/// RGB colors of the overlay elements.
pub const LANDMARK_COLOR: [u8; 3] = [255, 0, 0];
pub const EYE_LANDMARK_COLOR: [u8; 3] = [0, 255, 255];
pub const ID_LABEL_COLOR: [u8; 3] = [255, 0, 255];
pub const CONFIDENCE_LABEL_COLOR: [u8; 3] = [0, 255, 0];
pub const INDEX_LABEL_COLOR: [u8; 3] = [0, 255, 255];

/// Offset of the confidence label from the bounding box corner, `(col, row)`.
const CONFIDENCE_LABEL_OFFSET: (i64, i64) = (18, -6);

#[derive(Clone, Debug, PartialEq)]
pub enum OverlayMark {
    /// A 2x2 square whose top-left pixel is `(row, col)`.
    Point { row: i64, col: i64, color: [u8; 3] },
    /// Text whose baseline starts at `(row, col)`.
    Label {
        row: i64,
        col: i64,
        text: String,
        color: [u8; 3],
    },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct OverlayPlan {
    pub marks: Vec<OverlayMark>,
}

impl OverlayPlan {
    pub fn for_face(face: &FaceResult, level: u8) -> Self {
        let mut marks = Vec::new();
        if level == 0 {
            return Self { marks };
        }

        let corner_col = face.bbox.x as i64;
        let corner_row = face.bbox.y as i64;
        if level >= 2 {
            marks.push(OverlayMark::Label {
                row: corner_row,
                col: corner_col,
                text: face.id.to_string(),
                color: ID_LABEL_COLOR,
            });
        }
        if level >= 3 {
            let (dc, dr) = CONFIDENCE_LABEL_OFFSET;
            marks.push(OverlayMark::Label {
                row: corner_row + dr,
                col: corner_col + dc,
                text: format!("{:.4}", face.confidence),
                color: CONFIDENCE_LABEL_COLOR,
            });
        }

        let openness = face.eye_openness();
        for (index, landmark) in face.landmarks.iter().enumerate() {
            if !is_landmark_renderable(index, openness) {
                continue;
            }
            // Rounds half up, truncating toward zero.
            let row = (landmark.x + 0.5) as i64;
            let col = (landmark.y + 0.5) as i64;
            if level >= 4 {
                marks.push(OverlayMark::Label {
                    row,
                    col,
                    text: index.to_string(),
                    color: INDEX_LABEL_COLOR,
                });
            }
            let color = if index >= BASE_LANDMARK_COUNT {
                EYE_LANDMARK_COLOR
            } else {
                LANDMARK_COLOR
            };
            marks.push(OverlayMark::Point { row, col, color });
        }

        Self { marks }
    }

    /// Concatenates the plans of several faces.
    pub fn for_faces(faces: &[FaceResult], level: u8) -> Self {
        let marks = faces
            .iter()
            .flat_map(|face| Self::for_face(face, level).marks)
            .collect();
        Self { marks }
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = (i64, i64, [u8; 3])> + '_ {
        self.marks.iter().filter_map(|mark| match *mark {
            OverlayMark::Point { row, col, color } => Some((row, col, color)),
            _ => None,
        })
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.marks.iter().filter_map(|mark| match mark {
            OverlayMark::Label { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::face_result::{BoundingBox, Landmark};
    use rstest::rstest;

    fn face(blink: Option<[f32; 2]>) -> FaceResult {
        FaceResult {
            id: 3,
            confidence: 0.87654,
            eye_blink: blink,
            landmarks: (0..68)
                .map(|i| Landmark::new(10.0 + i as f32, 20.0 + i as f32, 0.9))
                .collect(),
            bbox: BoundingBox {
                x: 5.0,
                y: 40.0,
                width: 100.0,
                height: 100.0,
            },
            ..Default::default()
        }
    }

    #[rstest]
    #[case(0, 0, 0)]
    #[case(1, 68, 0)]
    #[case(2, 68, 1)]
    #[case(3, 68, 2)]
    #[case(4, 68, 70)]
    fn test_levels_are_cumulative(
        #[case] level: u8,
        #[case] points: usize,
        #[case] labels: usize,
    ) {
        let plan = OverlayPlan::for_face(&face(None), level);
        assert_eq!(plan.points().count(), points);
        assert_eq!(plan.labels().count(), labels);
    }

    #[test]
    fn test_closed_eye_landmark_is_not_drawn() {
        let plan = OverlayPlan::for_face(&face(Some([0.5, 0.1])), 1);
        let points: Vec<_> = plan.points().collect();
        assert_eq!(points.len(), 67);

        // Landmark 66 (right eye, open) is present, 67 (left eye, closed) is not.
        assert!(points.contains(&(76, 86, EYE_LANDMARK_COLOR)));
        assert!(!points.contains(&(77, 87, EYE_LANDMARK_COLOR)));
    }

    #[test]
    fn test_point_colors() {
        let plan = OverlayPlan::for_face(&face(None), 1);
        let points: Vec<_> = plan.points().collect();
        assert_eq!(points[0], (10, 20, LANDMARK_COLOR));
        assert_eq!(points[65].2, LANDMARK_COLOR);
        assert_eq!(points[66].2, EYE_LANDMARK_COLOR);
        assert_eq!(points[67].2, EYE_LANDMARK_COLOR);
    }

    #[test]
    fn test_labels_positions_and_text() {
        let plan = OverlayPlan::for_face(&face(None), 3);
        assert_eq!(
            plan.marks[0],
            OverlayMark::Label {
                row: 40,
                col: 5,
                text: "3".to_string(),
                color: ID_LABEL_COLOR,
            }
        );
        assert_eq!(
            plan.marks[1],
            OverlayMark::Label {
                row: 34,
                col: 23,
                text: "0.8765".to_string(),
                color: CONFIDENCE_LABEL_COLOR,
            }
        );
    }

    #[test]
    fn test_for_faces_concatenates() {
        let faces = vec![face(None), face(None)];
        let plan = OverlayPlan::for_faces(&faces, 1);
        assert_eq!(plan.points().count(), 136);
        assert!(OverlayPlan::for_faces(&[], 4).is_empty());
    }
}
