//! Mirror-symmetrization of a 3D face landmark set.
//!
//! Each mirror pair is folded onto a shared half-width and a shared height and
//! depth, the midline is pinned to x = 0 and the nose tip becomes the origin.
//! Applying it to its own output changes nothing.

use thiserror::Error;

use crate::shared::face_result::Point3;

/// Landmark pairs mirrored across the facial midline.
pub const MIRROR_PAIRS: [(usize, usize); 28] = [
    (0, 16),
    (1, 15),
    (2, 14),
    (3, 13),
    (4, 12),
    (5, 11),
    (6, 10),
    (7, 9),
    (17, 26),
    (18, 25),
    (19, 24),
    (20, 23),
    (21, 22),
    (31, 35),
    (32, 34),
    (36, 45),
    (37, 44),
    (38, 43),
    (39, 42),
    (40, 47),
    (41, 46),
    (48, 52),
    (49, 51),
    (56, 54),
    (57, 53),
    (58, 62),
    (59, 61),
    (65, 63),
];

/// Landmarks on the facial midline.
pub const MIDLINE_INDICES: [usize; 9] = [8, 27, 28, 29, 33, 50, 55, 60, 64];

pub const NOSE_TIP_INDEX: usize = 30;

/// Smallest point set that covers every index above.
pub const MIN_POINTS: usize = 66;

#[derive(Debug, Error, PartialEq)]
pub enum SymmetrizeError {
    #[error("symmetrization needs at least {MIN_POINTS} points, got {0}")]
    TooFewPoints(usize),
}

/// Makes `points` left/right symmetric in place.
pub fn symmetrize(points: &mut [Point3]) -> Result<(), SymmetrizeError> {
    if points.len() < MIN_POINTS {
        return Err(SymmetrizeError::TooFewPoints(points.len()));
    }

    for &(a, b) in MIRROR_PAIRS.iter() {
        let x = (points[a][0] - points[b][0]) / 2.0;
        let y = (points[a][1] + points[b][1]) / 2.0;
        let z = (points[a][2] + points[b][2]) / 2.0;
        points[a] = [x, y, z];
        points[b] = [-x, y, z];
    }

    for &i in MIDLINE_INDICES.iter() {
        points[i][0] = 0.0;
    }
    points[NOSE_TIP_INDEX] = [0.0, 0.0, 0.0];

    Ok(())
}
