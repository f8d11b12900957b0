//! Open/closed eye policy shared by the console status line and the overlay.
//!
//! The eye landmarks appended by gaze tracking are only drawn while the
//! matching eye is open. They are always encoded and logged regardless.

use crate::shared::constants::{EYE_OPEN_THRESHOLD, LEFT_EYE_LANDMARK, RIGHT_EYE_LANDMARK};
use crate::shared::face_result::FaceResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EyeState {
    Open,
    Closed,
}

impl EyeState {
    pub fn from_openness(openness: f32) -> Self {
        if openness > EYE_OPEN_THRESHOLD {
            EyeState::Open
        } else {
            EyeState::Closed
        }
    }

    /// Console symbol: `O` for open, `-` for closed.
    pub fn symbol(self) -> char {
        match self {
            EyeState::Open => 'O',
            EyeState::Closed => '-',
        }
    }
}

/// `(right, left)` eye states of a face; missing blink data reads as open.
pub fn eye_states(face: &FaceResult) -> (EyeState, EyeState) {
    let [right, left] = face.eye_openness();
    (EyeState::from_openness(right), EyeState::from_openness(left))
}

/// Whether landmark `index` may be drawn given eye openness `[right, left]`.
pub fn is_landmark_renderable(index: usize, openness: [f32; 2]) -> bool {
    match index {
        RIGHT_EYE_LANDMARK => EyeState::from_openness(openness[0]) == EyeState::Open,
        LEFT_EYE_LANDMARK => EyeState::from_openness(openness[1]) == EyeState::Open,
        _ => true,
    }
}
