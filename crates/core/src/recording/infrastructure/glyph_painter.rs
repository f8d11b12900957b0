use crate::recording::domain::frame_painter::FramePainter;
use crate::recording::domain::overlay_plan::{OverlayMark, OverlayPlan};
use crate::shared::frame::Frame;

const GLYPH_WIDTH: i64 = 3;
const GLYPH_HEIGHT: i64 = 5;
const GLYPH_ADVANCE: i64 = GLYPH_WIDTH + 1;

/// Paints overlay marks with a built-in 3x5 bitmap font.
///
/// Labels only ever hold numbers, so the font covers digits, `.` and `-`.
/// Other characters leave a gap.
pub struct GlyphPainter;

impl GlyphPainter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GlyphPainter {
    fn default() -> Self {
        Self::new()
    }
}

impl FramePainter for GlyphPainter {
    fn paint(&self, frame: &mut Frame, plan: &OverlayPlan) {
        for mark in &plan.marks {
            match mark {
                OverlayMark::Point { row, col, color } => {
                    for (dr, dc) in [(0, 0), (1, 0), (1, 1), (0, 1)] {
                        frame.put_pixel(row + dr, col + dc, *color);
                    }
                }
                OverlayMark::Label {
                    row,
                    col,
                    text,
                    color,
                } => draw_text(frame, *row, *col, text, *color),
            }
        }
    }
}

/// `(row, col)` is the bottom-left corner of the first glyph.
fn draw_text(frame: &mut Frame, row: i64, col: i64, text: &str, color: [u8; 3]) {
    let top = row - GLYPH_HEIGHT + 1;
    for (i, ch) in text.chars().enumerate() {
        let Some(rows) = glyph(ch) else {
            continue;
        };
        let left = col + i as i64 * GLYPH_ADVANCE;
        for (r, bits) in rows.iter().enumerate() {
            for c in 0..GLYPH_WIDTH {
                if bits & (0b100 >> c) != 0 {
                    frame.put_pixel(top + r as i64, left + c, color);
                }
            }
        }
    }
}

fn glyph(ch: char) -> Option<[u8; 5]> {
    let rows = match ch {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        _ => return None,
    };
    Some(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: [u8; 3] = [255, 0, 0];

    fn pixel(frame: &Frame, row: usize, col: usize) -> [u8; 3] {
        let view = frame.as_ndarray();
        [view[[row, col, 0]], view[[row, col, 1]], view[[row, col, 2]]]
    }

    fn lit_pixels(frame: &Frame) -> usize {
        frame.data().chunks(3).filter(|px| px.iter().any(|&b| b != 0)).count()
    }

    #[test]
    fn test_point_is_two_by_two() {
        let mut frame = Frame::blank(10, 10, 0);
        let plan = OverlayPlan {
            marks: vec![OverlayMark::Point {
                row: 3,
                col: 4,
                color: RED,
            }],
        };
        GlyphPainter::new().paint(&mut frame, &plan);

        assert_eq!(pixel(&frame, 3, 4), RED);
        assert_eq!(pixel(&frame, 4, 4), RED);
        assert_eq!(pixel(&frame, 4, 5), RED);
        assert_eq!(pixel(&frame, 3, 5), RED);
        assert_eq!(lit_pixels(&frame), 4);
    }

    #[test]
    fn test_point_on_edge_is_clipped() {
        let mut frame = Frame::blank(10, 10, 0);
        let plan = OverlayPlan {
            marks: vec![
                OverlayMark::Point {
                    row: 9,
                    col: 9,
                    color: RED,
                },
                OverlayMark::Point {
                    row: -5,
                    col: 200,
                    color: RED,
                },
            ],
        };
        GlyphPainter::new().paint(&mut frame, &plan);
        assert_eq!(lit_pixels(&frame), 1);
    }

    #[test]
    fn test_label_draws_glyphs_above_baseline() {
        let mut frame = Frame::blank(20, 10, 0);
        let plan = OverlayPlan {
            marks: vec![OverlayMark::Label {
                row: 6,
                col: 1,
                text: "1".to_string(),
                color: RED,
            }],
        };
        GlyphPainter::new().paint(&mut frame, &plan);

        // '1' has 8 lit cells spanning rows 2..=6.
        assert_eq!(lit_pixels(&frame), 8);
        assert_eq!(pixel(&frame, 2, 2), RED);
        assert_eq!(pixel(&frame, 6, 1), RED);
        assert_eq!(pixel(&frame, 1, 2), [0, 0, 0]);
    }

    #[test]
    fn test_unknown_characters_are_skipped() {
        let mut frame = Frame::blank(20, 10, 0);
        let plan = OverlayPlan {
            marks: vec![OverlayMark::Label {
                row: 6,
                col: 0,
                text: "x".to_string(),
                color: RED,
            }],
        };
        GlyphPainter::new().paint(&mut frame, &plan);
        assert_eq!(lit_pixels(&frame), 0);
    }
}
