//! Binary telemetry packets.
//!
//! One packet per frame: the fixed-width records of every face, concatenated
//! in detection order without length prefixes or delimiters. All values are
//! little-endian. Per record:
//!
//! ```text
//! f64 timestamp | i32 id | f32 width | f32 height | f32 blink right | f32 blink left
//! u8 success | f32 pnp error | f32 quaternion[4] | f32 euler[3] | f32 translation[3]
//! f32 confidence[L] | f32 landmark[L][2] (y, x) | f32 point[P][3] (x, -y, -z)
//! f32 feature[14]
//! ```

use crate::shared::constants::MAX_TRANSMITTED_FACES;
use crate::shared::face_result::FaceResult;
use crate::shared::frame_stamp::FrameStamp;
use crate::shared::record_layout::RecordLayout;

/// Whether a frame with `face_count` faces produces a packet.
pub fn should_transmit(face_count: usize) -> bool {
    face_count > 0 && face_count < MAX_TRANSMITTED_FACES
}

/// Serializes a frame's face results into one datagram payload.
#[derive(Clone, Copy, Debug, Default)]
pub struct TelemetryEncoder {
    layout: RecordLayout,
}

impl TelemetryEncoder {
    pub fn new(layout: RecordLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> RecordLayout {
        self.layout
    }

    /// Returns `None` when the frame must not be transmitted (no faces, or
    /// [`MAX_TRANSMITTED_FACES`] or more).
    pub fn encode_frame(&self, stamp: &FrameStamp, faces: &[FaceResult]) -> Option<Vec<u8>> {
        if !should_transmit(faces.len()) {
            return None;
        }
        let mut packet = Vec::with_capacity(faces.len() * self.layout.record_size());
        for face in faces {
            self.encode_record(stamp, face, &mut packet);
        }
        Some(packet)
    }

    /// Appends exactly `layout.record_size()` bytes for one face.
    ///
    /// Landmark and point lists are zero-padded or truncated to the layout.
    pub fn encode_record(&self, stamp: &FrameStamp, face: &FaceResult, buf: &mut Vec<u8>) {
        let [blink_right, blink_left] = face.eye_openness();

        put_f64(buf, stamp.timestamp);
        buf.extend_from_slice(&face.id.to_le_bytes());
        put_f32(buf, stamp.width as f32);
        put_f32(buf, stamp.height as f32);
        put_f32(buf, blink_right);
        put_f32(buf, blink_left);
        buf.push(u8::from(face.success));
        put_f32(buf, face.pnp_error);
        put_all(buf, &face.quaternion);
        put_all(buf, &face.euler);
        put_all(buf, &face.translation);

        for i in 0..self.layout.landmarks {
            put_f32(buf, face.landmarks.get(i).map_or(0.0, |lm| lm.confidence));
        }
        for i in 0..self.layout.landmarks {
            match face.landmarks.get(i) {
                Some(lm) => put_all(buf, &[lm.y, lm.x]),
                None => put_all(buf, &[0.0, 0.0]),
            }
        }
        for i in 0..self.layout.points {
            match face.points_3d.get(i) {
                Some(&[x, y, z]) => put_all(buf, &[x, -y, -z]),
                None => put_all(buf, &[0.0, 0.0, 0.0]),
            }
        }

        for value in face.feature_values() {
            put_f32(buf, value);
        }
    }
}

fn put_f64(buf: &mut Vec<u8>, value: f64) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn put_f32(buf: &mut Vec<u8>, value: f32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn put_all(buf: &mut Vec<u8>, values: &[f32]) {
    for &value in values {
        put_f32(buf, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::face_result::Landmark;
    use crate::telemetry::domain::packet_decoder::decode_packet;
    use rstest::rstest;

    fn stamp() -> FrameStamp {
        FrameStamp::new(0, 1234.5, 640, 360)
    }

    fn face_with_id(id: i32) -> FaceResult {
        FaceResult {
            id,
            success: true,
            landmarks: vec![Landmark::new(1.0, 2.0, 0.5); 68],
            points_3d: vec![[1.0, 2.0, 3.0]; 70],
            ..Default::default()
        }
    }

    fn f32_at(buf: &[u8], offset: usize) -> f32 {
        f32::from_le_bytes(buf[offset..offset + 4].try_into().unwrap())
    }

    #[rstest]
    #[case(0, false)]
    #[case(1, true)]
    #[case(39, true)]
    #[case(40, false)]
    #[case(41, false)]
    fn test_should_transmit(#[case] faces: usize, #[case] expected: bool) {
        assert_eq!(should_transmit(faces), expected);
    }

    #[test]
    fn test_record_is_1785_bytes_with_gaze() {
        let encoder = TelemetryEncoder::new(RecordLayout::GAZE);
        let packet = encoder.encode_frame(&stamp(), &[face_with_id(0)]).unwrap();
        assert_eq!(packet.len(), 1785);
    }

    #[test]
    fn test_packet_concatenates_records() {
        let encoder = TelemetryEncoder::new(RecordLayout::GAZE);
        let faces: Vec<_> = (0..39).map(face_with_id).collect();
        let packet = encoder.encode_frame(&stamp(), &faces).unwrap();
        assert_eq!(packet.len(), 39 * 1785);

        let second_id = i32::from_le_bytes(packet[1785 + 8..1785 + 12].try_into().unwrap());
        assert_eq!(second_id, 1);
    }

    #[test]
    fn test_forty_faces_suppressed() {
        let encoder = TelemetryEncoder::new(RecordLayout::GAZE);
        let faces: Vec<_> = (0..40).map(face_with_id).collect();
        assert!(encoder.encode_frame(&stamp(), &faces).is_none());
        assert!(encoder.encode_frame(&stamp(), &[]).is_none());
    }

    #[test]
    fn test_header_fields() {
        let encoder = TelemetryEncoder::new(RecordLayout::GAZE);
        let face = FaceResult {
            id: 7,
            success: true,
            pnp_error: 0.25,
            eye_blink: Some([0.5, 0.1]),
            quaternion: [0.1, 0.2, 0.3, 0.4],
            ..face_with_id(7)
        };
        let packet = encoder.encode_frame(&stamp(), &[face]).unwrap();

        assert_eq!(f64::from_le_bytes(packet[0..8].try_into().unwrap()), 1234.5);
        assert_eq!(i32::from_le_bytes(packet[8..12].try_into().unwrap()), 7);
        assert_eq!(f32_at(&packet, 12), 640.0);
        assert_eq!(f32_at(&packet, 16), 360.0);
        assert_eq!(f32_at(&packet, 20), 0.5);
        assert_eq!(f32_at(&packet, 24), 0.1);
        assert_eq!(packet[28], 1);
        assert_eq!(f32_at(&packet, 29), 0.25);
        assert_eq!(f32_at(&packet, 33), 0.1);
        assert_eq!(f32_at(&packet, 45), 0.4);
    }

    #[test]
    fn test_missing_blink_encodes_open_eyes() {
        let encoder = TelemetryEncoder::new(RecordLayout::GAZE);
        let packet = encoder.encode_frame(&stamp(), &[face_with_id(0)]).unwrap();
        assert_eq!(f32_at(&packet, 20), 1.0);
        assert_eq!(f32_at(&packet, 24), 1.0);
    }

    #[test]
    fn test_landmarks_swapped_and_points_flipped() {
        let layout = RecordLayout::GAZE;
        let encoder = TelemetryEncoder::new(layout);
        let packet = encoder.encode_frame(&stamp(), &[face_with_id(0)]).unwrap();

        let confidences = 73;
        let positions = confidences + layout.landmarks * 4;
        let points = positions + layout.landmarks * 8;

        assert_eq!(f32_at(&packet, confidences), 0.5);
        assert_eq!(f32_at(&packet, positions), 2.0);
        assert_eq!(f32_at(&packet, positions + 4), 1.0);
        assert_eq!(f32_at(&packet, points), 1.0);
        assert_eq!(f32_at(&packet, points + 4), -2.0);
        assert_eq!(f32_at(&packet, points + 8), -3.0);
    }

    #[test]
    fn test_failed_fit_still_sends_points() {
        let layout = RecordLayout::GAZE;
        let encoder = TelemetryEncoder::new(layout);
        let face = FaceResult {
            success: false,
            points_3d: vec![[0.25, 0.5, 0.75]; 70],
            ..face_with_id(0)
        };
        let packet = encoder.encode_frame(&stamp(), &[face.clone()]).unwrap();

        let decoded = decode_packet(&packet, &layout).unwrap();
        assert!(!decoded[0].face.success);
        assert_eq!(decoded[0].face.points_3d, face.points_3d);
    }

    #[test]
    fn test_closed_eye_landmark_keeps_its_slot() {
        let layout = RecordLayout::GAZE;
        let encoder = TelemetryEncoder::new(layout);
        let mut face = FaceResult {
            eye_blink: Some([0.5, 0.1]),
            ..face_with_id(0)
        };
        face.landmarks[67] = Landmark::new(30.0, 40.0, 0.625);
        let packet = encoder.encode_frame(&stamp(), &[face]).unwrap();

        let confidences = 73;
        let positions = confidences + layout.landmarks * 4;
        assert_eq!(f32_at(&packet, confidences + 67 * 4), 0.625);
        assert_eq!(f32_at(&packet, positions + 67 * 8), 40.0);
        assert_eq!(f32_at(&packet, positions + 67 * 8 + 4), 30.0);
    }

    #[test]
    fn test_short_lists_are_padded() {
        let encoder = TelemetryEncoder::new(RecordLayout::GAZE);
        let face = FaceResult {
            landmarks: vec![Landmark::new(1.0, 1.0, 1.0); 10],
            ..Default::default()
        };
        let packet = encoder.encode_frame(&stamp(), &[face]).unwrap();
        assert_eq!(packet.len(), RecordLayout::GAZE.record_size());
    }

    #[test]
    fn test_features_written_in_declared_order() {
        let encoder = TelemetryEncoder::new(RecordLayout::NO_GAZE);
        let mut face = face_with_id(0);
        face.features.insert("mouth_wide".to_string(), 0.75);
        face.features.insert("eye_l".to_string(), 0.125);
        let packet = encoder.encode_frame(&stamp(), &[face]).unwrap();

        let size = RecordLayout::NO_GAZE.record_size();
        let features = size - 14 * 4;
        assert_eq!(f32_at(&packet, features), 0.125);
        assert_eq!(f32_at(&packet, size - 4), 0.75);
        assert_eq!(f32_at(&packet, features + 4), 0.0);
    }
}
