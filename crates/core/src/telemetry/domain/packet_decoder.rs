use thiserror::Error;

use crate::shared::constants::FEATURE_NAMES;
use crate::shared::face_result::{FaceResult, Landmark};
use crate::shared::record_layout::RecordLayout;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("empty packet")]
    Empty,
    #[error("packet length {len} is not a multiple of the {record_size}-byte record")]
    Misaligned { len: usize, record_size: usize },
}

/// One face record as a consumer sees it.
///
/// `face` is back in the internal convention. Fields the wire does not carry
/// (overall confidence, rotation vector, bounding box) stay at their defaults.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedFace {
    pub timestamp: f64,
    pub width: f32,
    pub height: f32,
    pub face: FaceResult,
}

/// Splits a datagram into its face records.
pub fn decode_packet(bytes: &[u8], layout: &RecordLayout) -> Result<Vec<DecodedFace>, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    let record_size = layout.record_size();
    if bytes.len() % record_size != 0 {
        return Err(DecodeError::Misaligned {
            len: bytes.len(),
            record_size,
        });
    }

    Ok(bytes
        .chunks_exact(record_size)
        .map(|record| decode_record(record, layout))
        .collect())
}

fn decode_record(record: &[u8], layout: &RecordLayout) -> DecodedFace {
    let mut r = RecordReader::new(record);

    let timestamp = r.f64();
    let id = r.i32();
    let width = r.f32();
    let height = r.f32();
    let eye_blink = Some([r.f32(), r.f32()]);
    let success = r.u8() != 0;
    let pnp_error = r.f32();
    let quaternion = [r.f32(), r.f32(), r.f32(), r.f32()];
    let euler = [r.f32(), r.f32(), r.f32()];
    let translation = [r.f32(), r.f32(), r.f32()];

    let confidences: Vec<f32> = (0..layout.landmarks).map(|_| r.f32()).collect();
    let landmarks = confidences
        .into_iter()
        .map(|confidence| {
            let y = r.f32();
            let x = r.f32();
            Landmark::new(x, y, confidence)
        })
        .collect();
    let points_3d = (0..layout.points)
        .map(|_| {
            let x = r.f32();
            let y = r.f32();
            let z = r.f32();
            [x, -y, -z]
        })
        .collect();
    let features = FEATURE_NAMES
        .iter()
        .map(|name| (name.to_string(), r.f32()))
        .collect();

    debug_assert_eq!(r.pos, layout.record_size());

    DecodedFace {
        timestamp,
        width,
        height,
        face: FaceResult {
            id,
            success,
            pnp_error,
            eye_blink,
            quaternion,
            euler,
            translation,
            landmarks,
            points_3d,
            features,
            ..Default::default()
        },
    }
}

/// Little-endian cursor over a record whose length was already checked.
struct RecordReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> RecordReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(&self.buf[self.pos..self.pos + N]);
        self.pos += N;
        bytes
    }

    fn u8(&mut self) -> u8 {
        self.take::<1>()[0]
    }

    fn i32(&mut self) -> i32 {
        i32::from_le_bytes(self.take())
    }

    fn f32(&mut self) -> f32 {
        f32::from_le_bytes(self.take())
    }

    fn f64(&mut self) -> f64 {
        f64::from_le_bytes(self.take())
    }
}
