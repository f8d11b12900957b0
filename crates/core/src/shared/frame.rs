use ndarray::{ArrayView3, ArrayViewMut3};

/// One captured image: tightly packed RGB24 bytes in row-major order.
///
/// `index` counts successful reads since the session started and keeps
/// increasing across source reinitializations.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    index: usize,
}

pub const CHANNELS: usize = 3;

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
            index,
        }
    }

    /// A black frame, mostly useful for synthetic sources.
    pub fn blank(width: u32, height: u32, index: usize) -> Self {
        Self::new(
            vec![0u8; (width as usize) * (height as usize) * CHANNELS],
            width,
            height,
            index,
        )
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    /// Writes one pixel, ignoring coordinates outside the image.
    /// Returns whether the pixel was inside.
    pub fn put_pixel(&mut self, row: i64, col: i64, rgb: [u8; 3]) -> bool {
        if row < 0 || col < 0 || row >= self.height as i64 || col >= self.width as i64 {
            return false;
        }
        let mut view = self.as_ndarray_mut();
        for (c, value) in rgb.iter().enumerate() {
            view[[row as usize, col as usize, c]] = *value;
        }
        true
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        ArrayViewMut3::from_shape(self.shape(), &mut self.data)
            .expect("Frame data length must match dimensions")
    }

    fn shape(&self) -> (usize, usize, usize) {
        (self.height as usize, self.width as usize, CHANNELS)
    }
}
