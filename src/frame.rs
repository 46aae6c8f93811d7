//! Gray8 input frame type.

use thiserror::Error;

/// Errors raised when wrapping raw luma data in a [`Frame`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// The data slice cannot hold `height` rows of `stride` bytes
    #[error("frame data too small: need {expected} bytes, got {actual}")]
    TooSmall { expected: usize, actual: usize },
    /// Stride is narrower than the visible width
    #[error("stride {stride} is narrower than width {width}")]
    StrideTooNarrow { stride: usize, width: u32 },
}

/// A single-plane 8-bit luma frame.
///
/// Rows are `stride` bytes apart; only the first `width` bytes of each row
/// are visible pixels.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Raw luma samples, row-major
    data: Vec<u8>,
    /// Frame width in pixels
    width: u32,
    /// Frame height in pixels
    height: u32,
    /// Distance between rows in bytes
    stride: usize,
}

impl Frame {
    /// Wrap tightly packed luma data (`stride == width`).
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Result<Self, FrameError> {
        Self::with_stride(data, width, height, width as usize)
    }

    /// Wrap luma data whose rows are `stride` bytes apart.
    pub fn with_stride(
        data: Vec<u8>,
        width: u32,
        height: u32,
        stride: usize,
    ) -> Result<Self, FrameError> {
        if stride < width as usize {
            return Err(FrameError::StrideTooNarrow { stride, width });
        }
        // The last row only needs its visible part.
        let expected = match height {
            0 => 0,
            h => stride * (h as usize - 1) + width as usize,
        };
        if data.len() < expected {
            return Err(FrameError::TooSmall {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// A frame filled with one luma value.
    pub fn filled(width: u32, height: u32, luma: u8) -> Self {
        Self {
            data: vec![luma; width as usize * height as usize],
            width,
            height,
            stride: width as usize,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Luma sample at `(x, y)`. Caller keeps the coordinate inside the frame.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> u8 {
        self.data[y as usize * self.stride + x as usize]
    }

    /// Give the backing buffer back, e.g. to refill it with the next frame.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_packed_frame() {
        let frame = Frame::new(vec![0; 16], 4, 4).unwrap();
        assert_eq!(frame.stride(), 4);
        assert_eq!(frame.width(), 4);
        assert_eq!(frame.height(), 4);
    }

    #[test]
    fn test_new_rejects_short_data() {
        let err = Frame::new(vec![0; 15], 4, 4).unwrap_err();
        assert_eq!(
            err,
            FrameError::TooSmall {
                expected: 16,
                actual: 15
            }
        );
    }

    #[test]
    fn test_stride_last_row_may_be_short() {
        // 3 rows of stride 8, last row only needs 4 visible bytes
        let frame = Frame::with_stride(vec![0; 20], 4, 3, 8).unwrap();
        assert_eq!(frame.stride(), 8);
    }

    #[test]
    fn test_stride_narrower_than_width() {
        let err = Frame::with_stride(vec![0; 64], 8, 8, 4).unwrap_err();
        assert!(matches!(err, FrameError::StrideTooNarrow { .. }));
    }

    #[test]
    fn test_pixel_uses_stride() {
        let mut data = vec![0u8; 16];
        data[8 + 1] = 77;
        let frame = Frame::with_stride(data, 2, 2, 8).unwrap();
        assert_eq!(frame.pixel(1, 1), 77);
    }

    #[test]
    fn test_empty_frame() {
        let frame = Frame::new(Vec::new(), 0, 0).unwrap();
        assert!(frame.data().is_empty());
    }
}
