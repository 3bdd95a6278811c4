//! Owned pixel frames, tagged with the order of their three channels.

use std::path::Path;

use image::{codecs::jpeg::JpegEncoder, RgbImage};
use serde::Serialize;
use thiserror::Error;

/// Order of the three interleaved channels in a frame buffer.
///
/// Camera sources hand out BGR, decoded files come out as RGB. The order is
/// carried through sampling so channel means are never silently swapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    Rgb,
    Bgr,
}

impl ChannelOrder {
    /// Reorders an `[r, g, b]` triple into this order.
    ///
    /// Swapping is symmetric, so the same call maps a triple in this order
    /// back to `[r, g, b]`.
    pub fn from_rgb<T: Copy>(self, rgb: [T; 3]) -> [T; 3] {
        match self {
            ChannelOrder::Rgb => rgb,
            ChannelOrder::Bgr => [rgb[2], rgb[1], rgb[0]],
        }
    }
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("buffer size doesn't match dimensions: expected {expected} bytes, got {actual}")]
    InvalidDimensions { expected: usize, actual: usize },

    #[error("frame dimensions are zero")]
    ZeroDimensions,

    #[error("row stride {stride} is shorter than a {width} pixel row")]
    InvalidStride { stride: usize, width: u32 },

    #[error("invalid image: {0}")]
    InvalidImage(#[from] image::ImageError),
}

/// A captured or decoded image: width x height x 3 channels.
///
/// Frames are only changed through a copy (see [`crate::annotator`]), so a
/// capture handed to the display stays as it was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pixels: RgbImage,
    order: ChannelOrder,
}

impl Frame {
    /// Validates buffer size against dimensions and constructs a frame.
    pub fn from_raw(
        width: u32,
        height: u32,
        data: Vec<u8>,
        order: ChannelOrder,
    ) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::ZeroDimensions);
        }

        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(FrameError::InvalidDimensions {
                expected,
                actual: data.len(),
            });
        }

        let pixels = RgbImage::from_raw(width, height, data).ok_or(
            FrameError::InvalidDimensions {
                expected,
                actual: 0,
            },
        )?;
        Ok(Self { pixels, order })
    }

    /// Builds a frame from a buffer whose rows may be padded past `width * 3`
    /// bytes, as video sinks commonly align rows to 4 bytes.
    pub fn from_strided(
        width: u32,
        height: u32,
        stride: usize,
        data: &[u8],
        order: ChannelOrder,
    ) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::ZeroDimensions);
        }

        let row_len = width as usize * 3;
        if stride < row_len {
            return Err(FrameError::InvalidStride { stride, width });
        }

        let needed = stride * (height as usize - 1) + row_len;
        if data.len() < needed {
            return Err(FrameError::InvalidDimensions {
                expected: needed,
                actual: data.len(),
            });
        }

        let mut packed = Vec::with_capacity(row_len * height as usize);
        for row in data.chunks(stride).take(height as usize) {
            packed.extend_from_slice(&row[..row_len]);
        }
        Self::from_raw(width, height, packed, order)
    }

    /// Wraps an already decoded RGB image.
    pub fn from_rgb_image(pixels: RgbImage) -> Result<Self, FrameError> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(FrameError::ZeroDimensions);
        }
        Ok(Self {
            pixels,
            order: ChannelOrder::Rgb,
        })
    }

    /// Decodes an encoded image (jpeg/png) from memory.
    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        let image = image::load_from_memory(bytes)?;
        Self::from_rgb_image(image.to_rgb8())
    }

    /// Reads and decodes an image file.
    pub fn open(path: &Path) -> Result<Self, FrameError> {
        let image = image::open(path)?;
        Self::from_rgb_image(image.to_rgb8())
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    /// Raw interleaved pixels, in [`Frame::order`].
    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    pub(crate) fn pixels_mut(&mut self) -> &mut RgbImage {
        &mut self.pixels
    }

    /// Copy of the pixels in RGB order, ready for encoding or display.
    pub fn to_rgb_image(&self) -> RgbImage {
        match self.order {
            ChannelOrder::Rgb => self.pixels.clone(),
            ChannelOrder::Bgr => {
                let mut rgb = self.pixels.clone();
                for pixel in rgb.pixels_mut() {
                    pixel.0.swap(0, 2);
                }
                rgb
            }
        }
    }

    /// Encodes the frame as JPEG bytes.
    pub fn to_jpeg(&self, quality: u8) -> Result<Vec<u8>, FrameError> {
        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, quality).encode_image(&self.to_rgb_image())?;
        Ok(buf)
    }

    /// Writes the frame to disk, format picked from the extension.
    pub fn save(&self, path: &Path) -> Result<(), FrameError> {
        self.to_rgb_image().save(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_dimensions() {
        let err = Frame::from_raw(0, 4, vec![], ChannelOrder::Rgb).unwrap_err();
        assert!(matches!(err, FrameError::ZeroDimensions));
    }

    #[test]
    fn rejects_short_buffer() {
        let err = Frame::from_raw(2, 2, vec![0; 11], ChannelOrder::Bgr).unwrap_err();
        assert!(matches!(
            err,
            FrameError::InvalidDimensions {
                expected: 12,
                actual: 11
            }
        ));
    }

    #[test]
    fn bgr_frame_converts_to_rgb() {
        let frame = Frame::from_raw(1, 1, vec![10, 20, 30], ChannelOrder::Bgr).unwrap();
        assert_eq!(frame.to_rgb_image().as_raw(), &vec![30, 20, 10]);
        // Stored pixels keep the native order.
        assert_eq!(frame.pixels().as_raw(), &vec![10, 20, 30]);
    }

    #[test]
    fn strided_rows_are_packed() {
        // 1 pixel wide, 2 rows, each row padded to 4 bytes.
        let data = [1, 2, 3, 0, 4, 5, 6, 0];
        let frame = Frame::from_strided(1, 2, 4, &data, ChannelOrder::Bgr).unwrap();
        assert_eq!(frame.pixels().as_raw(), &vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn stride_shorter_than_row_is_rejected() {
        let err = Frame::from_strided(2, 1, 5, &[0; 6], ChannelOrder::Rgb).unwrap_err();
        assert!(matches!(err, FrameError::InvalidStride { stride: 5, width: 2 }));
    }

    #[test]
    fn garbage_bytes_are_an_invalid_image() {
        let err = Frame::decode(b"definitely not a png").unwrap_err();
        assert!(matches!(err, FrameError::InvalidImage(_)));
    }

    #[test]
    fn jpeg_roundtrip_keeps_dimensions() {
        let frame = Frame::from_raw(8, 6, vec![128; 8 * 6 * 3], ChannelOrder::Rgb).unwrap();
        let bytes = frame.to_jpeg(90).unwrap();
        let decoded = Frame::decode(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 6));
    }
}
