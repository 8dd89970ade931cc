//! Owned pixel buffer handed to the pipeline by the image decoder.

use image::{DynamicImage, GrayImage, RgbImage};

use crate::InvalidImageError;

/// Row-major `width × height × channels` array of 8-bit samples.
///
/// One channel is grayscale, three channels are RGB. The buffer is validated
/// on construction and never mutated by the pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(
        width: u32,
        height: u32,
        channels: u8,
        data: Vec<u8>,
    ) -> Result<Self, InvalidImageError> {
        if width == 0 || height == 0 {
            return Err(InvalidImageError::ZeroDimensions { width, height });
        }
        if channels != 1 && channels != 3 {
            return Err(InvalidImageError::UnsupportedChannels { channels });
        }
        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(InvalidImageError::BufferLength {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    pub fn from_gray(img: GrayImage) -> Result<Self, InvalidImageError> {
        let (w, h) = img.dimensions();
        Self::new(w, h, 1, img.into_raw())
    }

    pub fn from_rgb(img: RgbImage) -> Result<Self, InvalidImageError> {
        let (w, h) = img.dimensions();
        Self::new(w, h, 3, img.into_raw())
    }

    /// Keep grayscale images single-channel; everything else becomes RGB.
    pub fn from_dynamic(img: DynamicImage) -> Result<Self, InvalidImageError> {
        match img {
            DynamicImage::ImageLuma8(gray) => Self::from_gray(gray),
            DynamicImage::ImageLuma16(_)
            | DynamicImage::ImageLumaA8(_)
            | DynamicImage::ImageLumaA16(_) => {
                Self::from_gray(img.to_luma8())
            }
            other => Self::from_rgb(other.to_rgb8()),
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn channels(&self) -> u8 {
        self.channels
    }

    #[inline]
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    /// Single-channel intensity copy.
    pub fn to_gray(&self) -> GrayImage {
        match self.channels {
            1 => GrayImage::from_fn(self.width, self.height, |x, y| {
                image::Luma([self.data[self.index(x, y)]])
            }),
            _ => DynamicImage::ImageRgb8(self.rgb_image()).to_luma8(),
        }
    }

    /// Three-channel copy for drawing overlays.
    pub fn to_rgb(&self) -> RgbImage {
        match self.channels {
            1 => RgbImage::from_fn(self.width, self.height, |x, y| {
                let v = self.data[self.index(x, y)];
                image::Rgb([v, v, v])
            }),
            _ => self.rgb_image(),
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * self.channels as usize
    }

    fn rgb_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| {
            let i = self.index(x, y);
            image::Rgb([self.data[i], self.data[i + 1], self.data[i + 2]])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_buffers() {
        assert_eq!(
            PixelBuffer::new(0, 4, 1, Vec::new()).unwrap_err(),
            InvalidImageError::ZeroDimensions { width: 0, height: 4 }
        );
        assert_eq!(
            PixelBuffer::new(2, 2, 4, vec![0; 16]).unwrap_err(),
            InvalidImageError::UnsupportedChannels { channels: 4 }
        );
        assert_eq!(
            PixelBuffer::new(2, 2, 3, vec![0; 11]).unwrap_err(),
            InvalidImageError::BufferLength { expected: 12, got: 11 }
        );
    }

    #[test]
    fn gray_buffer_converts_both_ways() {
        let buf = PixelBuffer::new(3, 2, 1, vec![0, 50, 100, 150, 200, 250]).expect("buffer");
        let gray = buf.to_gray();
        assert_eq!(gray.get_pixel(2, 1).0, [250]);
        let rgb = buf.to_rgb();
        assert_eq!(rgb.get_pixel(1, 0).0, [50, 50, 50]);
    }

    #[test]
    fn rgb_buffer_keeps_channel_order() {
        let buf = PixelBuffer::new(1, 2, 3, vec![255, 0, 0, 0, 0, 255]).expect("buffer");
        let rgb = buf.to_rgb();
        assert_eq!(rgb.get_pixel(0, 0).0, [255, 0, 0]);
        assert_eq!(rgb.get_pixel(0, 1).0, [0, 0, 255]);
        // white and black stay white and black in the intensity copy
        let bw = PixelBuffer::new(2, 1, 3, vec![255, 255, 255, 0, 0, 0]).expect("buffer");
        assert_eq!(bw.to_gray().as_raw(), &vec![255, 0]);
    }
}
