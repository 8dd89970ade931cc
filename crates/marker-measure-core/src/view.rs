//! Borrowed grayscale pixel access.

/// Borrowed single-channel view over a row-major `u8` buffer.
#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h
}

impl<'a> GrayImageView<'a> {
    /// Pixel at `(x, y)`, or `None` outside the image.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<u8> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(self.data[y as usize * self.width + x as usize])
    }
}

impl<'a> From<&'a image::GrayImage> for GrayImageView<'a> {
    fn from(img: &'a image::GrayImage) -> Self {
        Self {
            width: img.width() as usize,
            height: img.height() as usize,
            data: img.as_raw(),
        }
    }
}

/// Mean of the 3x3 neighbourhood around `(x, y)`.
///
/// Returns `None` when the neighbourhood leaves the image.
pub fn sample_mean_3x3(img: &GrayImageView<'_>, x: f32, y: f32) -> Option<u8> {
    let ix = x.floor() as i32;
    let iy = y.floor() as i32;

    let mut sum = 0u32;
    for dy in -1..=1 {
        for dx in -1..=1 {
            sum += img.get(ix + dx, iy + dy)? as u32;
        }
    }
    Some((sum / 9) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_sampling_rejects_border_neighbourhoods() {
        let data: Vec<u8> = (0..25).map(|v| v as u8 * 10).collect();
        let view = GrayImageView {
            width: 5,
            height: 5,
            data: &data,
        };

        assert_eq!(sample_mean_3x3(&view, 2.5, 2.5), Some(120));
        assert_eq!(sample_mean_3x3(&view, 0.2, 2.0), None);
        assert_eq!(sample_mean_3x3(&view, 4.0, 4.0), None);
    }
}
