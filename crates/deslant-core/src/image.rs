/// Errors raised when a raw buffer cannot be interpreted as a grayscale image.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    #[error("image is empty (width={width}, height={height})")]
    Empty { width: usize, height: usize },

    #[error("invalid grayscale buffer length (expected {expected} bytes, got {got})")]
    BufferLength { expected: usize, got: usize },
}

#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h
}

impl<'a> GrayImageView<'a> {
    /// Wrap a row-major buffer, checking that it matches the dimensions.
    pub fn new(width: usize, height: usize, data: &'a [u8]) -> Result<Self, ImageError> {
        let view = Self {
            width,
            height,
            data,
        };
        view.validate()?;
        Ok(view)
    }

    /// Check that the view is non-empty and its buffer holds exactly `width * height` samples.
    pub fn validate(&self) -> Result<(), ImageError> {
        if self.width == 0 || self.height == 0 {
            return Err(ImageError::Empty {
                width: self.width,
                height: self.height,
            });
        }
        let Some(expected) = self.width.checked_mul(self.height) else {
            return Err(ImageError::Empty {
                width: self.width,
                height: self.height,
            });
        };
        if self.data.len() != expected {
            return Err(ImageError::BufferLength {
                expected,
                got: self.data.len(),
            });
        }
        Ok(())
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    pub fn row(&self, y: usize) -> &'a [u8] {
        &self.data[y * self.width..(y + 1) * self.width]
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl GrayImage {
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, 0)
    }

    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    pub fn view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        self.data[y * self.width + x] = value;
    }
}

#[inline]
fn get_gray_or(src: &GrayImageView<'_>, x: i32, y: i32, fill: u8) -> u8 {
    if x < 0 || y < 0 || x >= src.width as i32 || y >= src.height as i32 {
        return fill;
    }
    src.data[y as usize * src.width + x as usize]
}

/// Bilinear sample at integer-grid coordinates; neighbours outside the image read as `fill`.
#[inline]
pub fn sample_bilinear(src: &GrayImageView<'_>, x: f32, y: f32, fill: u8) -> f32 {
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = get_gray_or(src, x0, y0, fill) as f32;
    let p10 = get_gray_or(src, x0 + 1, y0, fill) as f32;
    let p01 = get_gray_or(src, x0, y0 + 1, fill) as f32;
    let p11 = get_gray_or(src, x0 + 1, y0 + 1, fill) as f32;

    let a = p00 + fx * (p10 - p00);
    let b = p01 + fx * (p11 - p01);
    a + fy * (b - a)
}

#[inline]
pub fn sample_bilinear_u8(src: &GrayImageView<'_>, x: f32, y: f32, fill: u8) -> u8 {
    sample_bilinear(src, x, y, fill).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn view_rejects_mismatched_buffer() {
        let data = vec![0u8; 11];
        let err = GrayImageView::new(4, 3, &data).unwrap_err();
        assert_eq!(
            err,
            ImageError::BufferLength {
                expected: 12,
                got: 11
            }
        );
    }

    #[test]
    fn view_rejects_empty_dimensions() {
        let err = GrayImageView::new(0, 3, &[]).unwrap_err();
        assert_eq!(
            err,
            ImageError::Empty {
                width: 0,
                height: 3
            }
        );
    }

    #[test]
    fn bilinear_hits_pixels_exactly_on_the_grid() {
        let img = GrayImage {
            width: 2,
            height: 2,
            data: vec![10, 20, 30, 40],
        };
        let view = img.view();
        assert_abs_diff_eq!(sample_bilinear(&view, 1.0, 1.0, 255), 40.0);
        assert_abs_diff_eq!(sample_bilinear(&view, 0.5, 0.0, 255), 15.0);
        assert_abs_diff_eq!(sample_bilinear(&view, 0.5, 0.5, 255), 25.0);
    }

    #[test]
    fn bilinear_blends_with_fill_outside() {
        let img = GrayImage::filled(1, 1, 0);
        let view = img.view();
        assert_eq!(sample_bilinear_u8(&view, -0.5, 0.0, 200), 100);
        assert_eq!(sample_bilinear_u8(&view, -3.0, -3.0, 200), 200);
    }
}
