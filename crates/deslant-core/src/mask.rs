use crate::{otsu_threshold, GrayImageView};

/// Foreground/background classification of an image; `1` marks ink.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryMask {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl BinaryMask {
    /// All-background mask.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> bool) -> Self {
        let mut mask = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                if f(x, y) {
                    mask.data[y * width + x] = 1;
                }
            }
        }
        mask
    }

    #[inline]
    pub fn is_foreground(&self, x: usize, y: usize) -> bool {
        self.data[y * self.width + x] != 0
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, foreground: bool) {
        self.data[y * self.width + x] = u8::from(foreground);
    }

    pub fn count_foreground(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    /// Nearest-neighbour resize; sampling at pixel centres keeps thin strokes aligned.
    pub fn resize_nearest(&self, width: usize, height: usize) -> BinaryMask {
        if width == self.width && height == self.height {
            return self.clone();
        }
        let sx = self.width as f32 / width.max(1) as f32;
        let sy = self.height as f32 / height.max(1) as f32;
        BinaryMask::from_fn(width, height, |x, y| {
            let src_x = (((x as f32 + 0.5) * sx) as usize).min(self.width - 1);
            let src_y = (((y as f32 + 0.5) * sy) as usize).min(self.height - 1);
            self.is_foreground(src_x, src_y)
        })
    }

    /// Copy into the top-left corner of a larger all-background canvas.
    ///
    /// Content that does not fit is cropped.
    pub fn padded(&self, width: usize, height: usize) -> BinaryMask {
        let mut out = BinaryMask::new(width, height);
        let copy_w = self.width.min(width);
        for y in 0..self.height.min(height) {
            let src = &self.data[y * self.width..y * self.width + copy_w];
            out.data[y * width..y * width + copy_w].copy_from_slice(src);
        }
        out
    }
}

/// Inverted Otsu binarization: dark ink becomes foreground.
///
/// A constant image carries no ink, so it yields an all-background mask.
pub fn binarize_otsu(img: &GrayImageView<'_>) -> BinaryMask {
    let Some(t) = otsu_threshold(img.data) else {
        log::debug!(
            "constant {}x{} image, nothing to binarize",
            img.width,
            img.height
        );
        return BinaryMask::new(img.width, img.height);
    };
    BinaryMask {
        width: img.width,
        height: img.height,
        data: img.data.iter().map(|&v| u8::from(v <= t)).collect(),
    }
}
