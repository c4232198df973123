//! Horizontal shear rendering.
//!
//! A shear factor `alpha` maps `(x, y) -> (x + alpha * y + shift_x, y)` with
//! `shift_x = max(-alpha * H, 0)`, so every mapped x is non-negative. The
//! output canvas is `W + ceil(|alpha * H|)` wide and `H` tall.

use nalgebra::Point2;

use crate::{sample_bilinear_u8, AffineTransform, BinaryMask, GrayImage, GrayImageView};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShearTransform {
    alpha: f32,
    shift_x: f32,
    src_width: usize,
    src_height: usize,
    out_width: usize,
    forward: AffineTransform,
    inverse: AffineTransform,
}

impl ShearTransform {
    pub fn new(alpha: f32, width: usize, height: usize) -> Self {
        let h = height as f32;
        let shift_x = (-alpha * h).max(0.0);
        let out_width = width + (alpha * h).abs().ceil() as usize;
        Self {
            alpha,
            shift_x,
            src_width: width,
            src_height: height,
            out_width,
            forward: AffineTransform::from_rows([[1.0, alpha, shift_x], [0.0, 1.0, 0.0]]),
            inverse: AffineTransform::from_rows([[1.0, -alpha, -shift_x], [0.0, 1.0, 0.0]]),
        }
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn shift_x(&self) -> f32 {
        self.shift_x
    }

    pub fn input_size(&self) -> (usize, usize) {
        (self.src_width, self.src_height)
    }

    /// `(width, height)` of the sheared canvas.
    pub fn output_size(&self) -> (usize, usize) {
        (self.out_width, self.src_height)
    }

    /// Source -> canvas map.
    pub fn matrix(&self) -> &AffineTransform {
        &self.forward
    }

    /// Canvas -> source map used for resampling.
    pub fn inverse_matrix(&self) -> &AffineTransform {
        &self.inverse
    }

    /// Source x coordinate sampled by canvas pixel `(x, y)`.
    #[inline]
    pub fn source_x(&self, x: usize, y: usize) -> f32 {
        self.inverse.apply(Point2::new(x as f32, y as f32)).x
    }

    /// Nearest-neighbour shear of a mask; exposed canvas stays background.
    pub fn warp_nearest(&self, mask: &BinaryMask) -> BinaryMask {
        debug_assert_eq!((mask.width, mask.height), self.input_size());
        let (out_w, out_h) = self.output_size();
        let src_w = mask.width as f32;
        let mut out = BinaryMask::new(out_w, out_h);
        for y in 0..out_h.min(mask.height) {
            for x in 0..out_w {
                let sx = (self.source_x(x, y) + 0.5).floor();
                if sx < 0.0 || sx >= src_w {
                    continue;
                }
                if mask.is_foreground(sx as usize, y) {
                    out.set(x, y, true);
                }
            }
        }
        out
    }

    /// Bilinear shear of a grayscale image; exposed canvas is filled with `bg`.
    pub fn warp_linear(&self, src: &GrayImageView<'_>, bg: u8) -> GrayImage {
        debug_assert_eq!((src.width, src.height), self.input_size());
        let (out_w, out_h) = self.output_size();
        let mut out = GrayImage::filled(out_w, out_h, bg);
        for y in 0..out_h {
            for x in 0..out_w {
                let p = self.inverse.apply(Point2::new(x as f32, y as f32));
                out.set(x, y, sample_bilinear_u8(src, p.x, p.y, bg));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn canvas_grows_by_ceil_of_offset() {
        for (alpha, expected_w) in [(0.0, 50), (0.25, 58), (-0.25, 58), (1.0, 80), (-0.75, 73)] {
            let t = ShearTransform::new(alpha, 50, 30);
            assert_eq!(t.output_size(), (expected_w, 30), "alpha={alpha}");
        }
        assert_eq!(ShearTransform::new(0.1, 10, 25).output_size(), (13, 25));
    }

    #[test]
    fn mapped_coordinates_are_non_negative() {
        for alpha in [-1.0f32, -0.5, 0.0, 0.5, 1.0] {
            let t = ShearTransform::new(alpha, 20, 40);
            for (x, y) in [(0.0, 0.0), (0.0, 39.0), (19.0, 0.0), (19.0, 39.0)] {
                let p = t.matrix().apply(Point2::new(x, y));
                assert!(p.x >= 0.0, "alpha={alpha} maps ({x},{y}) to {}", p.x);
                assert!(p.x < t.output_size().0 as f32);
            }
        }
    }

    #[test]
    fn inverse_matches_forward_inverse() {
        let t = ShearTransform::new(-0.75, 64, 32);
        let inv = t.matrix().inverse().expect("shear is invertible");
        for (a, b) in inv.to_rows().iter().zip(t.inverse_matrix().to_rows().iter()) {
            for (u, v) in a.iter().zip(b.iter()) {
                assert_abs_diff_eq!(u, v, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn nearest_shear_straightens_a_slanted_line() {
        // x = 10 - y is a line leaning right; alpha = 1 makes it vertical.
        let mask = BinaryMask::from_fn(12, 10, |x, y| x + y == 10);
        let t = ShearTransform::new(1.0, 12, 10);
        let out = t.warp_nearest(&mask);
        assert_eq!(out.width, 22);
        assert_eq!(out.count_foreground(), 10);
        assert!((0..10).all(|y| out.is_foreground(10, y)));
    }

    #[test]
    fn linear_shear_fills_exposed_canvas() {
        let src = GrayImage::filled(4, 4, 0);
        let t = ShearTransform::new(0.5, 4, 4);
        let out = t.warp_linear(&src.view(), 255);
        assert_eq!((out.width, out.height), (6, 4));
        // Row 0 is unshifted: columns 0..4 are ink, the rest is background.
        assert_eq!(out.get(0, 0), 0);
        assert_eq!(out.get(5, 0), 255);
        // Row 2 moves right by one pixel.
        assert_eq!(out.get(0, 2), 255);
        assert_eq!(out.get(1, 2), 0);
    }

    #[test]
    fn zero_shear_is_identity() {
        let src = GrayImage {
            width: 3,
            height: 2,
            data: vec![1, 2, 3, 4, 5, 6],
        };
        let out = ShearTransform::new(0.0, 3, 2).warp_linear(&src.view(), 255);
        assert_eq!(out, src);
    }
}
