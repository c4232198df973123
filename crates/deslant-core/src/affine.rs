use nalgebra::{Matrix2, Matrix2x3, Point2, Vector2};
use serde::{Deserialize, Serialize};

/// 2x3 affine map `p' = A p + t`, stored row-major as `[A | t]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AffineTransform {
    pub m: Matrix2x3<f32>,
}

impl AffineTransform {
    pub fn new(m: Matrix2x3<f32>) -> Self {
        Self { m }
    }

    pub fn identity() -> Self {
        Self::from_rows([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]])
    }

    pub fn from_rows(rows: [[f32; 3]; 2]) -> Self {
        Self::new(Matrix2x3::new(
            rows[0][0], rows[0][1], rows[0][2], //
            rows[1][0], rows[1][1], rows[1][2],
        ))
    }

    pub fn to_rows(&self) -> [[f32; 3]; 2] {
        [
            [self.m[(0, 0)], self.m[(0, 1)], self.m[(0, 2)]],
            [self.m[(1, 0)], self.m[(1, 1)], self.m[(1, 2)]],
        ]
    }

    // Written out term by term so the evaluation order is fixed; the WGSL
    // column kernel repeats the same expression.
    #[inline]
    pub fn apply(&self, p: Point2<f32>) -> Point2<f32> {
        let m = &self.m;
        Point2::new(
            m[(0, 0)] * p.x + m[(0, 1)] * p.y + m[(0, 2)],
            m[(1, 0)] * p.x + m[(1, 1)] * p.y + m[(1, 2)],
        )
    }

    pub fn inverse(&self) -> Option<Self> {
        let a = Matrix2::new(
            self.m[(0, 0)],
            self.m[(0, 1)],
            self.m[(1, 0)],
            self.m[(1, 1)],
        );
        let a_inv = a.try_inverse()?;
        let t = Vector2::new(self.m[(0, 2)], self.m[(1, 2)]);
        let t_inv = -(a_inv * t);
        Some(Self::from_rows([
            [a_inv[(0, 0)], a_inv[(0, 1)], t_inv.x],
            [a_inv[(1, 0)], a_inv[(1, 1)], t_inv.y],
        ]))
    }
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn inverse_round_trips_points() {
        let t = AffineTransform::from_rows([[1.2, 0.3, 5.0], [-0.1, 0.9, 2.0]]);
        let inv = t.inverse().expect("invertible");
        for p in [
            Point2::new(0.0_f32, 0.0),
            Point2::new(17.0, -4.0),
            Point2::new(320.0, 120.0),
        ] {
            let q = inv.apply(t.apply(p));
            assert_abs_diff_eq!(q.x, p.x, epsilon = 1e-3);
            assert_abs_diff_eq!(q.y, p.y, epsilon = 1e-3);
        }
    }

    #[test]
    fn singular_matrix_has_no_inverse() {
        let t = AffineTransform::from_rows([[1.0, 2.0, 0.0], [2.0, 4.0, 0.0]]);
        assert!(t.inverse().is_none());
    }
}
