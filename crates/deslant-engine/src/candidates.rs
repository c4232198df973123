use serde::{Deserialize, Serialize};

use crate::InputError;

/// Closed interval `[lower, upper]` searched for the shear factor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShearBounds {
    pub lower: f32,
    pub upper: f32,
}

impl ShearBounds {
    pub fn new(lower: f32, upper: f32) -> Result<Self, InputError> {
        let bounds = Self { lower, upper };
        bounds.validate()?;
        Ok(bounds)
    }

    pub fn validate(&self) -> Result<(), InputError> {
        if !self.lower.is_finite() || !self.upper.is_finite() || self.lower > self.upper {
            return Err(InputError::Bounds {
                lower: self.lower,
                upper: self.upper,
            });
        }
        Ok(())
    }

    /// `0.0` clamped into the interval: the shear that changes the least.
    pub fn neutral(&self) -> f32 {
        0.0f32.clamp(self.lower, self.upper)
    }

    pub fn contains(&self, alpha: f32) -> bool {
        (self.lower..=self.upper).contains(&alpha)
    }
}

impl Default for ShearBounds {
    fn default() -> Self {
        Self {
            lower: -1.0,
            upper: 1.0,
        }
    }
}

/// Ordered, immutable set of shear hypotheses.
///
/// Built once before a search starts; there is no API to change it afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct ShearCandidates {
    alphas: Vec<f32>,
}

impl ShearCandidates {
    pub const DEFAULT_STEPS: usize = 9;

    /// `steps` values evenly spaced over `bounds`, both ends included.
    ///
    /// A single step collapses to the lower bound.
    pub fn evenly_spaced(bounds: ShearBounds, steps: usize) -> Result<Self, InputError> {
        bounds.validate()?;
        if steps == 0 {
            return Err(InputError::CandidateCount { count: 0 });
        }
        if steps == 1 {
            return Ok(Self {
                alphas: vec![bounds.lower],
            });
        }
        let step = (bounds.upper - bounds.lower) / (steps - 1) as f32;
        let alphas = (0..steps)
            .map(|i| {
                if i + 1 == steps {
                    bounds.upper
                } else {
                    bounds.lower + step * i as f32
                }
            })
            .collect();
        Ok(Self { alphas })
    }

    pub fn alphas(&self) -> &[f32] {
        &self.alphas
    }

    pub fn len(&self) -> usize {
        self.alphas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alphas.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        self.alphas.iter().copied()
    }

    /// Largest `|alpha|`; sizes the widest sheared canvas.
    pub fn max_abs(&self) -> f32 {
        self.alphas.iter().fold(0.0f32, |m, a| m.max(a.abs()))
    }
}

impl Default for ShearCandidates {
    fn default() -> Self {
        let step = 0.25f32;
        Self {
            alphas: (0..Self::DEFAULT_STEPS)
                .map(|i| -1.0 + step * i as f32)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_set_matches_nine_quarter_steps() {
        let expected = [-1.0, -0.75, -0.5, -0.25, 0.0, 0.25, 0.5, 0.75, 1.0];
        assert_eq!(ShearCandidates::default().alphas(), &expected);
        let built = ShearCandidates::evenly_spaced(ShearBounds::default(), 9).expect("grid");
        assert_eq!(built.alphas(), &expected);
    }

    #[test]
    fn endpoints_are_exact() {
        let c = ShearCandidates::evenly_spaced(ShearBounds::new(-2.0, 0.7).unwrap(), 7).unwrap();
        assert_eq!(c.len(), 7);
        assert_eq!(c.alphas()[0], -2.0);
        assert_eq!(c.alphas()[6], 0.7);
        assert!(c.alphas().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn rejects_inverted_or_non_finite_bounds() {
        assert!(ShearBounds::new(1.0, -1.0).is_err());
        assert!(ShearBounds::new(f32::NAN, 1.0).is_err());
        assert!(ShearCandidates::evenly_spaced(ShearBounds::default(), 0).is_err());
    }

    #[test]
    fn neutral_is_clamped_zero() {
        assert_eq!(ShearBounds::default().neutral(), 0.0);
        assert_eq!(ShearBounds::new(0.5, 2.0).unwrap().neutral(), 0.5);
        assert_eq!(ShearBounds::new(-2.0, -0.5).unwrap().neutral(), -0.5);
    }
}
