use serde::{Deserialize, Serialize};

use crate::{InputError, ShearBounds, ShearCandidates};

/// How the shear interval is explored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Optimizer {
    /// Score every value of the evenly spaced candidate set.
    #[default]
    Grid,
    /// Derivative-free bounded search (Powell / Brent line minimisation).
    Powell,
}

impl Optimizer {
    pub fn name(&self) -> &'static str {
        match self {
            Optimizer::Grid => "grid",
            Optimizer::Powell => "powell",
        }
    }
}

/// Search configuration shared by all engines.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    pub bounds: ShearBounds,
    /// Number of grid points (grid optimizer only).
    pub steps: usize,
    pub optimizer: Optimizer,
    /// Absolute tolerance on the shear factor (powell optimizer only).
    pub tolerance: f32,
    /// Evaluation budget (powell optimizer only).
    pub max_evaluations: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            bounds: ShearBounds::default(),
            steps: ShearCandidates::DEFAULT_STEPS,
            optimizer: Optimizer::Grid,
            tolerance: 1e-3,
            max_evaluations: 64,
        }
    }
}

impl SearchParams {
    pub fn with_bounds(bounds: ShearBounds) -> Self {
        Self {
            bounds,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), InputError> {
        self.bounds.validate()?;
        if self.optimizer == Optimizer::Powell {
            if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
                return Err(InputError::Config(format!(
                    "powell tolerance must be positive (got {})",
                    self.tolerance
                )));
            }
            if self.max_evaluations < 2 {
                return Err(InputError::Config(format!(
                    "powell needs at least 2 evaluations (got {})",
                    self.max_evaluations
                )));
            }
        }
        Ok(())
    }

    /// Grid candidate set described by `bounds` and `steps`.
    pub fn candidates(&self) -> Result<ShearCandidates, InputError> {
        ShearCandidates::evenly_spaced(self.bounds, self.steps)
    }
}

/// One evaluated shear hypothesis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub alpha: f32,
    pub score: u64,
}

/// Every evaluated hypothesis plus the index of the winner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub candidates: Vec<Candidate>,
    pub best: usize,
}

impl SearchOutcome {
    /// Pair each alpha with its score and pick the winner.
    pub fn from_scores(alphas: &[f32], scores: &[u64]) -> Self {
        debug_assert_eq!(alphas.len(), scores.len());
        let candidates = alphas
            .iter()
            .zip(scores)
            .map(|(&alpha, &score)| Candidate { alpha, score })
            .collect();
        Self::from_candidates(candidates)
    }

    pub fn from_candidates(candidates: Vec<Candidate>) -> Self {
        let best = select_best(&candidates);
        Self { candidates, best }
    }

    pub fn best_candidate(&self) -> Candidate {
        self.candidates[self.best]
    }

    /// Winning shear factor.
    pub fn alpha(&self) -> f32 {
        self.best_candidate().alpha
    }

    pub fn score(&self) -> u64 {
        self.best_candidate().score
    }

    pub fn scores(&self) -> Vec<u64> {
        self.candidates.iter().map(|c| c.score).collect()
    }
}

/// Index of the highest-scoring candidate.
///
/// Scanning uses a strict `>`, so among equal maxima the earliest candidate
/// wins. When nothing scores above zero (a blank page) the candidate closest
/// to zero shear is returned instead, again preferring the earliest on ties.
pub fn select_best(candidates: &[Candidate]) -> usize {
    let mut best: Option<(usize, u64)> = None;
    for (i, c) in candidates.iter().enumerate() {
        if c.score > best.map_or(0, |(_, s)| s) {
            best = Some((i, c.score));
        }
    }
    match best {
        Some((i, _)) => i,
        None => neutral_index(candidates),
    }
}

fn neutral_index(candidates: &[Candidate]) -> usize {
    let mut best = 0;
    for (i, c) in candidates.iter().enumerate() {
        if c.alpha.abs() < candidates[best].alpha.abs() {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(scores: &[u64]) -> SearchOutcome {
        SearchOutcome::from_scores(ShearCandidates::default().alphas(), scores)
    }

    #[test]
    fn highest_score_wins() {
        let o = outcome(&[1, 5, 2, 9, 3, 0, 0, 0, 0]);
        assert_eq!(o.best, 3);
        assert_eq!(o.alpha(), -0.25);
        assert_eq!(o.score(), 9);
    }

    #[test]
    fn ties_go_to_the_earlier_candidate() {
        let o = outcome(&[0, 0, 40, 0, 0, 0, 40, 0, 0]);
        assert_eq!(o.best, 2);
        assert_eq!(o.alpha(), -0.5);
    }

    #[test]
    fn blank_page_falls_back_to_zero_shear() {
        let o = outcome(&[0; 9]);
        assert_eq!(o.best, 4);
        assert_eq!(o.alpha(), 0.0);
    }

    #[test]
    fn blank_page_without_zero_candidate_uses_closest() {
        let c = [
            Candidate { alpha: 0.5, score: 0 },
            Candidate { alpha: -0.25, score: 0 },
            Candidate { alpha: 0.25, score: 0 },
        ];
        assert_eq!(select_best(&c), 1);
    }

    #[test]
    fn params_round_trip_through_json() {
        let params = SearchParams {
            optimizer: Optimizer::Powell,
            steps: 21,
            ..SearchParams::default()
        };
        let json = serde_json::to_string(&params).unwrap();
        assert!(json.contains("\"powell\""));
        let back: SearchParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);

        let partial: SearchParams = serde_json::from_str(r#"{"steps": 5}"#).unwrap();
        assert_eq!(partial.steps, 5);
        assert_eq!(partial.bounds, ShearBounds::default());
    }
}
