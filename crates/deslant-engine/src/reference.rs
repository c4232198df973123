//! Sequential reference engine.
//!
//! Binarizes once, then renders and scores every shear hypothesis on the
//! host, one after another. Deterministic and single-threaded; the offload
//! backend is checked against it.

use deslant_core::{binarize_otsu, BinaryMask, GrayImageView};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::optimize::maximize_bounded;
use crate::{
    score_shear, DeslantEngine, DeslantError, InputError, Optimizer, SearchOutcome, SearchParams,
    ShearCandidates,
};

/// Host-side search engine.
#[derive(Clone, Debug)]
pub struct ReferenceEngine {
    params: SearchParams,
    candidates: ShearCandidates,
}

impl ReferenceEngine {
    pub fn new(params: SearchParams) -> Result<Self, InputError> {
        params.validate()?;
        let candidates = params.candidates()?;
        Ok(Self { params, candidates })
    }

    /// Grid search over an explicit candidate list.
    pub fn with_candidates(candidates: ShearCandidates) -> Self {
        Self {
            params: SearchParams {
                steps: candidates.len(),
                ..SearchParams::default()
            },
            candidates,
        }
    }

    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    pub fn candidates(&self) -> &ShearCandidates {
        &self.candidates
    }

    /// Search an already binarized image.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, mask), fields(width = mask.width, height = mask.height))
    )]
    pub fn search_mask(&self, mask: &BinaryMask) -> SearchOutcome {
        let outcome = match self.params.optimizer {
            Optimizer::Grid => {
                let scores: Vec<u64> = self
                    .candidates
                    .iter()
                    .map(|alpha| {
                        let score = score_shear(mask, alpha);
                        log::debug!("alpha={alpha:.4} score={score}");
                        score
                    })
                    .collect();
                SearchOutcome::from_scores(self.candidates.alphas(), &scores)
            }
            Optimizer::Powell => maximize_bounded(
                self.params.bounds,
                self.params.tolerance,
                self.params.max_evaluations,
                |alpha| score_shear(mask, alpha),
            ),
        };
        log::debug!(
            "{} search: {} evaluations, best alpha={:.4} score={}",
            self.params.optimizer.name(),
            outcome.candidates.len(),
            outcome.alpha(),
            outcome.score()
        );
        outcome
    }
}

impl Default for ReferenceEngine {
    fn default() -> Self {
        Self::with_candidates(ShearCandidates::default())
    }
}

impl DeslantEngine for ReferenceEngine {
    fn name(&self) -> &'static str {
        "reference"
    }

    fn search(&mut self, img: &GrayImageView<'_>) -> Result<SearchOutcome, DeslantError> {
        img.validate()?;
        let mask = binarize_otsu(img);
        Ok(self.search_mask(&mask))
    }
}
