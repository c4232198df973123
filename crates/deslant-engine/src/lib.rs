//! Deslant-angle search.
//!
//! A binarized text image is sheared by every candidate factor `alpha`; each
//! sheared mask is scored by how many of its columns hold one unbroken
//! vertical run of ink, and the best-scoring `alpha` wins.
//!
//! This crate holds the backend-independent pieces (candidate sets, the
//! column score, tie-breaking) and the sequential [`ReferenceEngine`]. Other
//! backends implement [`DeslantEngine`] and reuse [`select_best`] so that
//! every backend breaks ties the same way.
//!
//! ```
//! use deslant_core::GrayImage;
//! use deslant_engine::{deslant_with, ReferenceEngine};
//!
//! let mut img = GrayImage::filled(40, 20, 255);
//! for y in 0..20 {
//!     img.set(30 - y / 2, y, 0);
//! }
//! let mut engine = ReferenceEngine::default();
//! let out = deslant_with(&mut engine, &img.view(), 255).unwrap();
//! assert!(out.image.width >= img.width);
//! ```

mod candidates;
mod engine;
mod error;
pub mod optimize;
mod reference;
mod score;
mod search;

pub use candidates::{ShearBounds, ShearCandidates};
pub use engine::{deslant_with, DeslantEngine, Deslanted};
pub use error::{DeslantError, InputError};
pub use reference::ReferenceEngine;
pub use score::{column_score, score_mask, score_shear};
pub use search::{select_best, Candidate, Optimizer, SearchOutcome, SearchParams};
