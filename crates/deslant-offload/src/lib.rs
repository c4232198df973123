//! wgpu compute backend for the deslant-angle search.
//!
//! The binarized image is fitted to a fixed resolution, uploaded once per
//! image, and scored for every candidate shear by two WGSL kernels:
//!
//! 1. `process_columns` shears and scores one canvas column per invocation
//!    and reduces each workgroup's scores into a partial sum,
//! 2. `sum_columns` folds the partial sums of each candidate into a total.
//!
//! The host picks the winner with the same tie-breaking as the reference
//! engine, so for images within the configured resolution both backends
//! select the same shear.
//!
//! Device tests need a GPU adapter and are ignored by default; run them with
//! `cargo test -p deslant-offload -- --ignored`.

mod buffers;
mod config;
mod engine;
mod fit;
mod kernels;

pub use config::OffloadConfig;
pub use engine::{EngineState, OffloadEngine};
pub use fit::{fit_mask, PaddedMask};
