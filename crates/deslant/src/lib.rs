//! Remove the slant (italic skew) of text lines before recognition.
//!
//! This crate provides:
//! - stable re-exports of the `deslant-*` crates
//! - [`deslant`], the one-call entry point on the sequential reference engine
//! - [`build_engine`] to pick a backend from a [`DeslantConfig`]
//! - (feature `image`) conversions from and to `image::GrayImage`
//!
//! ## Quickstart
//!
//! ```no_run
//! use deslant::{convert, deslant, ShearBounds};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let img = image::open("line.png")?.to_luma8();
//! let upright = deslant(&convert::gray_view(&img), 255, ShearBounds::default())?;
//! convert::to_image(upright)?.save("line_deslanted.png")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `deslant::core`: grayscale images, Otsu binarization, shear rendering.
//! - `deslant::engine`: column score, candidate sets, reference engine.
//! - `deslant::offload` (feature `offload`): wgpu compute engine.
//! - `deslant::io`: JSON config and per-image reports.

pub use deslant_core as core;
pub use deslant_engine as engine;
#[cfg(feature = "offload")]
pub use deslant_offload as offload;

pub use deslant_core::{GrayImage, GrayImageView, ShearTransform};
pub use deslant_engine::{
    deslant_with, Candidate, DeslantEngine, DeslantError, Deslanted, InputError, Optimizer,
    ReferenceEngine, SearchOutcome, SearchParams, ShearBounds,
};

mod backend;
pub mod io;

#[cfg(feature = "image")]
pub mod convert;

pub use backend::{build_engine, Backend};
pub use io::{DeslantConfig, DeslantIoError, DeslantReport, ImageReport};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Deslant `img` with the reference engine, searching the default nine
/// evenly spaced shears over `bounds`. Exposed canvas is filled with `bg`.
///
/// A page without ink is returned unsheared.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(img), fields(width = img.width, height = img.height))
)]
pub fn deslant(
    img: &GrayImageView<'_>,
    bg: u8,
    bounds: ShearBounds,
) -> Result<GrayImage, DeslantError> {
    let mut engine = ReferenceEngine::new(SearchParams::with_bounds(bounds))?;
    Ok(deslant_with(&mut engine, img, bg)?.image)
}
