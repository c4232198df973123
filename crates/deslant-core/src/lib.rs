//! Core image types and primitives for text deslanting.
//!
//! This crate is intentionally small. It owns the grayscale image types, the
//! Otsu binarizer and the shear renderer. It does *not* decide which shear
//! factor to apply; that is the job of `deslant-engine`.

mod affine;
mod image;
mod logger;
mod mask;
mod shear;
mod threshold;

pub use affine::AffineTransform;
pub use image::{sample_bilinear, sample_bilinear_u8, GrayImage, GrayImageView, ImageError};
pub use mask::{binarize_otsu, BinaryMask};
pub use shear::ShearTransform;
pub use threshold::otsu_threshold;

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_level, level_from_verbosity};
