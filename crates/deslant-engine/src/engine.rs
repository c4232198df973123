use deslant_core::{GrayImage, GrayImageView, ShearTransform};

use crate::{DeslantError, SearchOutcome};

/// A backend that searches for the shear factor which best uprights the ink
/// of a grayscale image.
///
/// Implementations binarize the image themselves; the caller only hands over
/// the raw grayscale view. The view is never retained beyond the call.
pub trait DeslantEngine {
    /// Short backend identifier used in logs and reports.
    fn name(&self) -> &'static str;

    fn search(&mut self, img: &GrayImageView<'_>) -> Result<SearchOutcome, DeslantError>;
}

impl<E: DeslantEngine + ?Sized> DeslantEngine for Box<E> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn search(&mut self, img: &GrayImageView<'_>) -> Result<SearchOutcome, DeslantError> {
        (**self).search(img)
    }
}

/// Upright image together with the search that produced it.
#[derive(Clone, Debug)]
pub struct Deslanted {
    pub image: GrayImage,
    pub outcome: SearchOutcome,
    pub transform: ShearTransform,
}

impl Deslanted {
    pub fn alpha(&self) -> f32 {
        self.outcome.alpha()
    }
}

/// Search with `engine`, then shear the original image by the winning factor
/// using bilinear interpolation. Exposed canvas is filled with `bg`.
pub fn deslant_with<E: DeslantEngine + ?Sized>(
    engine: &mut E,
    img: &GrayImageView<'_>,
    bg: u8,
) -> Result<Deslanted, DeslantError> {
    img.validate()?;
    let outcome = engine.search(img)?;
    let transform = ShearTransform::new(outcome.alpha(), img.width, img.height);
    let image = transform.warp_linear(img, bg);
    log::info!(
        "{}: alpha={:.4} score={} {}x{} -> {}x{}",
        engine.name(),
        outcome.alpha(),
        outcome.score(),
        img.width,
        img.height,
        image.width,
        image.height,
    );
    Ok(Deslanted {
        image,
        outcome,
        transform,
    })
}
