//! Column "uprightness" score.
//!
//! For every column of a sheared mask: with `h` foreground pixels spanning
//! `d = last - first + 1` rows, the column contributes `h * h` when `h == d`
//! (one unbroken vertical run) and nothing otherwise. The score of a shear
//! hypothesis is the sum over all columns.

use deslant_core::{BinaryMask, ShearTransform};

#[cfg(feature = "tracing")]
use tracing::instrument;

pub fn column_score(mask: &BinaryMask, x: usize) -> u64 {
    let mut count = 0u64;
    let mut first = 0usize;
    let mut last = 0usize;
    for y in 0..mask.height {
        if mask.is_foreground(x, y) {
            if count == 0 {
                first = y;
            }
            last = y;
            count += 1;
        }
    }
    if count == 0 {
        return 0;
    }
    let span = (last - first + 1) as u64;
    if count == span {
        count * count
    } else {
        0
    }
}

pub fn score_mask(mask: &BinaryMask) -> u64 {
    (0..mask.width).map(|x| column_score(mask, x)).sum()
}

/// Shear `mask` by `alpha` (nearest neighbour) and score the result.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "trace", skip(mask), fields(width = mask.width, height = mask.height))
)]
pub fn score_shear(mask: &BinaryMask, alpha: f32) -> u64 {
    let transform = ShearTransform::new(alpha, mask.width, mask.height);
    score_mask(&transform.warp_nearest(mask))
}
