use deslant_core::BinaryMask;

/// A mask laid out at the engine's fixed resolution.
///
/// The real content occupies the top-left `content_width x content_height`
/// region; everything else is background.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaddedMask {
    pub mask: BinaryMask,
    pub content_width: usize,
    pub content_height: usize,
}

impl PaddedMask {
    pub fn width(&self) -> usize {
        self.mask.width
    }

    pub fn height(&self) -> usize {
        self.mask.height
    }
}

/// Fit `mask` into a `width x height` canvas.
///
/// Masks larger than the canvas are down-scaled uniformly (nearest
/// neighbour), which keeps stroke slopes; the result is zero-padded at the
/// right and bottom.
pub fn fit_mask(mask: &BinaryMask, width: usize, height: usize) -> PaddedMask {
    let (mut cw, mut ch) = (mask.width, mask.height);
    let scaled;
    let content = if cw > width || ch > height {
        let scale = (width as f64 / cw as f64).min(height as f64 / ch as f64);
        cw = ((cw as f64 * scale).floor() as usize).clamp(1, width);
        ch = ((ch as f64 * scale).floor() as usize).clamp(1, height);
        log::warn!(
            "mask {}x{} exceeds offload resolution {width}x{height}, down-scaling to {cw}x{ch}",
            mask.width,
            mask.height
        );
        scaled = mask.resize_nearest(cw, ch);
        &scaled
    } else {
        mask
    };

    PaddedMask {
        mask: content.padded(width, height),
        content_width: cw,
        content_height: ch,
    }
}
