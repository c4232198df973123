//! Conversions between the `image` crate and the workspace image types.

use ::image::{DynamicImage, GrayImage as LumaImage};

use deslant_core::{GrayImage, GrayImageView, ImageError};
use deslant_engine::{DeslantError, InputError, ShearBounds};

/// Borrow an `image::GrayImage` as a [`GrayImageView`].
pub fn gray_view(img: &LumaImage) -> GrayImageView<'_> {
    GrayImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Borrow a decoded image, accepting only single-channel 8-bit data.
pub fn luma_view(img: &DynamicImage) -> Result<GrayImageView<'_>, InputError> {
    match img {
        DynamicImage::ImageLuma8(gray) => Ok(gray_view(gray)),
        other => Err(InputError::ChannelCount {
            channels: other.color().channel_count(),
        }),
    }
}

/// Decoded image as 8-bit gray; other color types are converted.
pub fn into_luma(img: DynamicImage) -> DynamicImage {
    match img {
        gray @ DynamicImage::ImageLuma8(_) => gray,
        other => {
            log::debug!("converting {:?} image to 8-bit gray", other.color());
            DynamicImage::ImageLuma8(other.to_luma8())
        }
    }
}

/// Move a [`GrayImage`] into an `image::GrayImage`.
pub fn to_image(img: GrayImage) -> Result<LumaImage, ImageError> {
    img.view().validate()?;
    let expected = img.width * img.height;
    let got = img.data.len();
    LumaImage::from_raw(img.width as u32, img.height as u32, img.data)
        .ok_or(ImageError::BufferLength { expected, got })
}

/// [`deslant`](crate::deslant) on `image` crate buffers.
pub fn deslant_image(
    img: &LumaImage,
    bg: u8,
    bounds: ShearBounds,
) -> Result<LumaImage, DeslantError> {
    let out = crate::deslant(&gray_view(img), bg, bounds)?;
    Ok(to_image(out)?)
}
