use image::imageops::{self, FilterType};
use image::GrayImage;

use crate::config::DimensionPolicy;
use crate::error::{DetectorError, ImageRole, Result};

/// Decode encoded image bytes and reduce them to 8-bit luma.
pub fn decode_grayscale(bytes: &[u8], role: ImageRole) -> Result<GrayImage> {
    if bytes.is_empty() {
        return Err(DetectorError::EmptyImage { role });
    }

    let img = image::load_from_memory(bytes)
        .map_err(|source| DetectorError::Decode { role, source })?;
    Ok(img.to_luma8())
}

pub fn validate_image_size(img: &GrayImage, role: ImageRole, min_size: u32, max_size: u32) -> Result<()> {
    let (width, height) = img.dimensions();

    if width < min_size || height < min_size {
        return Err(DetectorError::ImageTooSmall {
            role,
            width,
            height,
            min: min_size,
        });
    }

    if width > max_size || height > max_size {
        return Err(DetectorError::ImageTooLarge {
            role,
            width,
            height,
            max: max_size,
        });
    }

    Ok(())
}

/// Bring the upload to the reference dimensions according to `policy`.
///
/// Returns the image to compare and whether it was resampled.
pub fn match_dimensions(
    reference: &GrayImage,
    uploaded: GrayImage,
    policy: DimensionPolicy,
) -> Result<(GrayImage, bool)> {
    let (ref_w, ref_h) = reference.dimensions();
    let (up_w, up_h) = uploaded.dimensions();

    if (ref_w, ref_h) == (up_w, up_h) {
        return Ok((uploaded, false));
    }

    match policy {
        DimensionPolicy::Resize => Ok((
            imageops::resize(&uploaded, ref_w, ref_h, FilterType::Triangle),
            true,
        )),
        DimensionPolicy::Reject => Err(DetectorError::DimensionMismatch {
            reference_width: ref_w,
            reference_height: ref_h,
            uploaded_width: up_w,
            uploaded_height: up_h,
        }),
    }
}
