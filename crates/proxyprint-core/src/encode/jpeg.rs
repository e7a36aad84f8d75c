//! JPEG encoding for cropped outputs and embedded document images.

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};

use super::EncodeError;
use crate::decode::Raster;

/// Quality used for cropped card images written to disk.
pub const CROP_JPEG_QUALITY: u8 = 98;

/// Quality used when embedding cards in the print document.
pub const DOCUMENT_JPEG_QUALITY: u8 = 95;

/// Encode a raster to JPEG bytes.
///
/// `quality` is clamped to 1-100. Card art is mostly flat color and fine
/// text, so anything below ~90 shows ringing on the printed sheet.
pub fn encode_jpeg(raster: &Raster, quality: u8) -> Result<Vec<u8>, EncodeError> {
    super::check_raster(raster)?;

    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
        .write_image(
            &raster.pixels,
            raster.width,
            raster.height,
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(buffer)
}
