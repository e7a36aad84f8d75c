//! Image encoding for cropped outputs, previews and document embedding.
//!
//! Cropped cards keep the container format of their source file: JPEG
//! sources are re-encoded as high quality JPEG, PNG and GIF sources stay
//! lossless.

mod jpeg;
mod png;

use std::path::Path;

use image::ImageFormat;
use thiserror::Error;

use crate::decode::Raster;

pub use jpeg::{encode_jpeg, CROP_JPEG_QUALITY, DOCUMENT_JPEG_QUALITY};
pub use png::encode_png;

/// Errors that can occur during encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 3), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The target path has no extension the encoder understands
    #[error("No encoder for output file: {0}")]
    UnknownFormat(String),

    /// The encoder itself failed
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),

    /// Writing the encoded bytes failed
    #[error("Write failed: {0}")]
    WriteFailed(String),
}

fn check_raster(raster: &Raster) -> Result<(), EncodeError> {
    if raster.width == 0 || raster.height == 0 {
        return Err(EncodeError::InvalidDimensions {
            width: raster.width,
            height: raster.height,
        });
    }
    let expected = (raster.width as usize) * (raster.height as usize) * 3;
    if raster.pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: raster.pixels.len(),
        });
    }
    Ok(())
}

/// Write a raster to `path`, choosing the format from its extension.
pub fn write_image(raster: &Raster, path: &Path) -> Result<(), EncodeError> {
    let format = ImageFormat::from_path(path)
        .map_err(|_| EncodeError::UnknownFormat(path.display().to_string()))?;

    match format {
        ImageFormat::Jpeg => {
            let bytes = encode_jpeg(raster, CROP_JPEG_QUALITY)?;
            std::fs::write(path, bytes).map_err(|e| EncodeError::WriteFailed(e.to_string()))
        }
        ImageFormat::Png => {
            let bytes = encode_png(raster)?;
            std::fs::write(path, bytes).map_err(|e| EncodeError::WriteFailed(e.to_string()))
        }
        ImageFormat::Gif => {
            check_raster(raster)?;
            raster
                .to_rgb_image()
                .save_with_format(path, ImageFormat::Gif)
                .map_err(|e| EncodeError::EncodingFailed(e.to_string()))
        }
        _ => Err(EncodeError::UnknownFormat(path.display().to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_image_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let raster = Raster::filled(12, 10, [30, 60, 90]);

        for name in ["card.png", "card.jpg", "card.jpeg", "card.gif"] {
            let path = dir.path().join(name);
            write_image(&raster, &path).unwrap();
            let back = image::open(&path).unwrap();
            assert_eq!((back.width(), back.height()), (12, 10), "{name}");
        }
    }

    #[test]
    fn test_write_image_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let raster = Raster::filled(2, 2, [0, 0, 0]);
        assert!(matches!(
            write_image(&raster, &dir.path().join("card.xyz")),
            Err(EncodeError::UnknownFormat(_))
        ));
    }
}
