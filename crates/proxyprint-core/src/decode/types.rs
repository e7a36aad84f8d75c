//! Core types for reading card images.

use thiserror::Error;

/// Error types for image reading operations.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The file extension is not one the cropper accepts.
    #[error("Unsupported image type: {0}")]
    Unsupported(String),

    /// The image bytes are corrupted or incomplete.
    #[error("Corrupted or incomplete image file: {0}")]
    CorruptedFile(String),

    /// I/O error during file reading.
    #[error("I/O error: {0}")]
    IoError(String),

    /// A requested width or height is zero.
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// A buffer does not match its declared dimensions.
    #[error("Pixel buffer holds {actual} bytes, expected {expected}")]
    BufferMismatch { expected: usize, actual: usize },
}

/// Interpolation filter for resampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterType {
    /// Bilinear interpolation, used for previews.
    #[default]
    Bilinear,
    /// Bicubic (Catmull-Rom) interpolation, used when capping print DPI.
    Cubic,
}

impl FilterType {
    /// Convert to the image crate's FilterType.
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            FilterType::Bilinear => image::imageops::FilterType::Triangle,
            FilterType::Cubic => image::imageops::FilterType::CatmullRom,
        }
    }
}

/// EXIF orientation values (1-8).
///
/// Phone scans of cards frequently carry a rotation tag instead of rotated
/// pixels; it has to be applied before any border math runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Orientation {
    #[default]
    Normal = 1,
    FlipHorizontal = 2,
    Rotate180 = 3,
    FlipVertical = 4,
    Transpose = 5,
    Rotate90CW = 6,
    Transverse = 7,
    Rotate270CW = 8,
}

impl From<u32> for Orientation {
    fn from(value: u32) -> Self {
        match value {
            2 => Orientation::FlipHorizontal,
            3 => Orientation::Rotate180,
            4 => Orientation::FlipVertical,
            5 => Orientation::Transpose,
            6 => Orientation::Rotate90CW,
            7 => Orientation::Transverse,
            8 => Orientation::Rotate270CW,
            _ => Orientation::Normal,
        }
    }
}

/// An RGB raster held in memory between pipeline stages.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGB bytes in row-major order, `width * height * 3` long.
    pub pixels: Vec<u8>,
}

impl Raster {
    /// Wrap an existing RGB buffer, checking its length.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, DecodeError> {
        let expected = (width as usize) * (height as usize) * 3;
        if pixels.len() != expected {
            return Err(DecodeError::BufferMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A raster filled with one color.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let pixels = rgb
            .iter()
            .copied()
            .cycle()
            .take((width as usize) * (height as usize) * 3)
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Take ownership of an `image::RgbImage`.
    pub fn from_rgb_image(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            pixels: img.into_raw(),
        }
    }

    /// Consume into an `image::RgbImage`.
    pub fn into_rgb_image(self) -> image::RgbImage {
        let (width, height) = (self.width, self.height);
        // Length is checked on every constructor.
        image::RgbImage::from_raw(width, height, self.pixels)
            .unwrap_or_else(|| image::RgbImage::new(width, height))
    }

    /// Borrowing conversion to an `image::RgbImage`.
    pub fn to_rgb_image(&self) -> image::RgbImage {
        self.clone().into_rgb_image()
    }

    /// `(width, height)` in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// RGB value at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let idx = ((y as usize) * (self.width as usize) + x as usize) * 3;
        [self.pixels[idx], self.pixels[idx + 1], self.pixels[idx + 2]]
    }

    /// Check if this raster has no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_type_conversion() {
        assert!(matches!(
            FilterType::Bilinear.to_image_filter(),
            image::imageops::FilterType::Triangle
        ));
        assert!(matches!(
            FilterType::Cubic.to_image_filter(),
            image::imageops::FilterType::CatmullRom
        ));
    }

    #[test]
    fn test_orientation_from_u32() {
        assert_eq!(Orientation::from(1), Orientation::Normal);
        assert_eq!(Orientation::from(6), Orientation::Rotate90CW);
        assert_eq!(Orientation::from(0), Orientation::Normal);
        assert_eq!(Orientation::from(42), Orientation::Normal);
    }

    #[test]
    fn test_raster_new_checks_length() {
        assert!(Raster::new(2, 2, vec![0; 12]).is_ok());
        assert!(matches!(
            Raster::new(2, 2, vec![0; 11]),
            Err(DecodeError::BufferMismatch {
                expected: 12,
                actual: 11
            })
        ));
    }

    #[test]
    fn test_raster_filled() {
        let raster = Raster::filled(3, 2, [10, 20, 30]);
        assert_eq!(raster.pixels.len(), 18);
        assert_eq!(raster.pixel(2, 1), [10, 20, 30]);
        assert!(!raster.is_empty());
    }

    #[test]
    fn test_raster_rgb_image_conversion() {
        let raster = Raster::filled(4, 5, [1, 2, 3]);
        let img = raster.to_rgb_image();
        assert_eq!(img.dimensions(), (4, 5));
        assert_eq!(Raster::from_rgb_image(img), raster);
    }

    #[test]
    fn test_decode_error_display() {
        let err = DecodeError::Unsupported("tiff".to_string());
        assert_eq!(err.to_string(), "Unsupported image type: tiff");
    }
}
