//! Resampling for DPI capping and preview generation.
//!
//! All functions return new rasters without modifying the input.

use super::{DecodeError, FilterType, Raster};

/// Resize a raster to exact dimensions.
///
/// # Errors
///
/// Returns `DecodeError::InvalidDimensions` when a target dimension is zero.
pub fn resize(
    raster: &Raster,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<Raster, DecodeError> {
    if width == 0 || height == 0 {
        return Err(DecodeError::InvalidDimensions { width, height });
    }

    if raster.dimensions() == (width, height) {
        return Ok(raster.clone());
    }

    let resized = image::imageops::resize(
        &raster.to_rgb_image(),
        width,
        height,
        filter.to_image_filter(),
    );
    Ok(Raster::from_rgb_image(resized))
}

/// Scale both axes by `ratio`, rounding each to the nearest pixel.
pub fn scale_by(raster: &Raster, ratio: f64, filter: FilterType) -> Result<Raster, DecodeError> {
    let (width, height) = scaled_dimensions(raster.width, raster.height, ratio);
    resize(raster, width, height, filter)
}

/// Scale to a fixed width, keeping the aspect ratio.
///
/// Unlike a fit-to-box thumbnail this also upscales narrow images, so every
/// preview in a grid shares one width.
pub fn scale_to_width(
    raster: &Raster,
    width: u32,
    filter: FilterType,
) -> Result<Raster, DecodeError> {
    if raster.width == 0 {
        return Err(DecodeError::InvalidDimensions {
            width: raster.width,
            height: raster.height,
        });
    }
    scale_by(raster, width as f64 / raster.width as f64, filter)
}

/// Target dimensions for a uniform scale, never collapsing an axis to zero.
pub fn scaled_dimensions(width: u32, height: u32, ratio: f64) -> (u32, u32) {
    let w = (width as f64 * ratio).round().max(1.0) as u32;
    let h = (height as f64 * ratio).round().max(1.0) as u32;
    (w, h)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> Raster {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(((x * 255) / width.max(1)) as u8);
                pixels.push(((y * 255) / height.max(1)) as u8);
                pixels.push(128);
            }
        }
        Raster::new(width, height, pixels).unwrap()
    }

    #[test]
    fn test_resize_basic() {
        let resized = resize(&gradient(100, 50), 50, 25, FilterType::Bilinear).unwrap();
        assert_eq!(resized.dimensions(), (50, 25));
        assert_eq!(resized.pixels.len(), 50 * 25 * 3);
    }

    #[test]
    fn test_resize_same_dimensions_is_identity() {
        let img = gradient(30, 20);
        assert_eq!(resize(&img, 30, 20, FilterType::Cubic).unwrap(), img);
    }

    #[test]
    fn test_resize_zero_dimensions_error() {
        let img = gradient(10, 10);
        assert!(resize(&img, 0, 5, FilterType::Bilinear).is_err());
        assert!(resize(&img, 5, 0, FilterType::Bilinear).is_err());
    }

    #[test]
    fn test_scale_by_cubic() {
        let scaled = scale_by(&gradient(900, 1260), 0.5, FilterType::Cubic).unwrap();
        assert_eq!(scaled.dimensions(), (450, 630));
    }

    #[test]
    fn test_scale_to_width_preserves_aspect() {
        let preview = scale_to_width(&gradient(744, 1038), 248, FilterType::Bilinear).unwrap();
        assert_eq!(preview.width, 248);
        assert_eq!(preview.height, 346);
    }

    #[test]
    fn test_scale_to_width_upscales_small_images() {
        let preview = scale_to_width(&gradient(124, 173), 248, FilterType::Bilinear).unwrap();
        assert_eq!(preview.dimensions(), (248, 346));
    }

    #[test]
    fn test_scaled_dimensions_never_zero() {
        assert_eq!(scaled_dimensions(10, 1, 0.01), (1, 1));
        assert_eq!(scaled_dimensions(1000, 500, 0.25), (250, 125));
    }
}
