//! Uniform edge trimming.
//!
//! Card borders are removed by cutting the same number of pixels from all
//! four edges, the equivalent of slicing `source[c..h-c, c..w-c]`.

use crate::decode::{DecodeError, Raster};

/// Remove `margin` pixels from every edge of `raster`.
///
/// # Errors
///
/// Returns `DecodeError::InvalidDimensions` when twice the margin reaches
/// either dimension; the trim would leave nothing (or a negative size).
pub fn trim_edges(raster: &Raster, margin: u32) -> Result<Raster, DecodeError> {
    if margin == 0 {
        return Ok(raster.clone());
    }

    let twice = u64::from(margin) * 2;
    if twice >= u64::from(raster.width) || twice >= u64::from(raster.height) {
        return Err(DecodeError::InvalidDimensions {
            width: raster.width.saturating_sub(margin.saturating_mul(2)),
            height: raster.height.saturating_sub(margin.saturating_mul(2)),
        });
    }

    let out_width = raster.width - 2 * margin;
    let out_height = raster.height - 2 * margin;
    let src_stride = raster.width as usize * 3;
    let row_bytes = out_width as usize * 3;

    let mut pixels = Vec::with_capacity(row_bytes * out_height as usize);
    for y in margin..margin + out_height {
        let start = y as usize * src_stride + margin as usize * 3;
        pixels.extend_from_slice(&raster.pixels[start..start + row_bytes]);
    }

    Ok(Raster {
        width: out_width,
        height: out_height,
        pixels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Each pixel's value encodes its position so copies can be traced.
    fn positional(width: u32, height: u32) -> Raster {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                let v = ((y * width + x) % 256) as u8;
                pixels.extend_from_slice(&[v, v, v]);
            }
        }
        Raster {
            width,
            height,
            pixels,
        }
    }

    #[test]
    fn test_trim_zero_is_identity() {
        let img = positional(12, 9);
        assert_eq!(trim_edges(&img, 0).unwrap(), img);
    }

    #[test]
    fn test_trim_dimensions() {
        let trimmed = trim_edges(&positional(100, 140), 10).unwrap();
        assert_eq!(trimmed.dimensions(), (80, 120));
        assert_eq!(trimmed.pixels.len(), 80 * 120 * 3);
    }

    #[test]
    fn test_trim_copies_inner_pixels() {
        let img = positional(10, 10);
        let trimmed = trim_edges(&img, 2).unwrap();

        // First output pixel is source (2, 2) = 22
        assert_eq!(trimmed.pixel(0, 0), [22, 22, 22]);
        // Last output pixel is source (7, 7) = 77
        assert_eq!(trimmed.pixel(5, 5), [77, 77, 77]);
    }

    #[test]
    fn test_trim_rejects_margin_consuming_image() {
        let img = positional(10, 30);
        assert!(trim_edges(&img, 5).is_err());
        assert!(trim_edges(&img, 4).is_ok());
        assert!(matches!(
            trim_edges(&img, 50),
            Err(DecodeError::InvalidDimensions { .. })
        ));
    }
}
