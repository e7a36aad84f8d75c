//! Unsharp masking.
//!
//! Downsampling a scan to the print DPI ceiling softens edges; a light
//! unsharp mask restores them. The mask adds `percent`% of the difference
//! between each channel and its Gaussian-blurred value, but only where that
//! difference exceeds `threshold`, so flat areas and scanner noise stay
//! untouched.

use crate::decode::Raster;

/// Parameters for [`unsharp_mask`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnsharpMask {
    /// Blur radius (Gaussian sigma) in pixels.
    pub radius: f32,
    /// Strength in percent of the high-pass difference.
    pub percent: i32,
    /// Channel differences up to this value are left alone.
    pub threshold: i32,
}

impl UnsharpMask {
    /// The fixed mask applied after capping DPI: radius 1, 20%, threshold 8.
    pub const AFTER_DOWNSAMPLE: UnsharpMask = UnsharpMask {
        radius: 1.0,
        percent: 20,
        threshold: 8,
    };
}

/// Apply an unsharp mask, returning a new raster.
pub fn unsharp_mask(raster: &Raster, mask: UnsharpMask) -> Raster {
    if raster.is_empty() || mask.percent == 0 {
        return raster.clone();
    }

    let blurred = image::imageops::blur(&raster.to_rgb_image(), mask.radius).into_raw();

    let pixels = raster
        .pixels
        .iter()
        .zip(blurred.iter())
        .map(|(&orig, &soft)| {
            let diff = i32::from(orig) - i32::from(soft);
            if diff.abs() <= mask.threshold {
                orig
            } else {
                (i32::from(orig) + diff * mask.percent / 100).clamp(0, 255) as u8
            }
        })
        .collect();

    Raster {
        width: raster.width,
        height: raster.height,
        pixels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertical_edge(width: u32, height: u32) -> Raster {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for _ in 0..height {
            for x in 0..width {
                let v = if x < width / 2 { 60 } else { 200 };
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
    fn test_flat_image_unchanged() {
        let flat = Raster::filled(16, 16, [120, 130, 140]);
        assert_eq!(unsharp_mask(&flat, UnsharpMask::AFTER_DOWNSAMPLE), flat);
    }

    #[test]
    fn test_edge_contrast_increases() {
        let img = vertical_edge(40, 21);
        let sharp = unsharp_mask(&img, UnsharpMask::AFTER_DOWNSAMPLE);

        // Dark side of the edge gets darker, bright side brighter.
        assert!(sharp.pixel(19, 10)[0] < 60);
        assert!(sharp.pixel(20, 10)[0] > 200);
        // Far from the edge nothing moves.
        assert_eq!(sharp.pixel(8, 10), [60, 60, 60]);
        assert_eq!(sharp.pixel(31, 10), [200, 200, 200]);
    }

    #[test]
    fn test_threshold_suppresses_small_differences() {
        let mut img = Raster::filled(9, 9, [100, 100, 100]);
        let center = (4 * 9 + 4) * 3;
        img.pixels[center] = 104;
        let sharp = unsharp_mask(&img, UnsharpMask::AFTER_DOWNSAMPLE);
        assert_eq!(sharp.pixels[center], 104);
    }

    #[test]
    fn test_difference_equal_to_threshold_is_left_alone() {
        // Blurring 109 against a flat 100 background leaves a difference of 8
        let mut img = Raster::filled(9, 9, [100, 100, 100]);
        let center = (4 * 9 + 4) * 3;
        img.pixels[center] = 109;
        let sharp = unsharp_mask(&img, UnsharpMask::AFTER_DOWNSAMPLE);
        assert_eq!(sharp.pixels[center], 109);
    }

    #[test]
    fn test_zero_strength_is_identity() {
        let img = vertical_edge(10, 4);
        let mask = UnsharpMask {
            percent: 0,
            ..UnsharpMask::AFTER_DOWNSAMPLE
        };
        assert_eq!(unsharp_mask(&img, mask), img);
    }
}
