//! 3D color lookup tables in the `.CUBE` text format.
//!
//! The vibrance correction is a fixed table loaded once at startup and then
//! shared read-only by every crop. Colors are mapped with trilinear
//! interpolation between the eight surrounding lattice points.

use std::path::Path;

use thiserror::Error;

/// Lines at the top of a `.CUBE` file that carry no lattice data.
pub const CUBE_HEADER_LINES: usize = 11;

/// Errors raised while loading a lookup table.
#[derive(Debug, Error)]
pub enum LutError {
    /// The file could not be read.
    #[error("I/O error: {0}")]
    Io(String),

    /// A data row is not three floating point numbers.
    #[error("line {line}: expected `R G B`, found {text:?}")]
    InvalidRow { line: usize, text: String },

    /// The number of rows is not a perfect cube of at least 2.
    #[error("{rows} rows do not form a cube lattice")]
    NotACube { rows: usize },
}

// ============================================================================
// Table Type
// ============================================================================

/// A cubic RGB lattice with red varying fastest.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorLut3d {
    size: usize,
    table: Vec<[f32; 3]>,
}

impl ColorLut3d {
    /// Build from lattice rows; the edge length is the cube root of the count.
    pub fn from_rows(table: Vec<[f32; 3]>) -> Result<Self, LutError> {
        let rows = table.len();
        let size = (rows as f64).cbrt().round() as usize;
        if size < 2 || size * size * size != rows {
            return Err(LutError::NotACube { rows });
        }
        Ok(Self { size, table })
    }

    /// Identity table of the given edge length (clamped to at least 2).
    pub fn identity(size: usize) -> Self {
        let size = size.max(2);
        let max = (size - 1) as f32;
        let mut table = Vec::with_capacity(size * size * size);
        for b in 0..size {
            for g in 0..size {
                for r in 0..size {
                    table.push([r as f32 / max, g as f32 / max, b as f32 / max]);
                }
            }
        }
        Self { size, table }
    }

    /// Parse `.CUBE` text: skip the header, then one `R G B` row per point.
    pub fn parse_cube(text: &str) -> Result<Self, LutError> {
        let mut table = Vec::new();
        for (idx, line) in text.lines().enumerate().skip(CUBE_HEADER_LINES) {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            table.push(parse_row(line).ok_or_else(|| LutError::InvalidRow {
                line: idx + 1,
                text: line.to_string(),
            })?);
        }
        Self::from_rows(table)
    }

    /// Read and parse a `.CUBE` file.
    pub fn load(path: &Path) -> Result<Self, LutError> {
        let text = std::fs::read_to_string(path).map_err(|e| LutError::Io(e.to_string()))?;
        Self::parse_cube(&text)
    }

    /// Lattice edge length.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Map a normalized color through the table.
    pub fn lookup(&self, rgb: [f32; 3]) -> [f32; 3] {
        let max = (self.size - 1) as f32;
        let pos = rgb.map(|c| c.clamp(0.0, 1.0) * max);
        let lo = pos.map(|p| (p.floor() as usize).min(self.size - 1));
        let hi = lo.map(|l| (l + 1).min(self.size - 1));
        let t = [
            pos[0] - lo[0] as f32,
            pos[1] - lo[1] as f32,
            pos[2] - lo[2] as f32,
        ];

        let stride = self.size;
        let at = |r: usize, g: usize, b: usize| self.table[r + g * stride + b * stride * stride];

        let c00 = lerp(at(lo[0], lo[1], lo[2]), at(hi[0], lo[1], lo[2]), t[0]);
        let c10 = lerp(at(lo[0], hi[1], lo[2]), at(hi[0], hi[1], lo[2]), t[0]);
        let c01 = lerp(at(lo[0], lo[1], hi[2]), at(hi[0], lo[1], hi[2]), t[0]);
        let c11 = lerp(at(lo[0], hi[1], hi[2]), at(hi[0], hi[1], hi[2]), t[0]);

        let c0 = lerp(c00, c10, t[1]);
        let c1 = lerp(c01, c11, t[1]);
        lerp(c0, c1, t[2])
    }
}

fn parse_row(line: &str) -> Option<[f32; 3]> {
    let mut values = line.split_whitespace().map(|v| v.parse::<f32>());
    let row = [
        values.next()?.ok()?,
        values.next()?.ok()?,
        values.next()?.ok()?,
    ];
    if values.next().is_some() {
        return None;
    }
    Some(row)
}

#[inline]
fn lerp(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

// ============================================================================
// Table Application
// ============================================================================

/// Apply a color table to RGB pixels in place.
pub fn apply_color_lut(pixels: &mut [u8], lut: &ColorLut3d) {
    for chunk in pixels.chunks_exact_mut(3) {
        let rgb = [
            chunk[0] as f32 / 255.0,
            chunk[1] as f32 / 255.0,
            chunk[2] as f32 / 255.0,
        ];
        let out = lut.lookup(rgb);
        chunk[0] = (out[0].clamp(0.0, 1.0) * 255.0).round() as u8;
        chunk[1] = (out[1].clamp(0.0, 1.0) * 255.0).round() as u8;
        chunk[2] = (out[2].clamp(0.0, 1.0) * 255.0).round() as u8;
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_identity_lookup_is_exact(r in 0u8..=255, g in 0u8..=255, b in 0u8..=255) {
            let lut = ColorLut3d::identity(33);
            let mut px = vec![r, g, b];
            apply_color_lut(&mut px, &lut);
            prop_assert_eq!(px, vec![r, g, b]);
        }
    }
}
