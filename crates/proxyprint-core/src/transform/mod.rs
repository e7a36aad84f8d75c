//! Raster transforms used by the crop pipeline.
//!
//! # Pipeline Order
//!
//! When a source card is normalized, transforms are applied in this order:
//! 1. Edge trim (border removal, reduced when a bleed is kept)
//! 2. Resample down to the DPI ceiling, if exceeded
//! 3. Unsharp mask, only after a resample
//! 4. Color lookup table, if enabled
//!
//! # Coordinate System
//!
//! - Pixel coordinates, origin top-left
//! - Trims are symmetric: one margin applies to all four edges

mod sharpen;
mod trim;

pub use sharpen::{unsharp_mask, UnsharpMask};
pub use trim::trim_edges;
