//! Image reading and resampling.
//!
//! This module provides functionality for:
//! - Decoding GIF, JPEG and PNG card images to RGB rasters
//! - Applying EXIF orientation before any geometry is measured
//! - Resampling for DPI capping and fixed-width previews
//!
//! All operations are synchronous and single-threaded.

mod resize;
mod source;
mod types;

pub use resize::{resize, scale_by, scale_to_width, scaled_dimensions};
pub use source::{
    decode_image, is_card_image, is_supported_image, read_image, read_orientation,
    SUPPORTED_EXTENSIONS,
};
pub use types::{DecodeError, FilterType, Orientation, Raster};
