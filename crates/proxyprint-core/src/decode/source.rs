//! Reading source and cropped card images from disk.

use std::io::Cursor;
use std::path::Path;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageReader};

use super::{DecodeError, Orientation, Raster};

/// File extensions the cropper picks up from the source directory.
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["gif", "jpg", "jpeg", "png"];

/// Returns true if `path` has one of the [`SUPPORTED_EXTENSIONS`].
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Returns true for a supported image that is not a hidden file.
///
/// Interrupted atomic writes can leave dot-prefixed temporary files such as
/// `.crop-XXXX.png` behind; directory listings must not pick them up as cards.
pub fn is_card_image(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|name| name.to_str())
        .map_or(true, |name| name.starts_with('.'));
    !hidden && is_supported_image(path)
}

/// Read and decode an image file to RGB, applying EXIF orientation.
///
/// # Errors
///
/// Returns `DecodeError::Unsupported` for extensions outside
/// [`SUPPORTED_EXTENSIONS`], `DecodeError::IoError` if the file cannot be read
/// and `DecodeError::CorruptedFile` if the bytes do not decode.
pub fn read_image(path: &Path) -> Result<Raster, DecodeError> {
    if !is_supported_image(path) {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        return Err(DecodeError::Unsupported(ext.to_string()));
    }
    let bytes = std::fs::read(path).map_err(|e| DecodeError::IoError(e.to_string()))?;
    decode_image(&bytes)
}

/// Decode image bytes of any supported format to RGB.
///
/// Orientation tags are honored so that width and height reflect how the card
/// is meant to be viewed; the DPI inference depends on that.
pub fn decode_image(bytes: &[u8]) -> Result<Raster, DecodeError> {
    let orientation = read_orientation(bytes);

    let img = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    let oriented = orient(img, orientation);
    Ok(Raster::from_rgb_image(oriented.into_rgb8()))
}

/// Read the EXIF orientation tag, defaulting to `Normal` when absent.
pub fn read_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);
    Reader::new()
        .read_from_container(&mut cursor)
        .ok()
        .and_then(|exif| {
            exif.get_field(Tag::Orientation, In::PRIMARY)
                .and_then(|field| field.value.get_uint(0))
        })
        .map(Orientation::from)
        .unwrap_or_default()
}

fn orient(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}
