//! ProxyPrint Core - card image normalization and print layout
//!
//! This crate turns a folder of trading-card scans into a print-ready PDF:
//! borders are trimmed at an inferred DPI, previews are cached, quantities
//! are tracked per card, and pages are laid out with registration marks.
//!
//! The binary front end lives in `proxyprint-cli`; everything here is a
//! plain library with no global state.

pub mod cache;
pub mod config;
pub mod cropper;
pub mod decode;
pub mod document;
pub mod encode;
pub mod error;
pub mod layout;
pub mod lut;
pub mod project;
pub mod transform;
pub mod units;
pub mod workspace;

pub use cache::PreviewCache;
pub use config::Config;
pub use cropper::{CropReport, CropSettings, CropStage, Cropper};
pub use document::{emit_pages, PageCanvas, PdfCanvas};
pub use error::{ProxyError, Result};
pub use layout::{layout, Orientation, Page, PageSize};
pub use project::Project;
pub use units::BleedEdge;
pub use workspace::Workspace;

/// Width of the printed border on every card edge, in inches.
pub const BORDER_MARGIN_IN: f64 = 0.12;

/// PDF points per inch.
pub const POINTS_PER_INCH: f64 = 72.0;

/// Pixel width of every cached preview.
pub const PREVIEW_WIDTH: u32 = 248;

/// Physical card dimensions in inches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardSize {
    pub width_in: f64,
    pub height_in: f64,
}

impl CardSize {
    /// A scan including the printed border.
    pub const BORDERED: CardSize = CardSize {
        width_in: 2.72,
        height_in: 3.70,
    };

    /// The card once the border is trimmed away.
    pub const BORDERLESS: CardSize = CardSize {
        width_in: 2.48,
        height_in: 3.46,
    };

    /// Same size with `margin_in` added on every edge.
    pub fn grown_by(self, margin_in: f64) -> CardSize {
        CardSize {
            width_in: self.width_in + 2.0 * margin_in,
            height_in: self.height_in + 2.0 * margin_in,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_border_accounts_for_size_difference() {
        let grown = CardSize::BORDERLESS.grown_by(BORDER_MARGIN_IN);
        assert!((grown.width_in - CardSize::BORDERED.width_in).abs() < 1e-9);
        assert!((grown.height_in - CardSize::BORDERED.height_in).abs() < 1e-9);
    }

    #[test]
    fn test_preview_matches_borderless_width_at_100dpi() {
        let width = (CardSize::BORDERLESS.width_in * 100.0).round() as u32;
        assert_eq!(width, PREVIEW_WIDTH);
    }
}
