//! Unit conversion and validation helpers.
//!
//! Everything here is pure and total: malformed input produces an "invalid"
//! answer instead of a panic, so the host can run user text through these
//! functions before it reaches the cropper or the layout engine.

use std::fmt;

use crate::error::{ProxyError, Result};
use crate::{BORDER_MARGIN_IN, POINTS_PER_INCH};

/// Inches per millimeter.
pub const INCHES_PER_MM: f64 = 0.0393701;

/// Convert millimeters to inches.
#[inline]
pub fn mm_to_inch(mm: f64) -> f64 {
    mm * INCHES_PER_MM
}

/// Convert inches to millimeters.
#[inline]
pub fn inch_to_mm(inch: f64) -> f64 {
    inch / INCHES_PER_MM
}

/// Convert inches to PDF points.
#[inline]
pub fn inch_to_points(inch: f64) -> f64 {
    inch * POINTS_PER_INCH
}

/// Largest bleed edge a card can carry, in millimeters.
///
/// This is the physical border width (0.12in) rounded to two decimals, the
/// same value [`cap_bleed_edge`] writes back when it clamps.
pub fn max_bleed_edge_mm() -> f64 {
    round_to_hundredths(inch_to_mm(BORDER_MARGIN_IN))
}

/// Returns true when `text` is an unsigned decimal number.
///
/// Digits only, with at most one decimal point and at least one digit.
/// `"1"`, `"1.5"`, `".5"` and `"2."` pass; `""`, `"."`, `"-1"`, `"1.2.3"` and
/// `"1e3"` do not.
pub fn is_number_string(text: &str) -> bool {
    let mut seen_dot = false;
    let mut seen_digit = false;
    for ch in text.chars() {
        match ch {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => return false,
        }
    }
    seen_digit
}

/// Clamp a bleed-edge string to the physical maximum.
///
/// Numeric input above the cap becomes the cap formatted with two decimals.
/// Anything else, including malformed text, is returned unchanged so that it
/// still fails [`is_number_string`] downstream.
pub fn cap_bleed_edge(text: &str) -> String {
    if !is_number_string(text) {
        return text.to_string();
    }
    match text.parse::<f64>() {
        Ok(value) if value > max_bleed_edge_mm() => format!("{:.2}", max_bleed_edge_mm()),
        _ => text.to_string(),
    }
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A validated bleed margin in millimeters.
///
/// Always finite, non-negative and no larger than [`max_bleed_edge_mm`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct BleedEdge(f64);

impl BleedEdge {
    /// No bleed: crop exactly to the borderless card size.
    pub const NONE: BleedEdge = BleedEdge(0.0);

    /// Build from a millimeter value, clamping into the valid range.
    pub fn from_mm(mm: f64) -> Self {
        if !mm.is_finite() || mm <= 0.0 {
            return Self::NONE;
        }
        BleedEdge(mm.min(max_bleed_edge_mm()))
    }

    /// Parse user text, capping values above the maximum.
    ///
    /// Returns [`ProxyError::InvalidValue`] for anything that is not an
    /// unsigned decimal number.
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        let capped = cap_bleed_edge(trimmed);
        if !is_number_string(&capped) {
            return Err(ProxyError::InvalidValue {
                field: "bleed_edge",
                value: text.to_string(),
            });
        }
        capped
            .parse::<f64>()
            .map(Self::from_mm)
            .map_err(|_| ProxyError::InvalidValue {
                field: "bleed_edge",
                value: text.to_string(),
            })
    }

    /// Bleed in millimeters.
    pub fn mm(self) -> f64 {
        self.0
    }

    /// Bleed in inches.
    pub fn inches(self) -> f64 {
        mm_to_inch(self.0)
    }

    /// Bleed in PDF points.
    pub fn points(self) -> f64 {
        inch_to_points(self.inches())
    }

    /// True when no bleed margin is requested.
    pub fn is_none(self) -> bool {
        self.0 <= 0.0
    }

    /// Directory segment holding this variant's crops, e.g. `1p5` for 1.5mm.
    ///
    /// `None` for the borderless variant, which lives directly in the crop
    /// directory.
    pub fn dir_name(self) -> Option<String> {
        if self.is_none() {
            None
        } else {
            Some(self.to_string().replace('.', "p"))
        }
    }
}

impl fmt::Display for BleedEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
