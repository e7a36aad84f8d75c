//! Print-sheet layout engine
//!
//! Packs a multiset of equally sized card images onto fixed paper sizes and
//! decides where registration marks go.
//!
//! ## Placement
//!
//! Cells are the borderless card size plus the bleed margin on every side.
//! The grid holds `floor(page / cell)` cells per axis and is centered with
//! whole-point margins. Cards fill slots left to right, bottom row first,
//! in the order of the card map, each repeated by its quantity.
//!
//! ## Marks
//!
//! - **Borderless**: a full cross at every grid intersection, once per page,
//!   emitted when the page's last slot (or the last card overall) is placed.
//!   Partially filled pages therefore still get the full lattice.
//! - **Bleed**: four half crosses per card at the corners of the trimmed card
//!   area, arms reaching out into the bleed, as long as the bleed is wide.

mod grid;
mod marks;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::debug;

use crate::error::{ProxyError, Result};
use crate::units::BleedEdge;
use crate::CardSize;

pub use grid::Grid;
pub use marks::{LineSegment, Mark, StrokeColor, CROSS_ARM, MARK_DASH, MARK_LINE_WIDTH};

// ============================================================================
// Paper
// ============================================================================

/// Supported paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum PageSize {
    #[default]
    Letter,
    A4,
    Legal,
}

impl PageSize {
    pub const ALL: [PageSize; 3] = [PageSize::Letter, PageSize::A4, PageSize::Legal];

    /// Portrait `(width, height)` in points.
    pub fn points(self) -> (f64, f64) {
        match self {
            PageSize::Letter => (612.0, 792.0),
            PageSize::A4 => (595.2755905511812, 841.8897637795277),
            PageSize::Legal => (612.0, 1008.0),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PageSize::Letter => "Letter",
            PageSize::A4 => "A4",
            PageSize::Legal => "Legal",
        }
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PageSize {
    type Err = ProxyError;

    fn from_str(s: &str) -> Result<Self> {
        PageSize::ALL
            .into_iter()
            .find(|size| size.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ProxyError::InvalidValue {
                field: "pagesize",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    /// Apply to portrait page dimensions.
    pub fn apply(self, (width, height): (f64, f64)) -> (f64, f64) {
        match self {
            Orientation::Portrait => (width, height),
            Orientation::Landscape => (height, width),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Orientation::Portrait => "Portrait",
            Orientation::Landscape => "Landscape",
        })
    }
}

impl FromStr for Orientation {
    type Err = ProxyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "portrait" => Ok(Orientation::Portrait),
            "landscape" => Ok(Orientation::Landscape),
            _ => Err(ProxyError::InvalidValue {
                field: "orient",
                value: s.to_string(),
            }),
        }
    }
}

// ============================================================================
// Pages
// ============================================================================

/// One card image drawn at a fixed rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    /// Cropped filename, resolved against the variant directory when drawn.
    pub image: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A laid-out sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Page width in points.
    pub width: f64,
    /// Page height in points.
    pub height: f64,
    pub placements: Vec<Placement>,
    pub marks: Vec<Mark>,
}

impl Page {
    fn blank(grid: &Grid) -> Self {
        Self {
            width: grid.page_width,
            height: grid.page_height,
            placements: Vec::new(),
            marks: Vec::new(),
        }
    }
}

/// Lay out `cards` (filename → quantity) on pages of the given paper.
///
/// Returns no pages when every quantity is zero.
///
/// # Errors
///
/// Returns [`ProxyError::Geometry`] when not a single card cell fits.
pub fn layout(
    cards: &BTreeMap<String, u32>,
    page_size: PageSize,
    orientation: Orientation,
    bleed: BleedEdge,
) -> Result<Vec<Page>> {
    let (page_width, page_height) = orientation.apply(page_size.points());
    let grid = Grid::fit(
        page_width,
        page_height,
        CardSize::BORDERLESS.grown_by(bleed.inches()),
    )?;
    Ok(layout_on_grid(cards, &grid, bleed))
}

/// Lay out on a grid built by [`Grid::fit`].
fn layout_on_grid(cards: &BTreeMap<String, u32>, grid: &Grid, bleed: BleedEdge) -> Vec<Page> {
    let per_page = grid.capacity();
    if per_page == 0 {
        return Vec::new();
    }
    let total: usize = cards.values().map(|&qty| qty as usize).sum();
    let slots = cards
        .iter()
        .flat_map(|(name, &qty)| std::iter::repeat(name).take(qty as usize));

    let mut pages = Vec::new();
    let mut page = Page::blank(grid);
    for (i, name) in slots.enumerate() {
        let slot = i % per_page;
        if slot == 0 && i > 0 {
            pages.push(std::mem::replace(&mut page, Page::blank(grid)));
        }

        let (x, y) = grid.slot_origin(slot);
        page.placements.push(Placement {
            image: name.clone(),
            x,
            y,
            width: grid.cell_width,
            height: grid.cell_height,
        });

        if bleed.is_none() {
            if slot == per_page - 1 || i == total - 1 {
                page.marks
                    .extend(grid.intersections().map(|(x, y)| Mark::cross(x, y)));
            }
        } else {
            let inset = bleed.points();
            page.marks.extend(Mark::corner_marks(
                x + inset,
                y + inset,
                x + grid.cell_width - inset,
                y + grid.cell_height - inset,
                inset,
            ));
        }
    }
    if !page.placements.is_empty() {
        pages.push(page);
    }

    debug!(
        "laid out {total} cards on {} pages ({}x{} grid)",
        pages.len(),
        grid.cols,
        grid.rows
    );
    pages
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_every_card_placed_inside_page(
            quantities in proptest::collection::vec(0u32..12, 1..6),
            bleed_mm in 0.0f64..3.05,
            landscape in any::<bool>(),
        ) {
            let cards: BTreeMap<String, u32> = quantities
                .iter()
                .enumerate()
                .map(|(i, q)| (format!("card{i}.png"), *q))
                .collect();
            let orientation = if landscape { Orientation::Landscape } else { Orientation::Portrait };
            let pages = layout(&cards, PageSize::Letter, orientation, BleedEdge::from_mm(bleed_mm)).unwrap();

            let placed: usize = pages.iter().map(|p| p.placements.len()).sum();
            let total: u32 = quantities.iter().sum();
            prop_assert_eq!(placed, total as usize);

            for page in &pages {
                prop_assert!(!page.placements.is_empty());
                for p in &page.placements {
                    prop_assert!(p.x >= 0.0 && p.y >= 0.0);
                    prop_assert!(p.x + p.width <= page.width + 0.5);
                    prop_assert!(p.y + p.height <= page.height + 0.5);
                }
            }
        }
    }
}
