//! Page grid computation.
//!
//! All values are PDF points with the origin at the bottom-left corner of
//! the page.

use crate::error::{ProxyError, Result};
use crate::units::inch_to_points;
use crate::CardSize;

/// A fixed grid of card cells centered on a page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    /// Page width after orientation.
    pub page_width: f64,
    /// Page height after orientation.
    pub page_height: f64,
    /// Card cell width, including bleed on both sides.
    pub cell_width: f64,
    /// Card cell height, including bleed on both sides.
    pub cell_height: f64,
    pub cols: u32,
    pub rows: u32,
    /// Left margin, rounded to whole points.
    pub offset_x: f64,
    /// Bottom margin, rounded to whole points.
    pub offset_y: f64,
}

impl Grid {
    /// Fit as many `card`-sized cells as possible on a page.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::Geometry`] when not even one cell fits on
    /// either axis.
    pub fn fit(page_width: f64, page_height: f64, card: CardSize) -> Result<Self> {
        let cell_width = inch_to_points(card.width_in);
        let cell_height = inch_to_points(card.height_in);
        let cols = (page_width / cell_width).floor().max(0.0) as u32;
        let rows = (page_height / cell_height).floor().max(0.0) as u32;
        if cols == 0 || rows == 0 {
            return Err(ProxyError::Geometry(format!(
                "a {cell_width:.2}x{cell_height:.2}pt card does not fit on a \
                 {page_width:.2}x{page_height:.2}pt page"
            )));
        }

        let offset_x = ((page_width - cols as f64 * cell_width) / 2.0).round();
        let offset_y = ((page_height - rows as f64 * cell_height) / 2.0).round();

        Ok(Self {
            page_width,
            page_height,
            cell_width,
            cell_height,
            cols,
            rows,
            offset_x,
            offset_y,
        })
    }

    /// Cells per page.
    pub fn capacity(&self) -> usize {
        self.cols as usize * self.rows as usize
    }

    /// Bottom-left corner of slot `index`, filling rows left to right from
    /// the bottom of the page.
    pub fn slot_origin(&self, index: usize) -> (f64, f64) {
        let cols = self.cols as usize;
        let (row, col) = (index / cols, index % cols);
        (
            col as f64 * self.cell_width + self.offset_x,
            row as f64 * self.cell_height + self.offset_y,
        )
    }

    /// Every cell corner, row by row from the bottom.
    pub fn intersections(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        (0..=self.rows).flat_map(move |row| {
            (0..=self.cols).map(move |col| {
                (
                    self.offset_x + self.cell_width * col as f64,
                    self.offset_y + self.cell_height * row as f64,
                )
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::BleedEdge;

    #[test]
    fn test_letter_portrait_is_three_by_three() {
        let grid = Grid::fit(612.0, 792.0, CardSize::BORDERLESS).unwrap();
        assert_eq!((grid.cols, grid.rows), (3, 3));
        assert_eq!(grid.capacity(), 9);
        // (612 - 535.68) / 2 = 38.16, (792 - 747.36) / 2 = 22.32
        assert_eq!((grid.offset_x, grid.offset_y), (38.0, 22.0));
    }

    #[test]
    fn test_letter_landscape_is_four_by_two() {
        let grid = Grid::fit(792.0, 612.0, CardSize::BORDERLESS).unwrap();
        assert_eq!((grid.cols, grid.rows), (4, 2));
    }

    #[test]
    fn test_bleed_grows_cells() {
        let bleed = BleedEdge::from_mm(2.0);
        let grid = Grid::fit(612.0, 792.0, CardSize::BORDERLESS.grown_by(bleed.inches())).unwrap();
        assert!((grid.cell_width - (178.56 + 2.0 * bleed.points())).abs() < 1e-9);
        assert_eq!((grid.cols, grid.rows), (3, 3));
    }

    #[test]
    fn test_zero_grid_is_geometry_error() {
        assert!(matches!(
            Grid::fit(100.0, 792.0, CardSize::BORDERLESS),
            Err(ProxyError::Geometry(_))
        ));
        assert!(Grid::fit(612.0, 200.0, CardSize::BORDERLESS).is_err());
    }

    #[test]
    fn test_slot_origin_fills_bottom_row_first() {
        let grid = Grid::fit(612.0, 792.0, CardSize::BORDERLESS).unwrap();
        assert_eq!(grid.slot_origin(0), (38.0, 22.0));
        let (x, y) = grid.slot_origin(4);
        assert!((x - (178.56 + 38.0)).abs() < 1e-9);
        assert!((y - (249.12 + 22.0)).abs() < 1e-9);
    }

    #[test]
    fn test_intersection_count() {
        let grid = Grid::fit(612.0, 792.0, CardSize::BORDERLESS).unwrap();
        assert_eq!(grid.intersections().count(), 16);
    }
}
