//! Geometry primitives for hierarchical sheet composition.
//!
//! Every level of the hierarchy (items in a row, rows in a row-group,
//! row-groups in a sheet) is the same operation: stack uniform cells
//! along one axis with padding between them. [`stack`] is that one
//! primitive; the per-level loops in the sheet compositor only differ
//! in which axis and padding they pass.

use image::{imageops, RgbaImage};

/// Stacking direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Axis length occupied by `count` equally spaced cells: padding sits
/// between cells, never around the run. Zero cells occupy zero length.
pub fn span(count: u32, cell: u32, padding: u32) -> u32 {
    if count == 0 {
        0
    } else {
        count * (cell + padding) - padding
    }
}

/// Vertical offset that centres an element of `height` against the
/// taller of a pair. Integer division, rounds down.
pub fn centered_offset(taller: u32, height: u32) -> u32 {
    (taller - height) / 2
}

/// Per-sheet grid configuration.
///
/// `columns` is the item count per row; `rows`, when set, splits the
/// rows into row-groups of that many rows, tiled horizontally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutSpec {
    pub columns: u32,
    pub rows: Option<u32>,
    pub item_width: u32,
    pub item_height: u32,
    /// Padding between items within a row.
    pub item_padding: u32,
    /// Padding between rows within a row-group.
    pub row_padding: u32,
    /// Padding between row-groups.
    pub group_padding: u32,
}

impl LayoutSpec {
    /// Width of one full row.
    pub fn row_width(&self) -> u32 {
        span(self.columns, self.item_width, self.item_padding)
    }
}

/// Stack cells along `axis` onto a fresh transparent canvas.
///
/// Cell `i` lands at `i * (cell + padding)` along the axis. `None`
/// cells stay transparent without shifting later cells. Tiles smaller
/// than the declared cell occupy the cell's top-left corner; larger
/// tiles are a caller error.
pub fn stack(
    tiles: &[Option<&RgbaImage>],
    cell_width: u32,
    cell_height: u32,
    axis: Axis,
    padding: u32,
) -> RgbaImage {
    let count = tiles.len() as u32;
    let (width, height) = match axis {
        Axis::Horizontal => (span(count, cell_width, padding), cell_height),
        Axis::Vertical => (cell_width, span(count, cell_height, padding)),
    };
    let mut canvas = RgbaImage::new(width, height);
    for (i, tile) in tiles.iter().enumerate() {
        let Some(image) = tile else { continue };
        debug_assert!(
            image.width() <= cell_width && image.height() <= cell_height,
            "tile {}x{} exceeds cell {}x{}",
            image.width(),
            image.height(),
            cell_width,
            cell_height
        );
        let step = match axis {
            Axis::Horizontal => i64::from(cell_width + padding),
            Axis::Vertical => i64::from(cell_height + padding),
        };
        let offset = i as i64 * step;
        match axis {
            Axis::Horizontal => imageops::overlay(&mut canvas, *image, offset, 0),
            Axis::Vertical => imageops::overlay(&mut canvas, *image, 0, offset),
        }
    }
    canvas
}

/// Compose two differently sized elements side by side, each vertically
/// centred against the taller one, with `gap` between them.
pub fn pair_horizontal(left: &RgbaImage, right: &RgbaImage, gap: u32) -> RgbaImage {
    let height = left.height().max(right.height());
    let width = left.width() + gap + right.width();
    let mut canvas = RgbaImage::new(width, height);
    let left_y = centered_offset(height, left.height());
    let right_y = centered_offset(height, right.height());
    imageops::overlay(&mut canvas, left, 0, i64::from(left_y));
    imageops::overlay(
        &mut canvas,
        right,
        i64::from(left.width() + gap),
        i64::from(right_y),
    );
    canvas
}
