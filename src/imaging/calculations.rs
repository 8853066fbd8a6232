//! Pure calculation functions for crop and tile rectangles.
//!
//! All functions here are pure and testable without any I/O or images.
//! Ratio comparisons cross-multiply in `u64` so no floating point is
//! involved in deciding which axis to crop.

use super::params::{CropRect, Tile};
use crate::geometry::{AspectRatio, Dimensions, Grid};

/// Largest centered rectangle of `source` whose ratio matches `target`.
///
/// A source that is relatively wider than the target loses width, one that
/// is relatively taller loses height; the other axis is kept whole. The
/// removed margin is split evenly, with any odd pixel going to the right or
/// bottom edge. A source already at the target ratio is returned uncropped.
///
/// # Examples
/// ```
/// # use colorpage::geometry::{AspectRatio, Dimensions};
/// # use colorpage::imaging::center_crop_rect;
/// // 1536x1024 cropped to a square keeps the full height
/// let rect = center_crop_rect(Dimensions { width: 1536, height: 1024 }, AspectRatio::new(1, 1));
/// assert_eq!((rect.x, rect.y, rect.width, rect.height), (256, 0, 1024, 1024));
/// ```
pub fn center_crop_rect(source: Dimensions, target: AspectRatio) -> CropRect {
    let (w, h) = (source.width as u64, source.height as u64);
    let (tw, th) = (target.width() as u64, target.height() as u64);

    let source_cross = w * th;
    let target_cross = h * tw;

    if source_cross > target_cross {
        // Source is wider: keep height, crop width
        let crop_w = ((2 * h * tw + th) / (2 * th)).clamp(1, w);
        CropRect {
            x: ((w - crop_w) / 2) as u32,
            y: 0,
            width: crop_w as u32,
            height: source.height,
        }
    } else if source_cross < target_cross {
        // Source is taller: keep width, crop height
        let crop_h = ((2 * w * th + tw) / (2 * tw)).clamp(1, h);
        CropRect {
            x: 0,
            y: ((h - crop_h) / 2) as u32,
            width: source.width,
            height: crop_h as u32,
        }
    } else {
        CropRect::full(source)
    }
}

/// Split a raster into the grid's page tiles, row-major.
///
/// Every tile has the same pixel size, `floor(width / n) × floor(height / m)`.
/// Remainder pixels on the right and bottom edges are not part of any tile.
pub fn tile_rects(dims: Dimensions, grid: Grid) -> Vec<Tile> {
    let tile_w = dims.width / grid.n();
    let tile_h = dims.height / grid.m();

    let mut tiles = Vec::with_capacity(grid.page_count() as usize);
    for row in 0..grid.m() {
        for col in 0..grid.n() {
            tiles.push(Tile {
                row,
                col,
                rect: CropRect {
                    x: col * tile_w,
                    y: row * tile_h,
                    width: tile_w,
                    height: tile_h,
                },
            });
        }
    }
    tiles
}
