//! Parameter types for raster operations.
//!
//! These structs describe *what* region to take and *how big* the result
//! should be. [`calculations`](super::calculations) produces them from print
//! geometry; a [`RasterSurface`](super::backend::RasterSurface) consumes them.
//! Keeping them plain data is what lets tests swap in a recording mock.

use crate::geometry::Dimensions;

/// A pixel rectangle inside a raster. Origin is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    /// The whole of a raster of the given size.
    pub fn full(dims: Dimensions) -> Self {
        Self {
            x: 0,
            y: 0,
            width: dims.width,
            height: dims.height,
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width,
            height: self.height,
        }
    }

    /// True when the rectangle lies entirely inside `bounds`.
    pub fn fits_within(&self, bounds: Dimensions) -> bool {
        self.width > 0
            && self.height > 0
            && self.x as u64 + self.width as u64 <= bounds.width as u64
            && self.y as u64 + self.height as u64 <= bounds.height as u64
    }
}

/// Crop a region out of the source, then scale it to `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropResizeParams {
    pub crop: CropRect,
    pub target: Dimensions,
}

/// One print page's slice of the composed canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub row: u32,
    pub col: u32,
    pub rect: CropRect,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_rect_covers_source() {
        let dims = Dimensions {
            width: 640,
            height: 480,
        };
        let rect = CropRect::full(dims);
        assert_eq!(rect.dimensions(), dims);
        assert!(rect.fits_within(dims));
    }

    #[test]
    fn rect_overflowing_bounds_does_not_fit() {
        let bounds = Dimensions {
            width: 100,
            height: 100,
        };
        let rect = CropRect {
            x: 10,
            y: 0,
            width: 95,
            height: 100,
        };
        assert!(!rect.fits_within(bounds));
    }

    #[test]
    fn empty_rect_does_not_fit() {
        let bounds = Dimensions {
            width: 100,
            height: 100,
        };
        let rect = CropRect {
            x: 0,
            y: 0,
            width: 0,
            height: 10,
        };
        assert!(!rect.fits_within(bounds));
    }
}
