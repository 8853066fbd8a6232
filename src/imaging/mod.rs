//! Raster processing — pure Rust over the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::load_from_memory` |
//! | **Center crop + resize** | `crop_imm` + white flatten + Lanczos3 |
//! | **Tile split** | `crop_imm` per page |
//! | **Encode → PNG** | `PngEncoder` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for crop and tile rectangles (unit testable)
//! - **Parameters**: Data structures describing raster operations
//! - **Backend**: [`RasterSurface`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, PixelBuffer, RasterSurface};
pub use calculations::{center_crop_rect, tile_rects};
pub use operations::{get_dimensions, prepare_print_raster, split_tiles};
pub use params::{CropRect, CropResizeParams, Tile};
pub use rust_backend::RustBackend;
