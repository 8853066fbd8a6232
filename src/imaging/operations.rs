//! High-level raster operations.
//!
//! These functions combine calculations with backend execution. They take
//! print geometry, compute rectangles, and call the surface.

use super::backend::{BackendError, Dimensions, PixelBuffer, RasterSurface};
use super::calculations::{center_crop_rect, tile_rects};
use super::params::{CropResizeParams, Tile};
use crate::geometry::{Grid, PrintLayout};

/// Result type for raster operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Decode only to learn the pixel size.
pub fn get_dimensions(surface: &impl RasterSurface, bytes: &[u8]) -> Result<Dimensions> {
    let buffer = surface.decode(bytes)?;
    Ok(Dimensions {
        width: buffer.width(),
        height: buffer.height(),
    })
}

/// The shared first stage of every export.
///
/// Decodes the generated image, center-crops it to the layout's aspect
/// ratio, flattens transparency onto white and scales it so the longer side
/// is `max_side`. The result is exactly `layout.target_pixels(max_side)`.
pub fn prepare_print_raster(
    surface: &impl RasterSurface,
    image_bytes: &[u8],
    layout: &PrintLayout,
    max_side: u32,
) -> Result<PixelBuffer> {
    let source = surface.decode(image_bytes)?;
    let source_dims = Dimensions {
        width: source.width(),
        height: source.height(),
    };
    let params = CropResizeParams {
        crop: center_crop_rect(source_dims, layout.aspect_ratio()),
        target: layout.target_pixels(max_side),
    };
    tracing::debug!(
        source = %format!("{}x{}", source_dims.width, source_dims.height),
        crop = ?params.crop,
        target = %format!("{}x{}", params.target.width, params.target.height),
        "preparing print raster"
    );
    surface.crop_resize(&source, &params)
}

/// Cut a prepared raster into its page tiles, row-major.
pub fn split_tiles(
    surface: &impl RasterSurface,
    raster: &PixelBuffer,
    grid: Grid,
) -> Result<Vec<(Tile, PixelBuffer)>> {
    let dims = Dimensions {
        width: raster.width(),
        height: raster.height(),
    };
    tile_rects(dims, grid)
        .into_iter()
        .map(|tile| {
            if tile.rect.width == 0 || tile.rect.height == 0 {
                return Err(BackendError::ProcessingFailed(format!(
                    "{}x{} raster is too small for a {} grid",
                    dims.width, dims.height, grid
                )));
            }
            let pixels = surface.crop(raster, tile.rect)?;
            Ok((tile, pixels))
        })
        .collect()
}
