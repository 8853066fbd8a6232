//! Raster surface trait and shared types.
//!
//! The [`RasterSurface`] trait is the only way the export pipeline touches
//! pixels: decode, crop, crop-and-resize, and PNG encode. Geometry and export
//! code depend on the trait, never on a concrete image library.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend) over the `image` crate.

use super::params::{CropRect, CropResizeParams};
use thiserror::Error;

pub use crate::geometry::Dimensions;

/// Decoded pixels. RGBA so transparency survives decode; everything after
/// [`RasterSurface::crop_resize`] is fully opaque.
pub type PixelBuffer = image::RgbaImage;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Pixel operations every backend must provide.
pub trait RasterSurface {
    /// Decode encoded image bytes (PNG, JPEG, WebP).
    fn decode(&self, bytes: &[u8]) -> Result<PixelBuffer, BackendError>;

    /// Crop `params.crop` out of `source`, composite it over solid white and
    /// scale it to exactly `params.target`.
    fn crop_resize(
        &self,
        source: &PixelBuffer,
        params: &CropResizeParams,
    ) -> Result<PixelBuffer, BackendError>;

    /// Copy a sub-rectangle without scaling.
    fn crop(&self, source: &PixelBuffer, rect: CropRect) -> Result<PixelBuffer, BackendError>;

    fn encode_png(&self, buffer: &PixelBuffer) -> Result<Vec<u8>, BackendError>;
}
