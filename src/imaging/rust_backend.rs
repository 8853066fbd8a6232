//! Pure Rust raster backend over the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (PNG, JPEG, WebP) | `image::load_from_memory` |
//! | Crop | `image::imageops::crop_imm` |
//! | Flatten transparency | per-pixel composite over white |
//! | Resize | `image::imageops::resize` with `Lanczos3` filter |
//! | Encode → PNG | `image::codecs::png::PngEncoder` (RGB8) |

use super::backend::{BackendError, Dimensions, PixelBuffer, RasterSurface};
use super::params::{CropRect, CropResizeParams};
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{ExtendedColorType, ImageEncoder, Rgba};

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn buffer_dimensions(buffer: &PixelBuffer) -> Dimensions {
    Dimensions {
        width: buffer.width(),
        height: buffer.height(),
    }
}

fn check_rect(buffer: &PixelBuffer, rect: CropRect) -> Result<(), BackendError> {
    if rect.fits_within(buffer_dimensions(buffer)) {
        Ok(())
    } else {
        Err(BackendError::ProcessingFailed(format!(
            "crop {}x{}+{}+{} outside {}x{} source",
            rect.width,
            rect.height,
            rect.x,
            rect.y,
            buffer.width(),
            buffer.height()
        )))
    }
}

/// Composite every pixel over opaque white.
fn flatten_onto_white(buffer: &mut PixelBuffer) {
    for pixel in buffer.pixels_mut() {
        let Rgba([r, g, b, a]) = *pixel;
        let alpha = a as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        *pixel = Rgba([blend(r), blend(g), blend(b), 255]);
    }
}

impl RasterSurface for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<PixelBuffer, BackendError> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| BackendError::Decode(format!("Failed to decode image: {}", e)))?;
        Ok(img.to_rgba8())
    }

    fn crop_resize(
        &self,
        source: &PixelBuffer,
        params: &CropResizeParams,
    ) -> Result<PixelBuffer, BackendError> {
        if params.target.width == 0 || params.target.height == 0 {
            return Err(BackendError::ProcessingFailed(
                "resize target has a zero side".to_string(),
            ));
        }
        let mut cropped = self.crop(source, params.crop)?;
        flatten_onto_white(&mut cropped);
        if cropped.dimensions() == (params.target.width, params.target.height) {
            return Ok(cropped);
        }
        Ok(image::imageops::resize(
            &cropped,
            params.target.width,
            params.target.height,
            FilterType::Lanczos3,
        ))
    }

    fn crop(&self, source: &PixelBuffer, rect: CropRect) -> Result<PixelBuffer, BackendError> {
        check_rect(source, rect)?;
        Ok(image::imageops::crop_imm(source, rect.x, rect.y, rect.width, rect.height).to_image())
    }

    fn encode_png(&self, buffer: &PixelBuffer) -> Result<Vec<u8>, BackendError> {
        let rgb = image::DynamicImage::ImageRgba8(buffer.clone()).to_rgb8();
        let mut out = Vec::new();
        PngEncoder::new(&mut out)
            .write_image(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                ExtendedColorType::Rgb8,
            )
            .map_err(|e| BackendError::ProcessingFailed(format!("PNG encode failed: {}", e)))?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn encode_test_png(img: &RgbaImage) -> Vec<u8> {
        let mut out = Vec::new();
        PngEncoder::new(&mut out)
            .write_image(
                img.as_raw(),
                img.width(),
                img.height(),
                ExtendedColorType::Rgba8,
            )
            .unwrap();
        out
    }

    #[test]
    fn decode_synthetic_png() {
        let img = RgbaImage::from_pixel(40, 30, Rgba([0, 0, 0, 255]));
        let backend = RustBackend::new();
        let decoded = backend.decode(&encode_test_png(&img)).unwrap();
        assert_eq!(decoded.dimensions(), (40, 30));
    }

    #[test]
    fn decode_garbage_errors() {
        let backend = RustBackend::new();
        assert!(matches!(
            backend.decode(b"not an image"),
            Err(BackendError::Decode(_))
        ));
    }

    #[test]
    fn crop_resize_hits_exact_target() {
        let source = RgbaImage::from_pixel(300, 200, Rgba([0, 0, 0, 255]));
        let backend = RustBackend::new();
        let out = backend
            .crop_resize(&source, &CropResizeParams {
                crop: CropRect {
                    x: 50,
                    y: 0,
                    width: 200,
                    height: 200,
                },
                target: Dimensions {
                    width: 64,
                    height: 64,
                },
            })
            .unwrap();
        assert_eq!(out.dimensions(), (64, 64));
    }

    #[test]
    fn transparent_pixels_become_white() {
        let source = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 0]));
        let backend = RustBackend::new();
        let out = backend
            .crop_resize(&source, &CropResizeParams {
                crop: CropRect::full(Dimensions {
                    width: 10,
                    height: 10,
                }),
                target: Dimensions {
                    width: 10,
                    height: 10,
                },
            })
            .unwrap();
        assert!(out.pixels().all(|p| *p == Rgba([255, 255, 255, 255])));
    }

    #[test]
    fn opaque_black_stays_black() {
        let mut buffer = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 255]));
        buffer.put_pixel(1, 0, Rgba([0, 0, 0, 128]));
        flatten_onto_white(&mut buffer);
        assert_eq!(*buffer.get_pixel(0, 0), Rgba([0, 0, 0, 255]));
        // Half-transparent black lands mid-gray
        let gray = buffer.get_pixel(1, 0).0[0];
        assert!((126..=128).contains(&gray), "got {gray}");
    }

    #[test]
    fn crop_outside_source_errors() {
        let source = RgbaImage::new(10, 10);
        let backend = RustBackend::new();
        let result = backend.crop(&source, CropRect {
            x: 5,
            y: 5,
            width: 10,
            height: 1,
        });
        assert!(matches!(result, Err(BackendError::ProcessingFailed(_))));
    }

    #[test]
    fn encode_png_is_decodable_rgb() {
        let buffer = RgbaImage::from_pixel(12, 8, Rgba([255, 255, 255, 255]));
        let backend = RustBackend::new();
        let png = backend.encode_png(&buffer).unwrap();
        assert_eq!(&png[1..4], b"PNG");
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.color(), image::ColorType::Rgb8);
        assert_eq!((decoded.width(), decoded.height()), (12, 8));
    }
}
