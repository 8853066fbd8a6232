//! Export pipeline: one prepared raster, three encoders.
//!
//! ```text
//! image bytes ──decode──▶ center crop to layout ratio ──▶ white flatten + resize
//!                                                               │
//!                      ┌────────────────────┬───────────────────┤
//!                      ▼                    ▼                   ▼
//!                    PNG             trace → SVG        N×M tiles → PDF
//! ```
//!
//! Every encoder consumes the same [`prepare_print_raster`] output, so the
//! printed pages match the preview ratio exactly. Encoding happens fully in
//! memory; [`write_artifact`] only touches disk once the bytes exist, and
//! does so through a temporary file that is renamed into place.

pub mod archive;
pub mod pdf;
pub mod trace;

use crate::imaging::{BackendError, RasterSurface, prepare_print_raster, split_tiles};
use crate::naming;
use crate::types::GenerationConfig;
use chrono::{DateTime, Utc};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

pub use pdf::{PdfPage, build_pdf};
pub use trace::{TraceOptions, raster_to_svg};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Image processing failed: {0}")]
    Raster(#[from] BackendError),
    #[error("PDF encoding failed: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("ZIP encoding failed: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Nothing to export")]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum ExportFormat {
    Png,
    Svg,
    Pdf,
}

impl ExportFormat {
    pub fn mime(self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Svg => "image/svg+xml",
            ExportFormat::Pdf => "application/pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportFormat::Png => "png",
            ExportFormat::Svg => "svg",
            ExportFormat::Pdf => "pdf",
        })
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "svg" => Ok(ExportFormat::Svg),
            "pdf" => Ok(ExportFormat::Pdf),
            other => Err(format!("unknown export format '{other}' (png, svg, pdf)")),
        }
    }
}

pub const ZIP_MIME: &str = "application/zip";

/// Raster and tracing settings shared by every export.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportSettings {
    /// Longer side of the prepared raster, in pixels.
    pub max_side: u32,
    pub trace: TraceOptions,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            max_side: 2048,
            trace: TraceOptions::default(),
        }
    }
}

/// A fully encoded download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub filename: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

/// Run the pipeline for one artifact.
///
/// The layout comes from `config`, the snapshot the image was generated
/// with, so a later change of form settings cannot skew an older artifact.
pub fn export_image(
    surface: &impl RasterSurface,
    image_bytes: &[u8],
    config: &GenerationConfig,
    format: ExportFormat,
    settings: &ExportSettings,
    created: DateTime<Utc>,
) -> Result<ExportArtifact, ExportError> {
    let layout = config.layout();
    let raster = prepare_print_raster(surface, image_bytes, &layout, settings.max_side)?;

    let (filename, bytes) = match format {
        ExportFormat::Png => (
            naming::PNG_FILENAME.to_string(),
            surface.encode_png(&raster)?,
        ),
        ExportFormat::Svg => (
            naming::SVG_FILENAME.to_string(),
            raster_to_svg(&raster, &settings.trace).into_bytes(),
        ),
        ExportFormat::Pdf => {
            let tiles = split_tiles(surface, &raster, layout.grid)?;
            let page = layout.page();
            let pages: Vec<PdfPage> = tiles
                .iter()
                .map(|(_, image)| PdfPage { image, page })
                .collect();
            let title = format!("Coloring page {}", config.summary());
            (
                naming::pdf_filename(&layout),
                build_pdf(&pages, &title, created)?,
            )
        }
    };

    tracing::info!(
        format = %format,
        filename = %filename,
        bytes = bytes.len(),
        "export encoded"
    );
    Ok(ExportArtifact {
        filename,
        mime: format.mime(),
        bytes,
    })
}

/// Write `artifact` into `dir` under its own file name.
///
/// The bytes go to a temporary file in `dir` first and are renamed over the
/// destination only after a complete write.
pub fn write_artifact(dir: &Path, artifact: &ExportArtifact) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(dir)?;
    let destination = dir.join(&artifact.filename);

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(&artifact.bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(&destination).map_err(|e| e.error)?;

    tracing::debug!(path = %destination.display(), "export written");
    Ok(destination)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Dimensions, Grid};
    use crate::imaging::backend::tests::{MockSurface, RecordedOp};

    fn config_2x2() -> GenerationConfig {
        GenerationConfig {
            grid: Grid::new(2, 2).unwrap(),
            ..GenerationConfig::free("owls")
        }
    }

    fn mock_1024() -> MockSurface {
        MockSurface::with_dimensions(vec![Dimensions {
            width: 1024,
            height: 1024,
        }])
    }

    #[test]
    fn png_export_encodes_prepared_raster() {
        let surface = mock_1024();
        let config = config_2x2();
        let artifact = export_image(
            &surface,
            b"png",
            &config,
            ExportFormat::Png,
            &ExportSettings::default(),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(artifact.filename, "coloring-page.png");
        assert_eq!(artifact.mime, "image/png");
        let target = config.layout().target_pixels(2048);
        let ops = surface.get_operations();
        assert_eq!(ops.last(), Some(&RecordedOp::EncodePng {
            width: target.width,
            height: target.height
        }));
    }

    #[test]
    fn svg_export_is_svg_document() {
        let surface = mock_1024();
        let settings = ExportSettings {
            max_side: 256,
            ..ExportSettings::default()
        };
        let artifact = export_image(
            &surface,
            b"png",
            &config_2x2(),
            ExportFormat::Svg,
            &settings,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(artifact.mime, "image/svg+xml");
        let text = String::from_utf8(artifact.bytes).unwrap();
        assert!(text.contains("<svg"));
    }

    #[test]
    fn pdf_export_crops_every_tile() {
        let surface = mock_1024();
        let settings = ExportSettings {
            max_side: 256,
            ..ExportSettings::default()
        };
        let artifact = export_image(
            &surface,
            b"png",
            &config_2x2(),
            ExportFormat::Pdf,
            &settings,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(artifact.filename, "coloring-page-2x2-A4.pdf");
        assert_eq!(artifact.mime, "application/pdf");
        let crops = surface
            .get_operations()
            .into_iter()
            .filter(|op| matches!(op, RecordedOp::Crop(_)))
            .count();
        assert_eq!(crops, 4);
        assert!(artifact.bytes.starts_with(b"%PDF-1.5"));
    }

    #[test]
    fn failed_decode_is_export_error() {
        let surface = MockSurface::new();
        let result = export_image(
            &surface,
            b"",
            &config_2x2(),
            ExportFormat::Png,
            &ExportSettings::default(),
            Utc::now(),
        );
        assert!(matches!(result, Err(ExportError::Raster(_))));
    }

    #[test]
    fn write_artifact_leaves_only_final_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let artifact = ExportArtifact {
            filename: "coloring-page.png".into(),
            mime: "image/png",
            bytes: vec![1, 2, 3],
        };
        let path = write_artifact(tmp.path(), &artifact).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3]);

        let entries: Vec<_> = std::fs::read_dir(tmp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn write_artifact_replaces_existing_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("coloring-page.svg"), "old").unwrap();
        let artifact = ExportArtifact {
            filename: "coloring-page.svg".into(),
            mime: "image/svg+xml",
            bytes: b"new".to_vec(),
        };
        write_artifact(tmp.path(), &artifact).unwrap();
        assert_eq!(
            std::fs::read_to_string(tmp.path().join("coloring-page.svg")).unwrap(),
            "new"
        );
    }

    #[test]
    fn format_parses_case_insensitively() {
        assert_eq!("PDF".parse::<ExportFormat>(), Ok(ExportFormat::Pdf));
        assert!("tiff".parse::<ExportFormat>().is_err());
    }
}
