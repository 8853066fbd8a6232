//! Paper and print-grid geometry.
//!
//! Everything the export pipeline, the prompt builder and the preview agree
//! on is derived here from a single `(grid, paper size, orientation)` triple.
//! All functions are pure and work in integer millimetres, so the reduced
//! aspect ratio is exact and renders identically at every call site.
//!
//! ```text
//! paper (portrait mm) ──orientation──▶ effective page ──× grid──▶ canvas mm
//!                                                                  │
//!                                          gcd-reduced "w:h" ◀─────┘
//!                                                  │
//!                       prompt text · preview box · crop target · tile size
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Largest grid dimension offered by the form (pages across or down).
pub const MAX_GRID: u32 = 6;

const MM_PER_INCH: f64 = 25.4;
const POINTS_PER_INCH: f64 = 72.0;

/// Convert millimetres to PDF points.
pub fn mm_to_pt(mm: f64) -> f64 {
    mm * POINTS_PER_INCH / MM_PER_INCH
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum GridError {
    #[error("grid must be between 1x1 and 6x6, got {n}x{m}")]
    OutOfRange { n: u32, m: u32 },
    #[error("invalid grid '{0}': expected NxM, e.g. 2x3")]
    Parse(String),
}

/// One of the ten supported ISO 216 sheet formats.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum PaperSize {
    A1,
    A2,
    A3,
    A4,
    A5,
    B1,
    B2,
    B3,
    B4,
    B5,
}

impl PaperSize {
    pub const ALL: [PaperSize; 10] = [
        PaperSize::A1,
        PaperSize::A2,
        PaperSize::A3,
        PaperSize::A4,
        PaperSize::A5,
        PaperSize::B1,
        PaperSize::B2,
        PaperSize::B3,
        PaperSize::B4,
        PaperSize::B5,
    ];

    /// Portrait footprint in millimetres (width < height).
    pub fn dimensions(self) -> PaperDimensions {
        let (width, height) = match self {
            PaperSize::A1 => (594, 841),
            PaperSize::A2 => (420, 594),
            PaperSize::A3 => (297, 420),
            PaperSize::A4 => (210, 297),
            PaperSize::A5 => (148, 210),
            PaperSize::B1 => (707, 1000),
            PaperSize::B2 => (500, 707),
            PaperSize::B3 => (353, 500),
            PaperSize::B4 => (250, 353),
            PaperSize::B5 => (176, 250),
        };
        PaperDimensions { width, height }
    }

    pub fn label(self) -> &'static str {
        match self {
            PaperSize::A1 => "A1",
            PaperSize::A2 => "A2",
            PaperSize::A3 => "A3",
            PaperSize::A4 => "A4",
            PaperSize::A5 => "A5",
            PaperSize::B1 => "B1",
            PaperSize::B2 => "B2",
            PaperSize::B3 => "B3",
            PaperSize::B4 => "B4",
            PaperSize::B5 => "B5",
        }
    }
}

impl fmt::Display for PaperSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Portrait.
    #[default]
    Vertical,
    /// Landscape.
    Horizontal,
}

impl Orientation {
    pub fn toggled(self) -> Self {
        match self {
            Orientation::Vertical => Orientation::Horizontal,
            Orientation::Horizontal => Orientation::Vertical,
        }
    }

    pub fn is_landscape(self) -> bool {
        self == Orientation::Horizontal
    }
}

/// A width × height footprint in whole millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperDimensions {
    pub width: u32,
    pub height: u32,
}

impl PaperDimensions {
    pub fn swapped(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }

    /// Size in PDF points as `(width, height)`.
    pub fn to_points(self) -> (f64, f64) {
        (mm_to_pt(self.width as f64), mm_to_pt(self.height as f64))
    }
}

/// Pixel dimensions of a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Pages across (`n`) by pages down (`m`). Always within `1..=MAX_GRID`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "[u32; 2]", into = "[u32; 2]")]
pub struct Grid {
    n: u32,
    m: u32,
}

impl Grid {
    pub fn new(n: u32, m: u32) -> Result<Self, GridError> {
        if !(1..=MAX_GRID).contains(&n) || !(1..=MAX_GRID).contains(&m) {
            return Err(GridError::OutOfRange { n, m });
        }
        Ok(Self { n, m })
    }

    pub fn single() -> Self {
        Self { n: 1, m: 1 }
    }

    pub fn n(self) -> u32 {
        self.n
    }

    pub fn m(self) -> u32 {
        self.m
    }

    pub fn page_count(self) -> u32 {
        self.n * self.m
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self { n: 2, m: 2 }
    }
}

impl TryFrom<[u32; 2]> for Grid {
    type Error = GridError;

    fn try_from([n, m]: [u32; 2]) -> Result<Self, Self::Error> {
        Grid::new(n, m)
    }
}

impl From<Grid> for [u32; 2] {
    fn from(grid: Grid) -> Self {
        [grid.n, grid.m]
    }
}

impl FromStr for Grid {
    type Err = GridError;

    /// Parses `2x3`, `2X3` or `2×3`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_err = || GridError::Parse(s.to_string());
        let (n, m) = s
            .trim()
            .split_once(['x', 'X', '×'])
            .ok_or_else(parse_err)?;
        let n = n.trim().parse::<u32>().map_err(|_| parse_err())?;
        let m = m.trim().parse::<u32>().map_err(|_| parse_err())?;
        Grid::new(n, m)
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.n, self.m)
    }
}

/// Greatest common divisor, with `gcd(x, 0) == x`.
pub fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 { a } else { gcd(b, a % b) }
}

/// A width:height ratio reduced to lowest terms.
///
/// `Display` renders `w:h`; that string is what the prompt, the preview and
/// the exporter all compare against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AspectRatio {
    width: u32,
    height: u32,
}

impl AspectRatio {
    /// Reduce `width:height` by their gcd. Both sides must be non-zero.
    pub fn new(width: u32, height: u32) -> Self {
        debug_assert!(width > 0 && height > 0, "aspect ratio sides must be non-zero");
        let g = gcd(width, height).max(1);
        Self {
            width: width / g,
            height: height / g,
        }
    }

    pub fn width(self) -> u32 {
        self.width
    }

    pub fn height(self) -> u32 {
        self.height
    }

    pub fn as_f64(self) -> f64 {
        self.width as f64 / self.height as f64
    }

    /// Scale so the longer side equals `max_side`, rounding the other side
    /// to the nearest pixel (halves round up). Never returns a zero side.
    pub fn fit_longest_side(self, max_side: u32) -> Dimensions {
        let (w, h, max) = (self.width as u64, self.height as u64, max_side as u64);
        if w >= h {
            let height = (max * h * 2 + w) / (2 * w);
            Dimensions {
                width: max_side,
                height: (height as u32).max(1),
            }
        } else {
            let width = (max * w * 2 + h) / (2 * h);
            Dimensions {
                width: (width as u32).max(1),
                height: max_side,
            }
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

/// The page as it will be printed: the portrait table entry, swapped for
/// landscape.
pub fn effective_page(paper: PaperSize, orientation: Orientation) -> PaperDimensions {
    let portrait = paper.dimensions();
    match orientation {
        Orientation::Vertical => portrait,
        Orientation::Horizontal => portrait.swapped(),
    }
}

/// Total composed canvas in millimetres: `(n × page width, m × page height)`.
pub fn canvas_mm(grid: Grid, paper: PaperSize, orientation: Orientation) -> PaperDimensions {
    let page = effective_page(paper, orientation);
    PaperDimensions {
        width: grid.n() * page.width,
        height: grid.m() * page.height,
    }
}

pub fn canvas_aspect_ratio(grid: Grid, paper: PaperSize, orientation: Orientation) -> AspectRatio {
    let canvas = canvas_mm(grid, paper, orientation);
    AspectRatio::new(canvas.width, canvas.height)
}

/// Working-canvas size for crop/resize: the canvas ratio with its longer
/// side set to `max_side`.
pub fn target_pixel_dimensions(
    grid: Grid,
    paper: PaperSize,
    orientation: Orientation,
    max_side: u32,
) -> Dimensions {
    canvas_aspect_ratio(grid, paper, orientation).fit_longest_side(max_side)
}

/// Grid guide lines over the preview, as percentages of the preview box.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewOverlay {
    pub aspect: AspectRatio,
    /// Left offsets of the N-1 vertical cut lines.
    pub vertical_guides: Vec<f64>,
    /// Top offsets of the M-1 horizontal cut lines.
    pub horizontal_guides: Vec<f64>,
}

fn guide_positions(divisions: u32) -> Vec<f64> {
    (1..divisions)
        .map(|i| i as f64 / divisions as f64 * 100.0)
        .collect()
}

/// Derived print geometry for one `(grid, paper, orientation)` choice.
///
/// Recompute it whenever the inputs change; it holds no state of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrintLayout {
    pub grid: Grid,
    pub paper: PaperSize,
    pub orientation: Orientation,
}

impl PrintLayout {
    pub fn new(grid: Grid, paper: PaperSize, orientation: Orientation) -> Self {
        Self {
            grid,
            paper,
            orientation,
        }
    }

    pub fn page(&self) -> PaperDimensions {
        effective_page(self.paper, self.orientation)
    }

    pub fn canvas(&self) -> PaperDimensions {
        canvas_mm(self.grid, self.paper, self.orientation)
    }

    pub fn aspect_ratio(&self) -> AspectRatio {
        canvas_aspect_ratio(self.grid, self.paper, self.orientation)
    }

    pub fn target_pixels(&self, max_side: u32) -> Dimensions {
        target_pixel_dimensions(self.grid, self.paper, self.orientation, max_side)
    }

    pub fn page_count(&self) -> u32 {
        self.grid.page_count()
    }

    pub fn overlay(&self) -> PreviewOverlay {
        PreviewOverlay {
            aspect: self.aspect_ratio(),
            vertical_guides: guide_positions(self.grid.n()),
            horizontal_guides: guide_positions(self.grid.m()),
        }
    }
}
