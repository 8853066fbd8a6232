//! Shared types used across generation, gallery and export.
//!
//! [`GenerationConfig`] is the immutable snapshot the form produces on
//! submit. It is attached to every artifact generated from it and is the
//! single source for the print layout of that artifact.

use crate::geometry::{Grid, Orientation, PaperSize, PrintLayout};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Free-text topic.
    #[default]
    Free,
    /// Symmetric mandala from a preset theme.
    Mandala,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum MandalaTheme {
    #[default]
    Cosmos,
    Nature,
    Flower,
    Snow,
    Ocean,
    Butterfly,
    Star,
    Leaf,
}

impl MandalaTheme {
    pub const ALL: [MandalaTheme; 8] = [
        MandalaTheme::Cosmos,
        MandalaTheme::Nature,
        MandalaTheme::Flower,
        MandalaTheme::Snow,
        MandalaTheme::Ocean,
        MandalaTheme::Butterfly,
        MandalaTheme::Star,
        MandalaTheme::Leaf,
    ];

    /// Theme name as it appears in the prompt.
    pub fn label(self) -> &'static str {
        match self {
            MandalaTheme::Cosmos => "cosmos",
            MandalaTheme::Nature => "nature",
            MandalaTheme::Flower => "flower",
            MandalaTheme::Snow => "snowflake",
            MandalaTheme::Ocean => "ocean",
            MandalaTheme::Butterfly => "butterfly",
            MandalaTheme::Star => "star",
            MandalaTheme::Leaf => "leaf",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

/// Everything the form collects for one generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub mode: Mode,
    /// Only meaningful in [`Mode::Free`].
    pub topic: String,
    /// Only meaningful in [`Mode::Mandala`].
    pub theme: MandalaTheme,
    pub difficulty: Difficulty,
    pub orientation: Orientation,
    pub paper_size: PaperSize,
    pub grid: Grid,
}

impl GenerationConfig {
    pub fn free(topic: impl Into<String>) -> Self {
        Self {
            mode: Mode::Free,
            topic: topic.into(),
            theme: MandalaTheme::default(),
            difficulty: Difficulty::default(),
            orientation: Orientation::default(),
            paper_size: PaperSize::A4,
            grid: Grid::default(),
        }
    }

    pub fn mandala(theme: MandalaTheme) -> Self {
        Self {
            mode: Mode::Mandala,
            theme,
            ..Self::free("")
        }
    }

    /// Derived print geometry. Recomputed on every call.
    pub fn layout(&self) -> PrintLayout {
        PrintLayout::new(self.grid, self.paper_size, self.orientation)
    }

    /// Short human description, e.g. `"dinosaurs" (2x2 A4)` or `mandala: ocean (1x1 B5)`.
    pub fn summary(&self) -> String {
        let subject = match self.mode {
            Mode::Free => format!("\"{}\"", self.topic),
            Mode::Mandala => format!("mandala: {}", self.theme.label()),
        };
        format!("{} ({} {})", subject, self.grid, self.paper_size)
    }
}

/// Identifier of a generated artifact. Never reused within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArtifactId(pub u64);

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic id source owned by whoever allocates ids (a session, a notifier).
#[derive(Debug, Default)]
pub struct IdSequence {
    last: u64,
}

impl IdSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> u64 {
        self.last += 1;
        self.last
    }
}
