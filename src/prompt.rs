//! Instruction text for the generation and edit service.
//!
//! Both builders are pure. The generation prompt embeds the canvas aspect
//! ratio exactly as [`PrintLayout::aspect_ratio`](crate::geometry::PrintLayout::aspect_ratio)
//! renders it, so the image the service returns is cropped against the same
//! ratio it was asked for.

use crate::geometry::Orientation;
use crate::types::{Difficulty, GenerationConfig, Mode};
use std::fmt;
use std::str::FromStr;

fn difficulty_style(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => {
            "simple design with few large shapes and thick outlines, minimal detail, suitable for young children"
        }
        Difficulty::Medium => {
            "moderate detail with clear outlines, some smaller elements, suitable for older children"
        }
        Difficulty::Hard => {
            "highly detailed and intricate patterns with fine lines and complex elements, suitable for advanced students"
        }
    }
}

fn orientation_phrase(orientation: Orientation) -> &'static str {
    match orientation {
        Orientation::Vertical => "portrait orientation (taller than wide)",
        Orientation::Horizontal => "landscape orientation (wider than tall)",
    }
}

const LINE_ART_REQUIREMENTS: &str = "Requirements: pure black outlines on a pure white background, no shading, no gradients, no color fills, no gray areas.";
const NO_TEXT: &str = "IMPORTANT: Do NOT include any text, letters, words, numbers, or written characters anywhere in the design.";
const PRINTABLE: &str =
    "The design must be suitable for printing and coloring with colored pencils or markers.";
const LINE_QUALITY: &str = "Clean, crisp vector-like line art quality.";

/// Build the generation instruction for a form submission.
pub fn build_prompt(config: &GenerationConfig) -> String {
    let aspect = config.layout().aspect_ratio();
    let style = difficulty_style(config.difficulty);
    let layout = format!(
        "Layout: {}. Aspect ratio MUST be exactly {}.",
        orientation_phrase(config.orientation),
        aspect
    );

    let mut lines = Vec::with_capacity(9);
    match config.mode {
        Mode::Mandala => {
            lines.push(format!(
                "Create a black and white mandala coloring page with a \"{}\" theme.",
                config.theme.label()
            ));
            lines.push(format!("Style: {style}."));
            lines.push(
                "The mandala should be a symmetric, circular pattern centered in the image."
                    .to_string(),
            );
        }
        Mode::Free => {
            lines.push(format!(
                "Create a black and white line art coloring page of \"{}\".",
                config.topic.trim()
            ));
            lines.push(format!("Style: {style}."));
        }
    }
    lines.push(layout);
    lines.push(LINE_ART_REQUIREMENTS.to_string());
    lines.push(NO_TEXT.to_string());
    lines.push(match config.mode {
        Mode::Mandala => "CRITICAL: The design MUST fill the ENTIRE canvas from edge to edge with NO empty margins or borders. Extend patterns and decorative elements all the way to the edges of the image.".to_string(),
        Mode::Free => "CRITICAL: The design MUST fill the ENTIRE canvas from edge to edge with NO empty margins or borders. Extend the scene, background elements, and details all the way to the edges of the image.".to_string(),
    });
    lines.push(PRINTABLE.to_string());
    lines.push(LINE_QUALITY.to_string());
    lines.join("\n")
}

/// The closed set of one-click edits offered on the active artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditOperation {
    LineThicken,
    LineThin,
    Simplify,
    AddDetail,
    AddBackgroundPattern,
    RemoveBackground,
}

impl EditOperation {
    pub const ALL: [EditOperation; 6] = [
        EditOperation::LineThicken,
        EditOperation::LineThin,
        EditOperation::Simplify,
        EditOperation::AddDetail,
        EditOperation::AddBackgroundPattern,
        EditOperation::RemoveBackground,
    ];

    pub fn id(self) -> &'static str {
        match self {
            EditOperation::LineThicken => "line-thicken",
            EditOperation::LineThin => "line-thin",
            EditOperation::Simplify => "simplify",
            EditOperation::AddDetail => "add-detail",
            EditOperation::AddBackgroundPattern => "add-background-pattern",
            EditOperation::RemoveBackground => "remove-background",
        }
    }

    pub fn instruction(self) -> &'static str {
        match self {
            EditOperation::LineThicken => {
                "Make all the outlines and lines significantly thicker and bolder. Keep everything else the same."
            }
            EditOperation::LineThin => {
                "Make all the outlines and lines thinner and more delicate. Keep everything else the same."
            }
            EditOperation::Simplify => {
                "Simplify the design by removing small details and merging small shapes into larger ones. Keep the overall composition."
            }
            EditOperation::AddDetail => {
                "Add more intricate details and patterns to the existing design. Keep the overall composition."
            }
            EditOperation::AddBackgroundPattern => {
                "Add a decorative geometric pattern to the background areas. Keep the main subject the same."
            }
            EditOperation::RemoveBackground => {
                "Remove all background elements and patterns. Keep only the main subject with clean white background."
            }
        }
    }
}

impl fmt::Display for EditOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for EditOperation {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EditOperation::ALL
            .into_iter()
            .find(|op| op.id() == s.trim())
            .ok_or(())
    }
}

/// Used for any edit identifier outside [`EditOperation`].
pub const FALLBACK_EDIT_INSTRUCTION: &str =
    "Refine and improve this black and white line art coloring page. Keep the same subject.";

/// Map an edit identifier to its instruction. Unknown identifiers degrade to
/// [`FALLBACK_EDIT_INSTRUCTION`]; this never fails.
pub fn edit_instruction(operation_id: &str) -> &'static str {
    operation_id
        .parse::<EditOperation>()
        .map(EditOperation::instruction)
        .unwrap_or(FALLBACK_EDIT_INSTRUCTION)
}
