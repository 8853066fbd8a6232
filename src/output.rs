//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Layout
//!
//! ```text
//! Layout 2x3 A4 portrait (6 pages)
//!     Page: 210 x 297 mm
//!     Canvas: 420 x 891 mm
//!     Aspect: 140:297
//!     Raster: 965 x 2048 px
//!     Guides across: 50%
//!     Guides down: 33.3%, 66.7%
//! ```
//!
//! ## Generation
//!
//! ```text
//! Generating "dinosaurs" (2x2 A4), aspect 210:297
//!     [1/3] requesting
//!     [1/3] ready #1 (812 KB)
//!     [2/3] requesting
//!     [2/3] blocked: Blocked by the safety filter; try a different topic or theme
//! ```
//!
//! ## Gallery
//!
//! ```text
//! 001 #3 "dinosaurs" (2x2 A4)  * active
//!     Created: 2026-03-14 09:30 UTC
//! 002 #2 mandala: ocean (1x1 B5)  [selected]
//!     Created: 2026-03-14 09:28 UTC
//! ```
//!
//! # Architecture
//!
//! Each concern has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure.

use crate::credentials::{ApiKey, KeySource};
use crate::gallery::Gallery;
use crate::generation::GenerationEvent;
use crate::geometry::PrintLayout;
use crate::notify::ToastMessage;
use crate::types::ArtifactId;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Human byte count: `512 B`, `48 KB`, `1.2 MB`.
fn format_bytes(bytes: usize) -> String {
    match bytes {
        b if b < 1024 => format!("{b} B"),
        b if b < 1024 * 1024 => format!("{} KB", b / 1024),
        b => format!("{:.1} MB", b as f64 / (1024.0 * 1024.0)),
    }
}

/// Guide percentages with at most one decimal: `50%`, `33.3%`.
fn format_guides(guides: &[f64]) -> String {
    if guides.is_empty() {
        return "none".to_string();
    }
    guides
        .iter()
        .map(|g| {
            let rounded = (g * 10.0).round() / 10.0;
            if rounded.fract() == 0.0 {
                format!("{rounded:.0}%")
            } else {
                format!("{rounded:.1}%")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// Layout
// ============================================================================

pub fn format_layout(layout: &PrintLayout, max_side: u32) -> Vec<String> {
    let page = layout.page();
    let canvas = layout.canvas();
    let raster = layout.target_pixels(max_side);
    let overlay = layout.overlay();
    let orientation = if layout.orientation.is_landscape() {
        "landscape"
    } else {
        "portrait"
    };
    let pages = layout.page_count();

    vec![
        format!(
            "Layout {} {} {} ({} page{})",
            layout.grid,
            layout.paper,
            orientation,
            pages,
            if pages == 1 { "" } else { "s" }
        ),
        format!("{}Page: {} x {} mm", indent(1), page.width, page.height),
        format!("{}Canvas: {} x {} mm", indent(1), canvas.width, canvas.height),
        format!("{}Aspect: {}", indent(1), overlay.aspect),
        format!("{}Raster: {} x {} px", indent(1), raster.width, raster.height),
        format!(
            "{}Guides across: {}",
            indent(1),
            format_guides(&overlay.vertical_guides)
        ),
        format!(
            "{}Guides down: {}",
            indent(1),
            format_guides(&overlay.horizontal_guides)
        ),
    ]
}

pub fn print_layout(layout: &PrintLayout, max_side: u32) {
    for line in format_layout(layout, max_side) {
        println!("{}", line);
    }
}

// ============================================================================
// Generation progress
// ============================================================================

/// Format a single generation progress event as display lines.
pub fn format_generation_event(event: &GenerationEvent) -> Vec<String> {
    match event {
        GenerationEvent::BatchStarted {
            total,
            aspect,
            summary,
        } => {
            let count = if *total == 1 {
                String::new()
            } else {
                format!(" x{total}")
            };
            vec![format!("Generating {summary}{count}, aspect {aspect}")]
        }
        GenerationEvent::Attempt { current, total } => {
            vec![format!("{}[{current}/{total}] requesting", indent(1))]
        }
        GenerationEvent::ItemReady {
            current,
            total,
            id,
            bytes,
        } => vec![format!(
            "{}[{current}/{total}] ready {id} ({})",
            indent(1),
            format_bytes(*bytes)
        )],
        GenerationEvent::ItemFailed {
            current,
            total,
            safety_blocked,
            message,
        } => {
            let label = if *safety_blocked { "blocked" } else { "failed" };
            vec![format!("{}[{current}/{total}] {label}: {message}", indent(1))]
        }
    }
}

// ============================================================================
// Notifications
// ============================================================================

pub fn format_toast(toast: &ToastMessage) -> String {
    format!("[{}] {}", toast.severity, toast.text)
}

pub fn print_toast(toast: &ToastMessage) {
    println!("{}", format_toast(toast));
}

// ============================================================================
// Gallery
// ============================================================================

/// Newest first, with the active design and selection marked.
pub fn format_gallery(gallery: &Gallery, active: Option<ArtifactId>) -> Vec<String> {
    if gallery.is_empty() {
        return vec!["Gallery is empty".to_string()];
    }
    let mut lines = Vec::new();
    for (i, item) in gallery.items().iter().enumerate() {
        let mut header = format!(
            "{} {} {}",
            format_index(i + 1),
            item.id,
            item.config.summary()
        );
        if active == Some(item.id) {
            header.push_str("  * active");
        }
        if gallery.is_selected(item.id) {
            header.push_str("  [selected]");
        }
        lines.push(header);
        lines.push(format!(
            "{}Created: {}",
            indent(1),
            item.created_at.format("%Y-%m-%d %H:%M UTC")
        ));
    }
    lines
}

pub fn print_gallery(gallery: &Gallery, active: Option<ArtifactId>) {
    for line in format_gallery(gallery, active) {
        println!("{}", line);
    }
}

// ============================================================================
// Misc
// ============================================================================

pub fn format_help(entries: &[(&str, &str)]) -> Vec<String> {
    let width = entries.iter().map(|(c, _)| c.len()).max().unwrap_or(0);
    entries
        .iter()
        .map(|(command, text)| format!("{}{command:<width$}  {text}", indent(1)))
        .collect()
}

pub fn format_key_status(key: Option<(&ApiKey, KeySource)>) -> String {
    match key {
        Some((key, KeySource::Environment)) => {
            format!("API key: {} (from COLORPAGE_API_KEY)", key.masked())
        }
        Some((key, KeySource::File)) => format!("API key: {}", key.masked()),
        None => "API key: not set".to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
