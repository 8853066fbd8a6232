//! # colorpage
//!
//! A coloring-page generator. You describe a topic (or pick a mandala
//! theme), a difficulty, a paper size and a print grid; an image model draws
//! black-and-white line art at exactly the right aspect ratio; colorpage
//! crops it, tiles it across the printed pages and writes PNG, SVG or PDF.
//!
//! # Architecture: One Ratio, Three Encoders
//!
//! Everything hangs off a single pure value, [`geometry::PrintLayout`],
//! derived from `(grid, paper, orientation)`:
//!
//! ```text
//!                 PrintLayout ── aspect ratio "140:297"
//!                  │        │          │
//!      prompt text ┘        │          └ preview overlay
//!                           ▼
//! generated image ─▶ center crop ─▶ white flatten + resize
//!                                         │
//!                       ┌─────────────────┼─────────────────┐
//!                       ▼                 ▼                 ▼
//!                      PNG           trace → SVG      N×M tiles → PDF
//! ```
//!
//! The ratio in the generation prompt, the preview and the crop target are
//! all rendered from the same [`geometry::AspectRatio`], so what is previewed
//! is what gets printed.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`geometry`] | Paper table, grid, reduced aspect ratio, target pixels, preview guides |
//! | [`types`] | Generation form (`GenerationConfig`), mandala themes, artifact ids |
//! | [`prompt`] | Generation prompt and edit-operation instructions |
//! | [`service`] | `ImageService` boundary and the Gemini REST client |
//! | [`generation`] | Sequential batch orchestration with failure classification |
//! | [`history`] | Bounded undo stack for edits |
//! | [`notify`] | Single-slot toast notifier |
//! | [`imaging`] | `RasterSurface` capability, center-crop math, `image`-crate backend |
//! | [`export`] | PNG / SVG / PDF encoders, ZIP container, atomic file output |
//! | [`gallery`] | Newest-first gallery with selection and ZIP export |
//! | [`naming`] | Deterministic download and archive-entry names |
//! | [`credentials`] | API key file, environment override, masking |
//! | [`session`] | Active design, busy gate, and the wiring of all of the above |
//! | [`console`] | Command parser for the interactive session |
//! | [`config`] | `colorpage.toml` loading, merging and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Sequential Batches
//!
//! A batch of up to three images is requested one call at a time. This keeps
//! the load on the service bounded and makes progress a plain
//! `(current, total)` counter. A failed call never aborts the batch.
//!
//! ## A Capability, Not a Canvas
//!
//! Pixel work goes through [`imaging::RasterSurface`] (decode, crop/resize,
//! crop, encode PNG). Geometry and export depend only on that trait; tests
//! swap in a recording mock.
//!
//! ## No Partial Files
//!
//! Exports are encoded fully in memory and written through a temporary file
//! that is renamed into place, so a failure at any stage leaves nothing on
//! disk.

pub mod config;
pub mod console;
pub mod credentials;
pub mod export;
pub mod gallery;
pub mod generation;
pub mod geometry;
pub mod history;
pub mod imaging;
pub mod naming;
pub mod notify;
pub mod output;
pub mod prompt;
pub mod service;
pub mod session;
pub mod types;
