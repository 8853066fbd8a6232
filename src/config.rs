//! Application configuration module.
//!
//! Handles loading, validating, and merging `colorpage.toml`. Stock defaults
//! are the base layer; a user file in the config directory overrides any
//! subset of keys.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [service]
//! endpoint = "https://generativelanguage.googleapis.com/v1beta"
//! model = "gemini-2.5-flash-image"
//! timeout_secs = 120
//!
//! [export]
//! max_side = 2048           # Longer side of the print raster, 256-8192
//! output_dir = "."
//!
//! [tracing]
//! luminance_threshold = 128 # Darker pixels are ink
//! line_threshold = 1.0      # Path simplification tolerance (px)
//! path_omit = 8             # Drop specks smaller than this (px²)
//!
//! [history]
//! max_depth = 3
//!
//! [notifications]
//! dismiss_after_ms = 4000
//!
//! [defaults]
//! paper_size = "a4"
//! orientation = "vertical"
//! difficulty = "medium"
//! grid = [2, 2]
//! count = 1                 # Images per generation, 1-3
//! ```
//!
//! Config files are sparse: override just the values you want. Unknown keys
//! are rejected to catch typos early. The API key never lives here; see
//! [`credentials`](crate::credentials).

use crate::export::{ExportSettings, TraceOptions};
use crate::generation::MAX_BATCH;
use crate::geometry::{Grid, Orientation, PaperSize};
use crate::types::Difficulty;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const CONFIG_FILENAME: &str = "colorpage.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Application configuration loaded from `colorpage.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Image generation service connection.
    pub service: ServiceConfig,
    /// Print raster size and output location.
    pub export: ExportConfig,
    /// Vector tracing for SVG export.
    pub tracing: TraceConfig,
    /// Edit undo depth.
    pub history: HistoryConfig,
    pub notifications: NotificationsConfig,
    /// Initial values of the generation form.
    pub defaults: DefaultsConfig,
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service.endpoint.trim().is_empty() {
            return Err(ConfigError::Validation(
                "service.endpoint must not be empty".into(),
            ));
        }
        if self.service.model.trim().is_empty() {
            return Err(ConfigError::Validation(
                "service.model must not be empty".into(),
            ));
        }
        if self.service.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "service.timeout_secs must be positive".into(),
            ));
        }
        if !(256..=8192).contains(&self.export.max_side) {
            return Err(ConfigError::Validation(
                "export.max_side must be 256-8192".into(),
            ));
        }
        if !self.tracing.line_threshold.is_finite() || self.tracing.line_threshold < 0.0 {
            return Err(ConfigError::Validation(
                "tracing.line_threshold must be a non-negative number".into(),
            ));
        }
        if self.history.max_depth == 0 {
            return Err(ConfigError::Validation(
                "history.max_depth must be at least 1".into(),
            ));
        }
        if !(1..=MAX_BATCH).contains(&self.defaults.count) {
            return Err(ConfigError::Validation(format!(
                "defaults.count must be 1-{MAX_BATCH}"
            )));
        }
        Ok(())
    }

    pub fn export_settings(&self) -> ExportSettings {
        ExportSettings {
            max_side: self.export.max_side,
            trace: TraceOptions {
                luminance_threshold: self.tracing.luminance_threshold,
                line_threshold: self.tracing.line_threshold,
                path_omit: self.tracing.path_omit,
            },
        }
    }
}

/// Generation service connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// API base URL, without a trailing slash.
    pub endpoint: String,
    /// Image-capable model name.
    pub model: String,
    /// Per-request timeout. The orchestrator imposes no deadline of its own.
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.5-flash-image".to_string(),
            timeout_secs: 120,
        }
    }
}

impl ServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    pub max_side: u32,
    pub output_dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            max_side: 2048,
            output_dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TraceConfig {
    pub luminance_threshold: u8,
    pub line_threshold: f64,
    pub path_omit: u32,
}

impl Default for TraceConfig {
    fn default() -> Self {
        let stock = TraceOptions::default();
        Self {
            luminance_threshold: stock.luminance_threshold,
            line_threshold: stock.line_threshold,
            path_omit: stock.path_omit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HistoryConfig {
    pub max_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_depth: crate::history::DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotificationsConfig {
    pub dismiss_after_ms: u64,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            dismiss_after_ms: 4000,
        }
    }
}

impl NotificationsConfig {
    pub fn dismiss_after(&self) -> Duration {
        Duration::from_millis(self.dismiss_after_ms)
    }
}

/// Form defaults, applied when the command line leaves a field unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefaultsConfig {
    pub paper_size: PaperSize,
    pub orientation: Orientation,
    pub difficulty: Difficulty,
    /// `[pages across, pages down]`, each 1-6.
    pub grid: Grid,
    pub count: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            paper_size: PaperSize::A4,
            orientation: Orientation::Vertical,
            difficulty: Difficulty::Medium,
            grid: Grid::default(),
            count: 1,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(AppConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `colorpage.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<AppConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `colorpage.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(dir: &Path) -> Result<AppConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(dir)?;
    let config = resolve_config(base, overlay)?;
    tracing::debug!(dir = %dir.display(), "configuration loaded");
    Ok(config)
}

/// Returns a fully-commented stock `colorpage.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# colorpage configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.
# The API key is not stored here: use `colorpage key set` or COLORPAGE_API_KEY.

# ---------------------------------------------------------------------------
# Image generation service
# ---------------------------------------------------------------------------
[service]
# API base URL.
endpoint = "https://generativelanguage.googleapis.com/v1beta"
# Image-capable model used for generation and edits.
model = "gemini-2.5-flash-image"
# Per-request timeout in seconds.
timeout_secs = 120

# ---------------------------------------------------------------------------
# Export
# ---------------------------------------------------------------------------
[export]
# Longer side of the print raster in pixels (256-8192).
# The shorter side follows from the grid/paper aspect ratio.
max_side = 2048
# Directory that exported files are written to.
output_dir = "."

# ---------------------------------------------------------------------------
# SVG vector tracing
# ---------------------------------------------------------------------------
[tracing]
# Pixels darker than this luma (0-255) are traced as ink.
luminance_threshold = 128
# Path simplification tolerance in pixels. Higher = straighter lines.
line_threshold = 1.0
# Ink regions smaller than this many square pixels are dropped as noise.
path_omit = 8

# ---------------------------------------------------------------------------
# Edit history
# ---------------------------------------------------------------------------
[history]
# Snapshots kept for undo, including the current image.
max_depth = 3

# ---------------------------------------------------------------------------
# Notifications
# ---------------------------------------------------------------------------
[notifications]
# How long a notification stays visible, in milliseconds.
dismiss_after_ms = 4000

# ---------------------------------------------------------------------------
# Generation form defaults
# ---------------------------------------------------------------------------
[defaults]
# a1-a5, b1-b5
paper_size = "a4"
# "vertical" (portrait) or "horizontal" (landscape)
orientation = "vertical"
# "easy", "medium" or "hard"
difficulty = "medium"
# [pages across, pages down], each 1-6.
grid = [2, 2]
# Images per generation (1-3).
count = 1
"##
}
