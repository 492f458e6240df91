//! Export configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! overridden by a `config.toml` in the viewed directory, and command-line
//! flags override both.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [save]
//! sub_folder = "Saved"            # Relative to the viewed directory; "" = same folder
//! file_type = "tga"               # tga, png, bmp, jpg or gif
//! targa_rle = false               # Run-length encode TGA output
//! jpeg_quality = 95               # 0-100 (0 is raised to 1 by the encoder)
//! confirm_file_overwrites = true  # Ask before clobbering existing files
//!
//! [resize]
//! size_mode = "percent"           # percent, set-width-and-height,
//!                                 # set-width-retain-aspect, set-height-retain-aspect
//! percent = 100.0
//! width = 512
//! height = 512
//! filter = "bilinear"             # nearest-neighbour, box, bilinear, bicubic,
//!                                 # quadratic, hamming
//!
//! [catalog]
//! sort_key = "file-name"          # file-name, mod-time, file-size, file-type
//! sort_ascending = true
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse; override just the values you want:
//!
//! ```toml
//! [save]
//! file_type = "png"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::catalog::SortKey;
use crate::imaging::{ResampleFilter, SaveFormat, SizeMode};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Export configuration loaded from `config.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    /// Destination and encoder settings.
    pub save: SaveConfig,
    /// Batch sizing and resample filter.
    pub resize: ResizeConfig,
    /// Catalog ordering.
    pub catalog: CatalogConfig,
}

impl ExportConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.save.jpeg_quality > 100 {
            return Err(ConfigError::Validation(
                "save.jpeg_quality must be 0-100".into(),
            ));
        }
        if !self.resize.percent.is_finite() || self.resize.percent <= 0.0 {
            return Err(ConfigError::Validation(
                "resize.percent must be a positive number".into(),
            ));
        }
        if self.resize.width == 0 || self.resize.height == 0 {
            return Err(ConfigError::Validation(
                "resize.width and resize.height must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SaveConfig {
    pub sub_folder: String,
    pub file_type: SaveFormat,
    pub targa_rle: bool,
    pub jpeg_quality: u32,
    pub confirm_file_overwrites: bool,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            sub_folder: "Saved".to_string(),
            file_type: SaveFormat::Tga,
            targa_rle: false,
            jpeg_quality: 95,
            confirm_file_overwrites: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeConfig {
    pub size_mode: SizeMode,
    pub percent: f32,
    pub width: u32,
    pub height: u32,
    pub filter: ResampleFilter,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            size_mode: SizeMode::Percent,
            percent: 100.0,
            width: 512,
            height: 512,
            filter: ResampleFilter::Bilinear,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    pub sort_key: SortKey,
    pub sort_ascending: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            sort_key: SortKey::FileName,
            sort_ascending: true,
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
    Ok(toml::Value::try_from(ExportConfig::default())?)
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

/// Load a `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join("config.toml");
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
) -> Result<ExportConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ExportConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(dir: &Path) -> Result<ExportConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(dir)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# viewer-export Configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file as config.toml in the directory whose images you export.
# Command-line flags override anything set here.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Saving
# ---------------------------------------------------------------------------
[save]
# Folder for exported files, relative to the viewed directory.
# An empty string saves next to the source images.
sub_folder = "Saved"

# Output format: tga, png, bmp, jpg or gif.
file_type = "tga"

# Run-length encode TGA files. Smaller, but some tools cannot read RLE TGA.
targa_rle = false

# JPEG quality (0 = worst, 100 = best). Only used when file_type = "jpg".
jpeg_quality = 95

# Ask before overwriting files that already exist.
confirm_file_overwrites = true

# ---------------------------------------------------------------------------
# Resizing (save-all)
# ---------------------------------------------------------------------------
[resize]
# How output sizes are chosen:
#   percent                  - scale both sides by `percent`
#   set-width-and-height     - exactly width x height, aspect not preserved
#   set-width-retain-aspect  - fixed width, height follows the source
#   set-height-retain-aspect - fixed height, width follows the source
size_mode = "percent"

# Percent of the original size. 100 means no resampling.
percent = 100.0

# Target size in pixels for the width/height modes.
# Outputs are never smaller than 4 pixels on either side.
width = 512
height = 512

# Resample filter: nearest-neighbour, box, bilinear, bicubic, quadratic, hamming.
filter = "bilinear"

# ---------------------------------------------------------------------------
# Catalog
# ---------------------------------------------------------------------------
[catalog]
# Image ordering: file-name, mod-time, file-size or file-type.
sort_key = "file-name"
sort_ascending = true
"##
}
