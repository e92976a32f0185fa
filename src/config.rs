//! Pipeline configuration.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! the base layer; an optional `config.toml` in the photo source directory
//! overrides them key by key.
//!
//! ## Config File Location
//!
//! ```text
//! photos/
//! ├── config.toml        # optional, overrides stock defaults
//! ├── IMG_0001.jpg
//! └── ...
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [thumbnail]
//! max_edge = 300            # bounding box edge in pixels
//! quality = 80              # JPEG quality (1-100)
//!
//! [large]
//! max_edge = 1600
//! quality = 85
//!
//! [manifest]
//! url_prefix = "/photos"    # prepended to image names in data.json
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{Quality, VariantConfig, VariantSet};
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
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `config.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AtlasConfig {
    /// Small map-popup image.
    pub thumbnail: ThumbnailConfig,
    /// Full-screen viewer image.
    pub large: LargeConfig,
    /// How image paths are written into `data.json`.
    pub manifest: ManifestConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl AtlasConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (section, max_edge, quality) in [
            ("thumbnail", self.thumbnail.max_edge, self.thumbnail.quality),
            ("large", self.large.max_edge, self.large.quality),
        ] {
            if max_edge == 0 {
                return Err(ConfigError::Validation(format!(
                    "{section}.max_edge must be non-zero"
                )));
            }
            if !(1..=100).contains(&quality) {
                return Err(ConfigError::Validation(format!(
                    "{section}.quality must be 1-100"
                )));
            }
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Both variants as imaging parameters.
    pub fn variants(&self) -> VariantSet {
        VariantSet {
            thumbnail: VariantConfig {
                max_edge: self.thumbnail.max_edge,
                quality: Quality::new(self.thumbnail.quality),
            },
            large: VariantConfig {
                max_edge: self.large.max_edge,
                quality: Quality::new(self.large.quality),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailConfig {
    pub max_edge: u32,
    pub quality: u32,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            max_edge: 300,
            quality: 80,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LargeConfig {
    pub max_edge: u32,
    pub quality: u32,
}

impl Default for LargeConfig {
    fn default() -> Self {
        Self {
            max_edge: 1600,
            quality: 85,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManifestConfig {
    /// Prefix for `thumb`/`large` paths. The web app serves images from here.
    pub url_prefix: String,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            url_prefix: "/photos".to_string(),
        }
    }
}

impl ManifestConfig {
    /// Join the prefix and an image file name with exactly one slash.
    pub fn url_for(&self, file_name: &str) -> String {
        let prefix = self.url_prefix.trim_end_matches('/');
        if prefix.is_empty() && !self.url_prefix.starts_with('/') {
            file_name.to_string()
        } else {
            format!("{prefix}/{file_name}")
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(AtlasConfig::default()).expect("default config must serialize")
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

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the directory has no `config.toml`.
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
) -> Result<AtlasConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AtlasConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(dir: &Path) -> Result<AtlasConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(dir)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# travel-atlas configuration
# ==========================
# Place this file in the photo source directory as config.toml.
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Thumbnail: the small image shown in map popups
# ---------------------------------------------------------------------------
[thumbnail]
# The image is scaled to fit inside a max_edge x max_edge box.
# Smaller images are never enlarged.
max_edge = 300

# JPEG quality (1 = worst, 100 = best).
quality = 80

# ---------------------------------------------------------------------------
# Large: the full-screen viewer image
# ---------------------------------------------------------------------------
[large]
max_edge = 1600
quality = 85

# ---------------------------------------------------------------------------
# Manifest (data.json)
# ---------------------------------------------------------------------------
[manifest]
# Prefix for the "thumb" and "large" paths, matching where the web app
# serves the generated images from.
url_prefix = "/photos"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image-processing workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
