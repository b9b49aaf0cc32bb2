//! Rewriter configuration.
//!
//! Handles loading, validating, and merging `structured-data.toml`. Stock
//! defaults are the base layer; a config file overrides them key by key, and
//! command-line flags override both.
//!
//! ## Config File Location
//!
//! `structured-data.toml` is read from the working directory, or from the
//! path given with `--config`:
//!
//! ```text
//! site/
//! ├── structured-data.toml     # Overrides stock defaults
//! ├── types.json               # Optional custom type table
//! └── templates/
//!     └── ...
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! semantic = "microdata"        # "microdata" or "rdfa"
//! suffixes = ["sd"]             # data-{suffix} attributes to rewrite
//! # catalog = "types.json"      # Custom type table (relative to this file)
//! extensions = ["html", "htm"]  # Files rewritten by `site`
//!
//! [processing]
//! max_processes = 4             # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::vocabulary::{Semantic, UnknownSemantic};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up in a directory by [`load_config`].
pub const CONFIG_FILE: &str = "structured-data.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `structured-data.toml`.
///
/// All fields have defaults. Config files need only specify the values they
/// want to override.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StructuredDataConfig {
    /// `"microdata"` or `"rdfa"`, any case.
    pub semantic: String,
    /// Marker suffixes, processed in this order on each tag.
    pub suffixes: Vec<String>,
    /// Path to a custom type table. Relative paths resolve against the
    /// directory holding the config file.
    pub catalog: Option<String>,
    /// File extensions rewritten by the `site` command.
    pub extensions: Vec<String>,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for StructuredDataConfig {
    fn default() -> Self {
        Self {
            semantic: Semantic::default().name().to_string(),
            suffixes: vec![crate::rewrite::DEFAULT_SUFFIX.to_string()],
            catalog: None,
            extensions: vec!["html".to_string(), "htm".to_string()],
            processing: ProcessingConfig::default(),
        }
    }
}

impl StructuredDataConfig {
    /// Validate config values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.semantic()?;
        if self.suffixes.is_empty() {
            return Err(ConfigError::Validation("suffixes must not be empty".into()));
        }
        if self.suffixes.iter().any(|s| s.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "suffixes must not contain empty entries".into(),
            ));
        }
        if self.extensions.is_empty() {
            return Err(ConfigError::Validation("extensions must not be empty".into()));
        }
        if self.extensions.iter().any(|e| e.trim_start_matches('.').is_empty()) {
            return Err(ConfigError::Validation(
                "extensions must not contain empty entries".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn semantic(&self) -> Result<Semantic, ConfigError> {
        self.semantic
            .parse()
            .map_err(|e: UnknownSemantic| ConfigError::Validation(e.to_string()))
    }

    /// The custom type table, resolved against `base`.
    pub fn catalog_path(&self, base: &Path) -> Option<PathBuf> {
        self.catalog.as_ref().map(|c| base.join(c))
    }

    /// Whether `path` has one of the configured extensions (case-insensitive).
    pub fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.extensions
                    .iter()
                    .any(|want| want.trim_start_matches('.').eq_ignore_ascii_case(ext))
            })
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel rewrite workers.
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
    toml::Value::try_from(StructuredDataConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely, so an
///   overlay `suffixes` list replaces the stock list.
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

/// Read a config file as a raw TOML value. The file must exist.
pub fn read_config_file(file: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(file)?;
    Ok(toml::from_str(&content)?)
}

/// Load `structured-data.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the directory has no config file.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(None);
    }
    read_config_file(&config_path).map(Some)
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<StructuredDataConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: StructuredDataConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `structured-data.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(dir: &Path) -> Result<StructuredDataConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(dir)?)
}

/// Returns a fully-commented stock `structured-data.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# structured-data configuration
# =============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# Markup flavour: "microdata" (itemscope/itemtype/itemprop)
# or "rdfa" (vocab/typeof/property). Case-insensitive.
semantic = "microdata"

# Attribute suffixes to rewrite. "sd" matches data-sd="...".
# On each tag, suffixes are processed in this order.
suffixes = ["sd"]

# Custom type table in the bundled JSON format, relative to this file.
# Omit to use the built-in schema.org hierarchy.
# catalog = "types.json"

# File extensions rewritten by the `site` command.
extensions = ["html", "htm"]

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel rewrite workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
