//! Engine configuration module.
//!
//! Handles loading, validating, and merging the engine's TOML configuration.
//! Stock defaults are the base layer; a user file overrides any subset of
//! keys. Configuration is read once at startup and never changes afterwards:
//! editing filters or fallback assets requires a restart (or an explicit
//! cache clear, see [`MemoCache::clear`](crate::cache::MemoCache::clear)).
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [lazy_load]
//! enabled = true
//! class_selector = "lazy"                        # Marks images the loader script watches
//! placeholder_class_selector = "lazy-placeholder" # Removed once the real image loads
//! blur_class_selector = "lazy-blur"              # Blur styling while loading
//!
//! [default_image]
//! enabled = false
//! path = "images/default.png"   # Required when enabled
//!
//! [fallback]
//! enabled = false
//! retina_suffix = "2x"
//! large_tokens = ["xl", "xxl"]
//! small_tokens = ["xs", "xxs"]
//!
//! [fallback.images]
//! retina = "images/2560.png"
//! large = "images/1280.png"
//! medium = "images/640.png"
//! small = "images/320.png"
//!
//! [urls]
//! cache_prefix = "/media/cache"
//!
//! [source]
//! root = "public"
//!
//! [cache]
//! max_entries = 10000
//!
//! [processing]
//! max_processes = 4         # Batch render threads (omit for auto = CPU cores)
//!
//! [filters.thumb_small]
//! thumbnail = { size = [320, 180] }
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::filters::{FilterKind, FilterRegistry};
use crate::naming::SizeTier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
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

/// Engine configuration loaded from `respimg.toml`.
///
/// All fields have defaults; user files only specify overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Class tokens applied to lazy images.
    pub lazy_load: LazyLoadConfig,
    /// Single substitute image for missing paths.
    pub default_image: DefaultImageConfig,
    /// Size-tiered substitute images for missing or unloadable paths.
    pub fallback: FallbackConfig,
    /// Settings for the bundled URL resolver.
    pub urls: UrlsConfig,
    /// Settings for the bundled filesystem loader.
    pub source: SourceConfig,
    /// Memoization cache sizing.
    pub cache: CacheConfig,
    /// Parallel batch rendering settings.
    pub processing: ProcessingConfig,
    /// Filter name → transformation.
    pub filters: BTreeMap<String, FilterKind>,
}

impl EngineConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_image.enabled
            && self.default_image.path.as_deref().is_none_or(str::is_empty)
        {
            return Err(ConfigError::Validation(
                "default_image.path must be set when default_image.enabled is true".into(),
            ));
        }
        if self.fallback.enabled {
            let images = &self.fallback.images;
            for (key, value) in [
                ("retina", &images.retina),
                ("large", &images.large),
                ("medium", &images.medium),
                ("small", &images.small),
            ] {
                if value.is_empty() {
                    return Err(ConfigError::Validation(format!(
                        "fallback.images.{key} must not be empty"
                    )));
                }
            }
        }
        if self.lazy_load.enabled {
            let lazy = &self.lazy_load;
            for (key, value) in [
                ("class_selector", &lazy.class_selector),
                ("placeholder_class_selector", &lazy.placeholder_class_selector),
                ("blur_class_selector", &lazy.blur_class_selector),
            ] {
                if value.trim().is_empty() {
                    return Err(ConfigError::Validation(format!(
                        "lazy_load.{key} must not be empty"
                    )));
                }
            }
        }
        if self.cache.max_entries == 0 {
            return Err(ConfigError::Validation(
                "cache.max_entries must be positive".into(),
            ));
        }
        for (name, kind) in &self.filters {
            kind.validate()
                .map_err(|reason| ConfigError::Validation(format!("filters.{name}: {reason}")))?;
        }
        Ok(())
    }

    /// Build the read-only filter registry from the `[filters]` table.
    pub fn filter_registry(&self) -> FilterRegistry {
        FilterRegistry::register(self.filters.clone())
    }
}

/// Lazy-loading class tokens.
///
/// The three tokens are prepended, in this order, to the caller's classes on
/// every lazy `<img>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LazyLoadConfig {
    /// When false, the lazy render functions emit eager markup.
    pub enabled: bool,
    pub class_selector: String,
    pub placeholder_class_selector: String,
    pub blur_class_selector: String,
}

impl Default for LazyLoadConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            class_selector: "lazy".to_string(),
            placeholder_class_selector: "lazy-placeholder".to_string(),
            blur_class_selector: "lazy-blur".to_string(),
        }
    }
}

/// Default image substituted when no usable path is available.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefaultImageConfig {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Fallback substitution and the filter-name size convention it relies on.
///
/// See [`crate::naming`] for how a filter name maps to a tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FallbackConfig {
    pub enabled: bool,
    /// Filters whose name ends with this suffix get the retina asset.
    pub retina_suffix: String,
    /// Final `_` tokens that select the large asset.
    pub large_tokens: Vec<String>,
    /// Final `_` tokens that select the small asset.
    pub small_tokens: Vec<String>,
    /// Asset path per tier. These are ordinary source paths: they are
    /// filtered, measured and served like any other image.
    pub images: FallbackImages,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            retina_suffix: "2x".to_string(),
            large_tokens: vec!["xl".to_string(), "xxl".to_string()],
            small_tokens: vec!["xs".to_string(), "xxs".to_string()],
            images: FallbackImages::default(),
        }
    }
}

impl FallbackConfig {
    /// Asset path for a size tier.
    pub fn asset_for(&self, tier: SizeTier) -> &str {
        match tier {
            SizeTier::Retina => &self.images.retina,
            SizeTier::Large => &self.images.large,
            SizeTier::Medium => &self.images.medium,
            SizeTier::Small => &self.images.small,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FallbackImages {
    pub retina: String,
    pub large: String,
    pub medium: String,
    pub small: String,
}

impl Default for FallbackImages {
    fn default() -> Self {
        Self {
            retina: "images/2560.png".to_string(),
            large: "images/1280.png".to_string(),
            medium: "images/640.png".to_string(),
            small: "images/320.png".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UrlsConfig {
    /// Prefix under which filtered renditions are served.
    pub cache_prefix: String,
}

impl Default for UrlsConfig {
    fn default() -> Self {
        Self {
            cache_prefix: "/media/cache".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    /// Directory logical image paths are relative to.
    pub root: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            root: "public".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Upper bound on memoized entries. Entries never expire by age.
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_entries: 10_000 }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel batch rendering workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `n` clamped to `1..=cores` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(EngineConfig::default()).expect("default config must serialize")
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

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<EngineConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: EngineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a TOML file.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result. A missing file yields the stock defaults.
pub fn load_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `respimg.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# respimg Configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Lazy loading
# ---------------------------------------------------------------------------
[lazy_load]
# When false, figure/picture lazy rendering falls back to eager markup.
enabled = true
# Class the client-side loader watches.
class_selector = "lazy"
# Class removed by the loader once the real image has loaded.
placeholder_class_selector = "lazy-placeholder"
# Class carrying the blur effect while the placeholder is shown.
blur_class_selector = "lazy-blur"

# ---------------------------------------------------------------------------
# Default image
# ---------------------------------------------------------------------------
[default_image]
# Substitute a single image when a path is empty or cannot be loaded
# (and fallback images are disabled).
enabled = false
# path = "images/default.png"

# ---------------------------------------------------------------------------
# Fallback images
# ---------------------------------------------------------------------------
[fallback]
# Substitute a size-appropriate placeholder for empty or unloadable paths.
enabled = false
# The tier is guessed from the filter name, not measured:
#   name ends with retina_suffix          -> retina
#   last "_" token is in large_tokens     -> large
#   last "_" token is in small_tokens     -> small
#   anything else                         -> medium
retina_suffix = "2x"
large_tokens = ["xl", "xxl"]
small_tokens = ["xs", "xxs"]

# Source paths of the fallback assets, one per tier.
[fallback.images]
retina = "images/2560.png"
large = "images/1280.png"
medium = "images/640.png"
small = "images/320.png"

# ---------------------------------------------------------------------------
# URLs and sources (bundled resolver and loader)
# ---------------------------------------------------------------------------
[urls]
# Filtered renditions are served at {cache_prefix}/{filter}/{path}.
cache_prefix = "/media/cache"

[source]
# Directory that logical image paths are relative to.
root = "public"

# ---------------------------------------------------------------------------
# Cache and processing
# ---------------------------------------------------------------------------
[cache]
# Maximum memoized dimension/URL lookups. Entries never expire by age.
max_entries = 10000

[processing]
# Maximum parallel workers for `respimg batch`.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4

# ---------------------------------------------------------------------------
# Filters
# ---------------------------------------------------------------------------
# One transformation per filter. Sizes of thumbnail, fixed and crop filters
# are known without reading the image; relative_resize and original filters
# need the source's natural size.
#
# [filters.thumb_small]
# thumbnail = { size = [320, 180] }
#
# [filters.avatar]
# fixed = { width = 96, height = 96 }
#
# [filters.banner_xl]
# crop = { size = [1600, 500], start = [0, 0] }
#
# [filters.hero_xl]
# relative_resize = { widen = 1280 }      # or heighten, increase, scale
#
# [filters.webp]
# original = {}                           # format change only, natural size
"##
}
