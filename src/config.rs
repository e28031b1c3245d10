//! Relay configuration.
//!
//! Loaded from a TOML file (`thumbrelay.toml` by default). Stock defaults are
//! the base layer; the user file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [defaults]
//! thumb_style = "yt"        # yt | yt_fit | square | auto
//! poster_mode = false       # Send the full-size poster before relayed media
//!
//! [limits]
//! poster_max_mb = 5         # Largest accepted poster upload (1-50 MiB)
//!
//! [logging]
//! level = "info"            # error | warn | info | debug | trace
//!
//! [telegram]
//! file_api_base = "https://api.telegram.org/file"
//!
//! [processing]
//! max_threads = 4           # CLI batch workers (omit for auto = CPU cores)
//! ```
//!
//! Thumbnail footprints, the 200 KiB budget, the quality ladder and the
//! sharpening parameters are not here: they are fixed by Telegram's
//! thumbnail rules and live in [`crate::imaging`] as constants.
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{POSTER_DEFAULT_MAX_MB, Style};
use crate::store::UserSettings;
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
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Log levels accepted by `logging.level`.
pub const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Upper bound for `limits.poster_max_mb`.
pub const POSTER_MAX_MB_CEILING: u64 = 50;

/// Relay configuration loaded from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelayConfig {
    /// Settings new users start with.
    pub defaults: DefaultsConfig,
    /// Intake limits.
    pub limits: LimitsConfig,
    /// Log filter.
    pub logging: LoggingConfig,
    /// Bot API endpoints.
    pub telegram: TelegramConfig,
    /// CLI batch parallelism.
    pub processing: ProcessingConfig,
}

impl RelayConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=POSTER_MAX_MB_CEILING).contains(&self.limits.poster_max_mb) {
            return Err(ConfigError::Validation(format!(
                "limits.poster_max_mb must be 1-{POSTER_MAX_MB_CEILING}"
            )));
        }
        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "logging.level must be one of: {}",
                LOG_LEVELS.join(", ")
            )));
        }
        let base = &self.telegram.file_api_base;
        if !(base.starts_with("https://") || base.starts_with("http://")) {
            return Err(ConfigError::Validation(
                "telegram.file_api_base must be an http(s) URL".into(),
            ));
        }
        if self.processing.max_threads == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_threads must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Settings a user gets before they change anything.
    pub fn default_user_settings(&self) -> UserSettings {
        UserSettings {
            poster_mode: self.defaults.poster_mode,
            thumb_style: self.defaults.thumb_style,
        }
    }

    /// Poster limit in bytes.
    pub fn poster_max_bytes(&self) -> u64 {
        self.limits.poster_max_mb * 1024 * 1024
    }
}

/// Initial per-user settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefaultsConfig {
    /// Thumbnail style token. Parsed strictly: a typo here is an error, not `auto`.
    pub thumb_style: Style,
    pub poster_mode: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            thumb_style: Style::Cover,
            poster_mode: false,
        }
    }
}

/// Intake limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Largest poster image accepted, in MiB.
    pub poster_max_mb: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            poster_max_mb: POSTER_DEFAULT_MAX_MB,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default `env_logger` filter; `RUST_LOG` overrides it.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TelegramConfig {
    /// Base of file download URLs; the relay appends `/bot<token>/<path>`.
    pub file_api_base: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            file_api_base: "https://api.telegram.org/file".to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel thumbnail workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_threads: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_threads.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(RelayConfig::default())?)
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

/// Parse and validate a config from TOML text, layered over the defaults.
pub fn parse_config(content: &str) -> Result<RelayConfig, ConfigError> {
    let overlay: toml::Value = toml::from_str(content)?;
    let merged = merge_toml(stock_defaults_value()?, overlay);
    let config: RelayConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`.
///
/// A missing file yields the stock defaults; a file that exists must parse,
/// contain only known keys, and validate.
pub fn load_config(path: &Path) -> Result<RelayConfig, ConfigError> {
    if !path.exists() {
        log::debug!("no config at {}, using defaults", path.display());
        return Ok(RelayConfig::default());
    }
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Render a config back to TOML, e.g. for `check-config`.
pub fn to_toml(config: &RelayConfig) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(config)?)
}

/// Returns a fully-commented stock config with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# thumbrelay configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.
#
# Thumbnail geometry (320x180 / 320x320), the 200 KiB thumbnail budget and
# the JPEG quality ladder are fixed by Telegram and cannot be configured.

# ---------------------------------------------------------------------------
# Settings new users start with
# ---------------------------------------------------------------------------
[defaults]
# Thumbnail style:
#   yt      16:9 crop-and-fill (320x180)
#   yt_fit  16:9 canvas, whole image over a blurred backdrop
#   square  1:1 crop-and-fill (320x320)
#   auto    shrink so the longer side is at most 320
thumb_style = "yt"
# Send the full-size poster as a photo before each relayed video/document.
poster_mode = false

# ---------------------------------------------------------------------------
# Intake limits
# ---------------------------------------------------------------------------
[limits]
# Largest poster image accepted by /setthumb, in MiB (1-50).
poster_max_mb = 5

# ---------------------------------------------------------------------------
# Logging (RUST_LOG overrides this)
# ---------------------------------------------------------------------------
[logging]
# error | warn | info | debug | trace
level = "info"

# ---------------------------------------------------------------------------
# Bot API
# ---------------------------------------------------------------------------
[telegram]
# Relayed media is referenced by URL: <file_api_base>/bot<token>/<file_path>
file_api_base = "https://api.telegram.org/file"

# ---------------------------------------------------------------------------
# Parallel processing (thumb command)
# ---------------------------------------------------------------------------
[processing]
# Maximum number of parallel workers. Omit for auto (= number of CPU cores).
# Values larger than the core count are clamped down.
# max_threads = 4
"##
}
