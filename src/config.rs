//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$IOSEVIDENCE_CONFIG` (environment variable)
//! 2. `~/.config/iosevidence/config.toml` (Linux/macOS)
//!    `%APPDATA%\iosevidence\config.toml` (Windows)
//! 3. Built-in defaults

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Query compilation settings.
    pub query: QueryConfig,
    /// Contact lookup settings.
    pub contacts: ContactsConfig,
    /// Export defaults.
    pub export: ExportConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Override cache directory for logs.
    pub cache_dir: Option<PathBuf>,
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
}

/// Query compilation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Render message timestamps in the examiner's local time zone.
    /// When false, timestamps (and date filters) are in UTC.
    pub localtime: bool,
}

/// Contact lookup settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactsConfig {
    /// ISO 3166 region used to parse phone numbers without a `+` prefix
    /// (e.g. "US"). Unset means such numbers never match a contact.
    pub default_region: Option<String>,
}

/// Export defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Default output format: "stdout", "html", "csv", "json".
    pub default_format: String,
    /// Directory for html/csv/json reports (default: `./output`).
    pub output_dir: Option<PathBuf>,
    /// Column width at which the stdout table wraps text.
    pub wrap_width: usize,
    /// Maximum rendered width/height of inline images in HTML reports.
    pub image_max_px: u32,
    /// CSV field separator character.
    pub csv_separator: char,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            log_level: "warn".to_string(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self { localtime: true }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            default_format: "stdout".to_string(),
            output_dir: None,
            wrap_width: 45,
            image_max_px: 400,
            csv_separator: ',',
        }
    }
}

// ── Load ────────────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found or on parse error.
pub fn load_config() -> Config {
    if let Some(path) = config_file_path() {
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<Config>(&contents) {
                    Ok(cfg) => {
                        tracing::info!(path = %path.display(), "Loaded config");
                        return cfg;
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Failed to parse config, using defaults"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to read config file, using defaults"
                    );
                }
            }
        }
    }
    Config::default()
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("IOSEVIDENCE_CONFIG") {
        return Some(PathBuf::from(env_path));
    }

    dirs::config_dir().map(|d| d.join("iosevidence").join("config.toml"))
}

/// Return the cache directory for logs.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("iosevidence")
}

/// Return the directory reports are written to.
pub fn output_dir(config: &Config) -> PathBuf {
    config
        .export
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("output"))
}
