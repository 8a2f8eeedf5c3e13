//! Configuration file parser for ~/.config/newsfeed/config.toml.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are accepted by serde and logged as warnings so typos are
//! visible. Command-line flags override whatever the file says.
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::feed::CollectOptions;

/// Refresh cycles never run more often than this.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// SEC-014: Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level configuration shared by the CLI and the signage server.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Per-feed HTTP timeout in seconds.
    pub timeout_seconds: f64,

    /// Only keep entries mentioning this text (case-insensitive).
    pub keyword: Option<String>,

    /// Validate TLS certificates of feed origins.
    pub verify_tls: bool,

    pub cli: CliConfig,

    pub signage: SignageConfig,
}

/// Settings only the one-shot CLI reads.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Maximum number of entries printed.
    pub limit: i64,
}

/// Settings only the signage server reads.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SignageConfig {
    /// Maximum number of entries kept per snapshot.
    pub limit: i64,
    pub bind: String,
    pub port: u16,
    /// Seconds between refresh cycles (floored at 5).
    pub refresh_seconds: f64,
    /// Feed list used when no addresses are given on the command line.
    pub feeds_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout_seconds: 15.0,
            keyword: None,
            verify_tls: true,
            cli: CliConfig::default(),
            signage: SignageConfig::default(),
        }
    }
}

impl Default for CliConfig {
    fn default() -> Self {
        Self { limit: 10 }
    }
}

impl Default for SignageConfig {
    fn default() -> Self {
        Self {
            limit: 240,
            bind: "0.0.0.0".to_string(),
            port: 8080,
            refresh_seconds: 300.0,
            feeds_file: PathBuf::from("feeds.txt"),
        }
    }
}

impl Config {
    /// SEC-014: Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Default location: `$HOME/.config/newsfeed/config.toml`.
    ///
    /// `None` when `HOME` is not set.
    pub fn default_path() -> Option<PathBuf> {
        let home = std::env::var_os("HOME")?;
        Some(
            PathBuf::from(home)
                .join(".config")
                .join("newsfeed")
                .join("config.toml"),
        )
    }

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → silently accepted (serde default behavior), logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // SEC-014: Check file size before reading
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race condition: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            warn_unknown_keys(&raw);
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Loads `path` if given, else the default location, else defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => match Self::default_path() {
                Some(path) => Self::load(&path),
                None => Ok(Self::default()),
            },
        }
    }

    /// The feed timeout as a `Duration`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] unless the value is finite and positive.
    pub fn timeout(&self) -> Result<Duration, ConfigError> {
        positive_seconds("timeout", self.timeout_seconds)
    }

    /// Collection settings for one run, keeping at most `limit` entries.
    pub fn collect_options(&self, limit: i64) -> Result<CollectOptions, ConfigError> {
        Ok(CollectOptions {
            timeout: self.timeout()?,
            keyword: self.keyword.clone().filter(|k| !k.is_empty()),
            limit,
            verify_tls: self.verify_tls,
        })
    }

    /// The signage refresh interval, floored at [`MIN_REFRESH_INTERVAL`].
    pub fn refresh_interval(&self) -> Result<Duration, ConfigError> {
        let seconds = self.signage.refresh_seconds;
        if seconds.is_nan() {
            return Err(ConfigError::Invalid(
                "refresh interval must be a number of seconds".to_string(),
            ));
        }
        if seconds <= MIN_REFRESH_INTERVAL.as_secs_f64() {
            return Ok(MIN_REFRESH_INTERVAL);
        }
        positive_seconds("refresh interval", seconds)
    }
}

fn positive_seconds(name: &str, seconds: f64) -> Result<Duration, ConfigError> {
    if !(seconds > 0.0) {
        return Err(ConfigError::Invalid(format!(
            "{name} must be greater than zero (got {seconds})"
        )));
    }
    Duration::try_from_secs_f64(seconds)
        .map_err(|e| ConfigError::Invalid(format!("{name} of {seconds} seconds: {e}")))
}

fn warn_unknown_keys(raw: &toml::Table) {
    const TOP: &[&str] = &["timeout_seconds", "keyword", "verify_tls", "cli", "signage"];
    const CLI: &[&str] = &["limit"];
    const SIGNAGE: &[&str] = &["limit", "bind", "port", "refresh_seconds", "feeds_file"];

    for (key, value) in raw {
        if !TOP.contains(&key.as_str()) {
            tracing::warn!(key = %key, "Unknown key in config file, ignoring");
            continue;
        }
        let known = match key.as_str() {
            "cli" => CLI,
            "signage" => SIGNAGE,
            _ => continue,
        };
        if let Some(table) = value.as_table() {
            for nested in table.keys().filter(|k| !known.contains(&k.as_str())) {
                tracing::warn!(key = %format!("{key}.{nested}"), "Unknown key in config file, ignoring");
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
