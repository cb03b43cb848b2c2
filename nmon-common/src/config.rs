//! Configuration loading and data folder resolution
//!
//! Resolution priority, highest first:
//! 1. Command-line argument (or its `NMON_*` environment variable, which
//!    clap folds into the same value)
//! 2. TOML config file
//! 3. Compiled default

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Bootstrap configuration loaded from TOML
///
/// Every field is optional; anything missing falls through to the
/// compiled defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TomlConfig {
    /// Folder holding the SQLite database
    #[serde(default)]
    pub data_folder: Option<PathBuf>,

    #[serde(default)]
    pub host: Option<String>,

    #[serde(default)]
    pub port: Option<u16>,

    /// Folder of CSV files used to seed an empty database
    #[serde(default)]
    pub seed_dir: Option<PathBuf>,

    /// Look-back period of the report deduplication filter
    #[serde(default)]
    pub dedup_window_minutes: Option<i64>,

    /// Number of hotspots returned when the request gives no `top`
    #[serde(default)]
    pub hotspot_default_top: Option<usize>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default)]
    pub level: Option<String>,
}

/// Longest accepted dedup look-back (one week)
pub const MAX_DEDUP_WINDOW_MINUTES: i64 = 7 * 24 * 60;

/// Compiled defaults for the current platform
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub data_folder: PathBuf,
    pub host: String,
    pub port: u16,
    pub dedup_window_minutes: i64,
    pub hotspot_default_top: usize,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            data_folder: default_data_folder(),
            host: "127.0.0.1".to_string(),
            port: 5801,
            dedup_window_minutes: 60,
            hotspot_default_top: 10,
            log_level: "info".to_string(),
        }
    }
}

/// Values given on the command line (or via environment)
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub data_folder: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub seed_dir: Option<PathBuf>,
    pub dedup_window_minutes: Option<i64>,
    pub log_level: Option<String>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub data_folder: PathBuf,
    pub host: String,
    pub port: u16,
    pub seed_dir: Option<PathBuf>,
    pub dedup_window_minutes: i64,
    pub hotspot_default_top: usize,
    pub log_level: String,
}

impl ServerConfig {
    /// Merge overrides, TOML and compiled defaults
    pub fn resolve(overrides: ConfigOverrides, toml: TomlConfig) -> Result<Self> {
        let defaults = CompiledDefaults::for_current_platform();

        let config = Self {
            data_folder: overrides
                .data_folder
                .or(toml.data_folder)
                .unwrap_or(defaults.data_folder),
            host: overrides.host.or(toml.host).unwrap_or(defaults.host),
            port: overrides.port.or(toml.port).unwrap_or(defaults.port),
            seed_dir: overrides.seed_dir.or(toml.seed_dir),
            dedup_window_minutes: overrides
                .dedup_window_minutes
                .or(toml.dedup_window_minutes)
                .unwrap_or(defaults.dedup_window_minutes),
            hotspot_default_top: toml
                .hotspot_default_top
                .unwrap_or(defaults.hotspot_default_top),
            log_level: overrides
                .log_level
                .or(toml.logging.level)
                .unwrap_or(defaults.log_level),
        };

        if !(1..=MAX_DEDUP_WINDOW_MINUTES).contains(&config.dedup_window_minutes) {
            return Err(Error::Config(format!(
                "dedup_window_minutes must be between 1 and {}, got {}",
                MAX_DEDUP_WINDOW_MINUTES, config.dedup_window_minutes
            )));
        }
        if config.hotspot_default_top == 0 {
            return Err(Error::Config(
                "hotspot_default_top must be at least 1".to_string(),
            ));
        }

        Ok(config)
    }

    /// Path of the SQLite database inside the data folder
    pub fn database_path(&self) -> PathBuf {
        self.data_folder.join("nmon.db")
    }

    /// Create the data folder if it does not exist yet
    pub fn ensure_data_folder(&self) -> Result<()> {
        if !self.data_folder.exists() {
            std::fs::create_dir_all(&self.data_folder)?;
            info!("Created data folder: {}", self.data_folder.display());
        }
        Ok(())
    }
}

/// Default location of the TOML config file (`<config dir>/nmon/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("nmon").join("config.toml"))
}

/// Load the TOML config file
///
/// A missing file is not an error: it is logged and defaults are used.
/// A file that exists but does not parse is a configuration error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str::<TomlConfig>(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;
    info!("Loaded config file: {}", path.display());
    Ok(config)
}

/// OS-dependent default data folder
fn default_data_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("nmon"))
        .unwrap_or_else(|| PathBuf::from("./nmon_data"))
}
