//! Command-line arguments
//!
//! Every option can also be given through its `NMON_*` environment
//! variable. Values given here win over the TOML file, which wins over the
//! compiled defaults.

use std::path::PathBuf;

use clap::Parser;
use nmon_common::config::{
    default_config_path, load_toml_config, ConfigOverrides, ServerConfig, TomlConfig,
};

#[derive(Parser, Debug, Clone)]
#[command(name = "nmon-server")]
#[command(about = "Noise monitoring service: observations, hotspots, reports and plans")]
#[command(version)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "NMON_PORT")]
    pub port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "NMON_HOST")]
    pub host: Option<String>,

    /// Folder holding the SQLite database
    #[arg(short, long, env = "NMON_DATA_FOLDER")]
    pub data_folder: Option<PathBuf>,

    /// TOML config file (default: <config dir>/nmon/config.toml)
    #[arg(short, long, env = "NMON_CONFIG")]
    pub config: Option<PathBuf>,

    /// Folder of CSV files used to seed an empty database
    #[arg(long, env = "NMON_SEED_DIR")]
    pub seed_dir: Option<PathBuf>,

    /// Look-back period of the duplicate report filter, in minutes
    #[arg(long, env = "NMON_DEDUP_WINDOW_MINUTES")]
    pub dedup_window_minutes: Option<i64>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "NMON_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Drop all data and seed again on startup
    #[arg(long)]
    pub reset_data: bool,
}

impl Args {
    /// Values that override the config file
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            data_folder: self.data_folder.clone(),
            host: self.host.clone(),
            port: self.port,
            seed_dir: self.seed_dir.clone(),
            dedup_window_minutes: self.dedup_window_minutes,
            log_level: self.log_level.clone(),
        }
    }

    /// Config file to read: `--config`, else the platform default
    pub fn config_path(&self) -> Option<PathBuf> {
        self.config.clone().or_else(default_config_path)
    }

    /// Resolve the full configuration
    pub fn load_config(&self) -> nmon_common::Result<ServerConfig> {
        let toml = match self.config_path() {
            Some(path) => load_toml_config(&path)?,
            None => TomlConfig::default(),
        };
        ServerConfig::resolve(self.overrides(), toml)
    }
}
