//! Configuration loading
//!
//! Every setting resolves in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing config file is not an error; the service starts on defaults.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

pub const ENV_CONFIG: &str = "DDT_CONFIG";
pub const ENV_DATABASE_PATH: &str = "DDT_DATABASE_PATH";
pub const ENV_BIND_ADDR: &str = "DDT_BIND_ADDR";
pub const ENV_TOKEN_TTL_MINUTES: &str = "DDT_TOKEN_TTL_MINUTES";
pub const ENV_DRIFT_INTERVAL_SECS: &str = "DDT_DRIFT_INTERVAL_SECS";
pub const ENV_SUMMARY_INTERVAL_SECS: &str = "DDT_SUMMARY_INTERVAL_SECS";
pub const ENV_ANALYSIS_WINDOW_HOURS: &str = "DDT_ANALYSIS_WINDOW_HOURS";
pub const ENV_SCHEDULER_ENABLED: &str = "DDT_SCHEDULER_ENABLED";

/// Longest look-back accepted for drift analysis (one year)
pub const MAX_ANALYSIS_WINDOW_HOURS: i64 = 24 * 365;

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_path: PathBuf,
    pub bind_addr: String,
    pub token_ttl_minutes: i64,
    pub drift_interval_secs: u64,
    pub summary_interval_secs: u64,
    pub analysis_window_hours: i64,
    pub scheduler_enabled: bool,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            bind_addr: "127.0.0.1:8000".to_string(),
            token_ttl_minutes: 30,
            drift_interval_secs: 300,
            summary_interval_secs: 3600,
            analysis_window_hours: 24,
            scheduler_enabled: true,
            log_level: "info".to_string(),
        }
    }
}

/// On-disk TOML shape; every key optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    pub database_path: Option<PathBuf>,
    pub bind_addr: Option<String>,
    pub token_ttl_minutes: Option<i64>,
    pub drift_interval_secs: Option<u64>,
    pub summary_interval_secs: Option<u64>,
    pub analysis_window_hours: Option<i64>,
    pub scheduler_enabled: Option<bool>,
    pub log_level: Option<String>,
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
    pub bind_addr: Option<String>,
}

impl Config {
    /// Resolve configuration from CLI, environment, TOML and defaults
    pub fn resolve(cli: &CliOverrides) -> Result<Self> {
        let toml_config = match locate_config_file(cli.config_path.as_deref()) {
            Some(path) => load_toml(&path)?,
            None => {
                info!("No config file found, using defaults and environment");
                TomlConfig::default()
            }
        };

        let mut config = Config::default().merge_toml(toml_config);
        config.apply_env()?;

        if let Some(path) = &cli.database_path {
            config.database_path = path.clone();
        }
        if let Some(addr) = &cli.bind_addr {
            config.bind_addr = addr.clone();
        }

        config.validate()?;
        Ok(config)
    }

    fn merge_toml(mut self, t: TomlConfig) -> Self {
        if let Some(v) = t.database_path {
            self.database_path = v;
        }
        if let Some(v) = t.bind_addr {
            self.bind_addr = v;
        }
        if let Some(v) = t.token_ttl_minutes {
            self.token_ttl_minutes = v;
        }
        if let Some(v) = t.drift_interval_secs {
            self.drift_interval_secs = v;
        }
        if let Some(v) = t.summary_interval_secs {
            self.summary_interval_secs = v;
        }
        if let Some(v) = t.analysis_window_hours {
            self.analysis_window_hours = v;
        }
        if let Some(v) = t.scheduler_enabled {
            self.scheduler_enabled = v;
        }
        if let Some(v) = t.log_level {
            self.log_level = v;
        }
        self
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(v) = std::env::var(ENV_DATABASE_PATH) {
            self.database_path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var(ENV_BIND_ADDR) {
            self.bind_addr = v;
        }
        if let Some(v) = env_parse(ENV_TOKEN_TTL_MINUTES)? {
            self.token_ttl_minutes = v;
        }
        if let Some(v) = env_parse(ENV_DRIFT_INTERVAL_SECS)? {
            self.drift_interval_secs = v;
        }
        if let Some(v) = env_parse(ENV_SUMMARY_INTERVAL_SECS)? {
            self.summary_interval_secs = v;
        }
        if let Some(v) = env_parse(ENV_ANALYSIS_WINDOW_HOURS)? {
            self.analysis_window_hours = v;
        }
        if let Some(v) = env_parse(ENV_SCHEDULER_ENABLED)? {
            self.scheduler_enabled = v;
        }
        if let Ok(v) = std::env::var("RUST_LOG") {
            self.log_level = v;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.token_ttl_minutes <= 0 {
            return Err(Error::Config("token_ttl_minutes must be positive".to_string()));
        }
        if self.drift_interval_secs == 0 || self.summary_interval_secs == 0 {
            return Err(Error::Config("scheduler intervals must be non-zero".to_string()));
        }
        if !(1..=MAX_ANALYSIS_WINDOW_HOURS).contains(&self.analysis_window_hours) {
            return Err(Error::Config(format!(
                "analysis_window_hours must be between 1 and {}",
                MAX_ANALYSIS_WINDOW_HOURS
            )));
        }
        Ok(())
    }
}

fn env_parse<T: FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::Config(format!("{} has invalid value '{}'", name, raw))),
        Err(_) => Ok(None),
    }
}

/// Find the config file: explicit path, then `DDT_CONFIG`, then the user config dir
fn locate_config_file(cli_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_path {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = std::env::var(ENV_CONFIG) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir()
        .map(|d| d.join("ddt").join("config.toml"))
        .filter(|p| p.exists())
}

/// Parse a TOML config file
///
/// A path that does not exist logs a warning and yields empty settings.
pub fn load_toml(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!("Config file {} not found, using defaults", path.display());
        return Ok(TomlConfig::default());
    }
    let content = std::fs::read_to_string(path)?;
    let parsed = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;
    info!("Loaded config file {}", path.display());
    Ok(parsed)
}

/// OS-dependent default database location
fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("ddt"))
        .unwrap_or_else(|| PathBuf::from("./ddt_data"))
        .join("ddt.db")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.bind_addr, "127.0.0.1:8000");
        assert_eq!(config.token_ttl_minutes, 30);
        assert!(config.scheduler_enabled);
        assert!(config.database_path.ends_with("ddt.db"));
    }

    #[test]
    fn test_toml_overrides_only_given_keys() {
        let t: TomlConfig = toml::from_str("bind_addr = \"0.0.0.0:9000\"\ntoken_ttl_minutes = 5").unwrap();
        let config = Config::default().merge_toml(t);
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.token_ttl_minutes, 5);
        assert_eq!(config.drift_interval_secs, 300);
    }

    #[test]
    fn test_toml_rejects_unknown_keys() {
        assert!(toml::from_str::<TomlConfig>("bogus = 1").is_err());
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let config = Config {
            drift_interval_secs: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_bounds_analysis_window() {
        let too_long = Config {
            analysis_window_hours: MAX_ANALYSIS_WINDOW_HOURS + 1,
            ..Config::default()
        };
        assert!(matches!(too_long.validate(), Err(Error::Config(_))));

        let longest = Config {
            analysis_window_hours: MAX_ANALYSIS_WINDOW_HOURS,
            ..Config::default()
        };
        assert!(longest.validate().is_ok());
    }
}
