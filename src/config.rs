use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

/// Environment override for the history partition name, bound at deploy
/// time.
pub const HISTORY_TABLE_ENV: &str = "DOVIZ_HISTORY_TABLE";
/// Environment override for the data directory.
pub const DATA_PATH_ENV: &str = "DOVIZ_DATA_PATH";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ZiraatSourceConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IsbankSourceConfig {
    pub base_url: String,
}

/// Which banks to collect from. A source left out of the config simply
/// contributes no reading slot.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SourcesConfig {
    pub ziraat: Option<ZiraatSourceConfig>,
    pub isbank: Option<IsbankSourceConfig>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        SourcesConfig {
            ziraat: Some(ZiraatSourceConfig {
                base_url: "https://www.ziraatbank.com.tr".to_string(),
            }),
            isbank: Some(IsbankSourceConfig {
                base_url: "https://www.isbank.com.tr".to_string(),
            }),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HistoryConfig {
    /// Partition the records live in.
    #[serde(default = "default_table")]
    pub table: String,
    /// Trailing window served by the history query.
    #[serde(default = "default_window_months")]
    pub window_months: u32,
    /// How long records are kept before expiry.
    #[serde(default = "default_retention_months")]
    pub retention_months: u32,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        HistoryConfig {
            table: default_table(),
            window_months: default_window_months(),
            retention_months: default_retention_months(),
        }
    }
}

fn default_table() -> String {
    "rate_history".to_string()
}

fn default_window_months() -> u32 {
    2
}

fn default_retention_months() -> u32 {
    60
}

fn default_pair() -> String {
    "USD_TRY".to_string()
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_pair")]
    pub pair: String,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default = "default_bind")]
    pub bind: String,
    pub data_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            pair: default_pair(),
            sources: SourcesConfig::default(),
            history: HistoryConfig::default(),
            bind: default_bind(),
            data_path: None,
        }
    }
}

impl AppConfig {
    /// Loads the config file from the platform config directory, falling
    /// back to defaults when no file exists. Environment bindings are
    /// applied on top either way.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        let config = if config_path.exists() {
            Self::read_from_path(&config_path)?
        } else {
            Self::default()
        };
        Ok(config.with_env_overrides())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        Ok(Self::read_from_path(path)?.with_env_overrides())
    }

    fn read_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(table) = std::env::var(HISTORY_TABLE_ENV) {
            self.history.table = table;
        }
        if let Ok(path) = std::env::var(DATA_PATH_ENV) {
            self.data_path = Some(path);
        }
        self
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "doviz", "doviz")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("dev", "doviz", "doviz")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }
}

/// Splits a pair identifier like "USD_TRY" into base and quote codes.
pub fn split_pair(pair: &str) -> (&str, &str) {
    match pair.split_once('_') {
        Some((base, quote)) => (base, quote),
        None => (pair, ""),
    }
}
