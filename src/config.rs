use crate::error::{AppError, Result};
use crate::sheets::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use yup_oauth2::ServiceAccountKey;

const CONFIG_DIR_PREFIX: &str = "locsync";

pub const DEFAULT_CREDENTIALS_PATH: &str = "./credentials.json";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub google: GoogleConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    pub sync: SyncConfig,
    pub packaging: Option<PackagingConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct GoogleConfig {
    /// Key file, or a directory containing `credentials.json`.
    pub credentials_path: Option<PathBuf>,
    /// Key embedded in the config file. Takes precedence over the key file.
    pub service_account: Option<ServiceAccountKey>,
}

impl GoogleConfig {
    pub fn credentials_path(&self) -> PathBuf {
        self.credentials_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CREDENTIALS_PATH))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            delay_secs: policy.delay.as_secs(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_secs(self.delay_secs))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct SyncConfig {
    /// Directory holding the localization record files.
    pub record_dir: PathBuf,
    /// Drive folder searched when a document has no explicit ID.
    pub drive_folder: Option<String>,
    #[serde(default)]
    pub documents: Vec<DocumentConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DocumentConfig {
    /// Record file name, also the spreadsheet name in Drive.
    pub name: String,
    pub id: Option<String>,
    #[serde(default)]
    pub sheet: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PackagingConfig {
    pub tool_path: PathBuf,
    pub game_path: PathBuf,
    pub source_dir: PathBuf,
    pub object_dir: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Err(AppError::Config(format!(
                "Config file not found at {:?}. Please create one.",
                config_path
            )));
        }

        let contents = fs::read_to_string(config_path)?;
        let config: Config = toml::from_str(&contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(AppError::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }

        if self.sync.record_dir.as_os_str().is_empty() {
            return Err(AppError::Config(
                "sync.record_dir must be set in config file".to_string(),
            ));
        }

        if let Some(doc) = self.sync.documents.iter().find(|d| d.name.is_empty()) {
            return Err(AppError::Config(format!(
                "Document entry has an empty name: {:?}",
                doc
            )));
        }

        Ok(())
    }

    fn xdg_dirs() -> xdg::BaseDirectories {
        xdg::BaseDirectories::with_prefix(CONFIG_DIR_PREFIX)
    }

    /// Get the config file path
    pub fn config_file() -> Result<PathBuf> {
        let xdg_dirs = Self::xdg_dirs();
        xdg_dirs
            .place_config_file("config.toml")
            .map_err(|e| AppError::Config(format!("Failed to create config directory: {}", e)))
    }

    /// Get the cache directory path
    pub fn cache_dir() -> Result<PathBuf> {
        let xdg = Self::xdg_dirs();
        xdg.get_cache_home()
            .ok_or_else(|| AppError::Config("Failed to determine cache directory".to_string()))
    }

    /// Get a cache file path
    pub fn cache_file(filename: &str) -> Result<PathBuf> {
        let xdg = Self::xdg_dirs();
        xdg.place_cache_file(filename)
            .map_err(|e| AppError::Config(format!("Failed to create cache file path: {}", e)))
    }
}
