use crate::core::history::DEFAULT_MAX_POINTS;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";
pub const DEFAULT_MIN_AMOUNT: f64 = 5000.0;

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct YahooProviderConfig {
    pub base_url: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Extra attempts after a transport error.
    pub retries: usize,
}

impl Default for YahooProviderConfig {
    fn default() -> Self {
        YahooProviderConfig {
            base_url: DEFAULT_YAHOO_BASE_URL.to_string(),
            timeout_secs: 10,
            retries: 1,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ProvidersConfig {
    pub yahoo: Option<YahooProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            yahoo: Some(YahooProviderConfig::default()),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct AllocationConfig {
    pub min_amount: f64,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        AllocationConfig {
            min_amount: DEFAULT_MIN_AMOUNT,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct HistoryConfig {
    pub max_points: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        HistoryConfig {
            max_points: DEFAULT_MAX_POINTS,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub allocation: AllocationConfig,
    pub history: HistoryConfig,
    pub providers: ProvidersConfig,
    pub currency: String,
    pub data_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            allocation: AllocationConfig::default(),
            history: HistoryConfig::default(),
            providers: ProvidersConfig::default(),
            currency: "USD".to_string(),
            data_path: None,
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location, falling back to built-in
    /// defaults when no file has been set up yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "folio", "folio")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    /// Directory holding the history file.
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("io", "folio", "folio")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn yahoo(&self) -> YahooProviderConfig {
        self.providers.yahoo.clone().unwrap_or_default()
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
