use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

use crate::core::controller::ControllerSettings;
use crate::core::conversion::ConversionRequest;
use crate::core::currency::{Catalog, CurrencyInfo};

pub const DEFAULT_BASE_URL: &str = "https://api.exchangerate-api.com";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Values the converter starts with.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DefaultsConfig {
    pub amount: String,
    pub from: String,
    pub to: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        DefaultsConfig {
            amount: "100".to_string(),
            from: "USD".to_string(),
            to: "KGS".to_string(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    500
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    /// Replaces the built-in currency list when non-empty.
    #[serde(default)]
    pub currencies: Vec<CurrencyInfo>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            provider: ProviderConfig::default(),
            debounce_ms: default_debounce_ms(),
            defaults: DefaultsConfig::default(),
            currencies: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location, falling back to built-in
    /// defaults when no file exists there.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(path = %config_path.display(), "No config file found, using defaults");
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "xconv", "xconv")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn catalog(&self) -> Catalog {
        if self.currencies.is_empty() {
            Catalog::default()
        } else {
            Catalog::new(self.currencies.clone())
        }
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            debounce: Duration::from_millis(self.debounce_ms),
            initial: ConversionRequest::new(
                &self.defaults.amount,
                &self.defaults.from,
                &self.defaults.to,
            ),
        }
    }
}
