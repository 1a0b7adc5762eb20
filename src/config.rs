use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FiatProviderConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for FiatProviderConfig {
    fn default() -> Self {
        FiatProviderConfig {
            base_url: "https://v6.exchangerate-api.com".to_string(),
            api_key: None,
        }
    }
}

impl FiatProviderConfig {
    /// Config value first, `EXCHANGE_RATE_API_KEY` as fallback.
    pub fn resolve_api_key(&self) -> Result<String> {
        self.api_key
            .clone()
            .or_else(|| env::var("EXCHANGE_RATE_API_KEY").ok())
            .context("No fiat API key: set providers.fiat.api_key or EXCHANGE_RATE_API_KEY")
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CryptoProviderConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for CryptoProviderConfig {
    fn default() -> Self {
        CryptoProviderConfig {
            base_url: "https://api.coingecko.com".to_string(),
            api_key: None,
        }
    }
}

impl CryptoProviderConfig {
    /// Config value first, `COINGECKO_API_KEY` as fallback.
    pub fn resolve_api_key(&self) -> Result<String> {
        self.api_key
            .clone()
            .or_else(|| env::var("COINGECKO_API_KEY").ok())
            .context("No crypto API key: set providers.crypto.api_key or COINGECKO_API_KEY")
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub fiat: FiatProviderConfig,
    #[serde(default)]
    pub crypto: CryptoProviderConfig,
}

/// Fixed display precision; converted amounts and exchange rates are
/// configured independently.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DisplayConfig {
    #[serde(default = "default_amount_decimals")]
    pub amount_decimals: usize,
    #[serde(default = "default_rate_decimals")]
    pub rate_decimals: usize,
}

fn default_amount_decimals() -> usize {
    8
}

fn default_rate_decimals() -> usize {
    6
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            amount_decimals: default_amount_decimals(),
            rate_decimals: default_rate_decimals(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            // Defaults work without a config file; only the API keys must
            // then come from the environment.
            debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            return Ok(AppConfig::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("in", "codito", "cambio")
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
}
