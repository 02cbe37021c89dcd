use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::analysis::volatility::DEFAULT_WINDOW;
use crate::data::types::LookbackPeriod;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_window")]
    pub window: usize,
    #[serde(default = "default_horizon_days")]
    pub default_horizon_days: u32,
    #[serde(default)]
    pub default_period: LookbackPeriod,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct DisplayConfig {
    #[serde(default)]
    pub watermark: Option<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
            default_horizon_days: default_horizon_days(),
            default_period: LookbackPeriod::default(),
        }
    }
}

fn default_base_url() -> String { "https://query1.finance.yahoo.com/v8/finance/chart".to_string() }
fn default_timeout_secs() -> u64 { 15 }
fn default_user_agent() -> String { "Mozilla/5.0 (X11; Linux x86_64) volproj/0.1".to_string() }
fn default_window() -> usize { DEFAULT_WINDOW }
fn default_horizon_days() -> u32 { 30 }

/// Overrides read from the process environment (and `.env`, if present).
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path))
    }

    /// Like `load`, but a missing file yields the built-in defaults.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            warn!("Config file {} not found, using defaults", path);
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;

        if config.analysis.window < 2 {
            anyhow::bail!("analysis.window must be at least 2, got {}", config.analysis.window);
        }
        if config.data.timeout_secs == 0 {
            anyhow::bail!("data.timeout_secs must be positive");
        }

        Ok(config)
    }

    /// Apply environment overrides on top of the file values.
    pub fn with_env(mut self, env: &EnvConfig) -> Self {
        if let Some(url) = &env.base_url {
            self.data.base_url = url.clone();
        }
        if let Some(timeout) = env.timeout_secs {
            self.data.timeout_secs = timeout;
        }
        self
    }
}

impl EnvConfig {
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let timeout_secs = match std::env::var("VOLPROJ_TIMEOUT_SECS") {
            Ok(raw) => Some(
                raw.parse::<u64>()
                    .with_context(|| format!("VOLPROJ_TIMEOUT_SECS is not a number: {}", raw))?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            base_url: std::env::var("VOLPROJ_BASE_URL").ok(),
            timeout_secs,
        })
    }
}
