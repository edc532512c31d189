// src/config/mod.rs
// Process-wide settings: .env / environment first, TOML file as an alternative

use std::path::Path;
use std::str::FromStr;

use once_cell::sync::OnceCell;
use serde::Deserialize;
use tracing::{Level, debug, warn};

use crate::llm::analysis::AnalysisType;
use crate::llm::client::request::FLAGSHIP_MODEL;
use crate::llm::error::{LlmError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

static CONFIG: OnceCell<BalanceConfig> = OnceCell::new();

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BalanceConfig {
    // ── OpenAI Configuration
    pub openai_api_key: String,
    #[serde(default = "default_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub analysis_type: AnalysisType,

    // ── Timeouts (in seconds)
    #[serde(default = "default_timeout")]
    pub openai_timeout: u64,

    // ── Logging Configuration
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    FLAGSHIP_MODEL.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_log_level() -> String {
    "info".to_string()
}

// Handles values with trailing comments and extra whitespace
fn var_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let Some(val) = lookup(key) else {
        return default;
    };

    let clean_val = val.split('#').next().unwrap_or("").trim();
    match clean_val.parse::<T>() {
        Ok(parsed) => {
            debug!("Config: {} = {} (from environment)", key, clean_val);
            parsed
        }
        Err(_) => {
            warn!("Config: {} = '{}' (parse failed, using default)", key, val);
            default
        }
    }
}

impl BalanceConfig {
    /// Load from `.env` (if present) and the process environment
    pub fn from_env() -> Result<Self> {
        if dotenvy::dotenv().is_err() {
            debug!(".env file not found, using environment variables and defaults");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; the API key is the only required value
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let openai_api_key = lookup("OPENAI_API_KEY")
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| LlmError::configuration("OPENAI_API_KEY must be set"))?;

        Ok(Self {
            openai_api_key,
            openai_base_url: var_or(&lookup, "OPENAI_BASE_URL", default_base_url()),
            model: var_or(&lookup, "BALANCE_MODEL", default_model()),
            analysis_type: var_or(&lookup, "BALANCE_ANALYSIS_TYPE", AnalysisType::default()),
            openai_timeout: var_or(&lookup, "BALANCE_OPENAI_TIMEOUT", DEFAULT_TIMEOUT_SECS),
            log_level: var_or(&lookup, "BALANCE_LOG_LEVEL", default_log_level()),
        })
    }

    /// Load from a TOML file with the same keys as the struct fields
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            LlmError::configuration(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&contents).map_err(|e| {
            LlmError::configuration(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        if config.openai_api_key.trim().is_empty() {
            return Err(LlmError::configuration(format!(
                "openai_api_key is empty in {}",
                path.display()
            )));
        }
        Ok(config)
    }

    /// `log_level` as a tracing level; unparseable values mean INFO
    pub fn max_log_level(&self) -> Level {
        self.log_level.trim().parse().unwrap_or(Level::INFO)
    }
}

/// Read the configuration once for the whole process.
///
/// Hosts call this at boot and treat an error as a fatal startup condition.
/// Later calls return the same instance.
pub fn init() -> Result<&'static BalanceConfig> {
    CONFIG.get_or_try_init(BalanceConfig::from_env)
}

/// Install an already-built configuration. Fails if one is installed.
pub fn install(config: BalanceConfig) -> Result<&'static BalanceConfig> {
    CONFIG
        .set(config)
        .map_err(|_| LlmError::configuration("configuration already initialized"))?;
    CONFIG
        .get()
        .ok_or_else(|| LlmError::configuration("configuration not initialized"))
}
