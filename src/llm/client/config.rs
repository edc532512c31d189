// src/llm/client/config.rs
// Per-client connection settings derived from BalanceConfig

use std::time::Duration;

use tracing::debug;

use crate::config::{BalanceConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use crate::llm::error::{LlmError, Result};

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl ClientConfig {
    pub fn from_config(config: &BalanceConfig) -> Self {
        debug!(
            "Client config: base_url={}, timeout={}s",
            config.openai_base_url, config.openai_timeout
        );

        Self {
            api_key: config.openai_api_key.clone(),
            base_url: config.openai_base_url.clone(),
            timeout_secs: config.openai_timeout,
        }
    }

    /// Create configuration with custom values (for testing)
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(LlmError::configuration("API key cannot be empty"));
        }

        if self.base_url.trim().is_empty() {
            return Err(LlmError::configuration("Base URL cannot be empty"));
        }

        if self.timeout_secs == 0 {
            return Err(LlmError::configuration("timeout must be at least 1 second"));
        }

        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("", DEFAULT_BASE_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(ClientConfig::new("sk-test", DEFAULT_BASE_URL).validate().is_ok());
        assert!(ClientConfig::default().validate().is_err());
        assert!(ClientConfig::new("sk-test", "").validate().is_err());
        assert!(
            ClientConfig::new("sk-test", DEFAULT_BASE_URL)
                .with_timeout(0)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_from_config() {
        let balance = BalanceConfig::from_lookup(|key| match key {
            "OPENAI_API_KEY" => Some("sk-test".to_string()),
            "BALANCE_OPENAI_TIMEOUT" => Some("15".to_string()),
            _ => None,
        })
        .unwrap();

        let config = ClientConfig::from_config(&balance);
        assert_eq!(config.api_key(), "sk-test");
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.timeout(), Duration::from_secs(15));
    }
}
