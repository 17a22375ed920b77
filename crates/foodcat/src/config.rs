use crate::prelude::*;
use std::time::Duration;

/// Catalog configuration from environment variables
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl CatalogConfig {
    /// Default per-request timeout in seconds
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Load configuration from environment variables
    /// Uses FOODCAT_BASE_URL with the public Open Food Facts host as fallback
    /// Uses FOODCAT_TIMEOUT (seconds) with a 30 second fallback
    /// Uses FOODCAT_USER_AGENT with `foodcat/<version>` as fallback
    pub fn from_env() -> Result<Self> {
        let timeout = match std::env::var("FOODCAT_TIMEOUT") {
            Ok(value) => value
                .trim()
                .parse::<u64>()
                .map_err(|_| eyre!("FOODCAT_TIMEOUT must be a number of seconds, got: {}", value))?,
            Err(_) => Self::DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            base_url: std::env::var("FOODCAT_BASE_URL")
                .unwrap_or_else(|_| foodcat_core::api::DEFAULT_BASE_URL.to_string()),
            timeout: Duration::from_secs(timeout),
            user_agent: std::env::var("FOODCAT_USER_AGENT")
                .unwrap_or_else(|_| f!("foodcat/{}", env!("CARGO_PKG_VERSION"))),
        })
    }

    /// Apply CLI overrides to the configuration
    pub fn with_overrides(mut self, base_url: Option<String>, timeout: Option<u64>) -> Self {
        if let Some(url) = base_url {
            self.base_url = url;
        }
        if let Some(secs) = timeout {
            self.timeout = Duration::from_secs(secs);
        }
        self
    }

    /// Resolve the configuration for a command invocation
    pub fn resolve(global: &crate::Global) -> Result<Self> {
        Ok(Self::from_env()?.with_overrides(global.base_url.clone(), global.timeout))
    }
}

/// Create the HTTP client used for every catalog request
pub fn create_client(config: &CatalogConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.timeout)
        .user_agent(config.user_agent.clone())
        .build()
        .map_err(|e| eyre!("Failed to build HTTP client: {}", e))
}
