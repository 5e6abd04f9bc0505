//! Anthropic driver configuration

use crate::constants::ANTHROPIC_DEFAULT_BASE_URL;

/// Configuration for the Anthropic driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnthropicConfig {
    /// API key for authentication
    pub api_key: String,
    /// Base URL for the Messages API
    pub base_url: String,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: ANTHROPIC_DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl AnthropicConfig {
    /// Create a new configuration with the given API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Read configuration from `ANTHROPIC_API_KEY` / `ANTHROPIC_BASE_URL`
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("ANTHROPIC_API_KEY").unwrap_or_default(),
            base_url: std::env::var("ANTHROPIC_BASE_URL")
                .unwrap_or_else(|_| ANTHROPIC_DEFAULT_BASE_URL.to_string()),
        }
    }

    /// Set the base URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Whether credentials are present
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// The Messages endpoint
    pub fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url.trim_end_matches('/'))
    }
}
