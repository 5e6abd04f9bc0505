//! OpenAI-compatible driver configuration

use crate::constants::OPENAI_DEFAULT_BASE_URL;

/// Configuration for the OpenAI-compatible driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAiConfig {
    /// API key for authentication
    pub api_key: String,
    /// Base URL for the API
    pub base_url: String,
    /// Optional organization ID
    pub organization: Option<String>,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: OPENAI_DEFAULT_BASE_URL.to_string(),
            organization: None,
        }
    }
}

impl OpenAiConfig {
    /// Create a new configuration with the given API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Read configuration from `OPENAI_API_KEY` / `OPENAI_BASE_URL` /
    /// `OPENAI_ORG_ID`
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| OPENAI_DEFAULT_BASE_URL.to_string()),
            organization: std::env::var("OPENAI_ORG_ID").ok(),
        }
    }

    /// Set a custom base URL (any OpenAI-compatible endpoint)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the organization ID
    pub fn with_organization(mut self, org: impl Into<String>) -> Self {
        self.organization = Some(org.into());
        self
    }

    /// Whether credentials are present
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// The chat completions endpoint
    pub fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}
