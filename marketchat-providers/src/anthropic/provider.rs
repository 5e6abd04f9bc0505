//! Anthropic driver
//!
//! Implements the shared [`ChatProvider`] contract against the Messages API.
//! This is the only driver with genuine cache-block support: compiled
//! cache-block prompts pass through to the vendor unmodified.

use crate::anthropic::{
    config::AnthropicConfig, converter::to_messages_request, parser::parse_completion,
    stream::MessagesNormalizer,
};
use crate::base;
use crate::constants::ANTHROPIC_API_VERSION;
use crate::http::{HttpClient, ReqwestClient};
use crate::sse::SseEventStream;
use async_trait::async_trait;
use marketchat_core::{
    ChatProvider, ChatRequest, ChatResponse, Error, EventStream, Result,
};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use std::sync::Arc;

/// Messages-style driver
#[derive(Clone)]
pub struct Anthropic {
    config: AnthropicConfig,
    client: Arc<dyn HttpClient>,
}

impl Anthropic {
    /// Create a new driver with the given configuration and client
    pub fn new(config: AnthropicConfig, client: Arc<dyn HttpClient>) -> Self {
        Self { config, client }
    }

    /// Create a new driver with just an API key
    pub fn with_api_key(api_key: impl Into<String>) -> Result<Self> {
        let client = Arc::new(ReqwestClient::new()?);
        Ok(Self::new(AnthropicConfig::new(api_key), client))
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.config.api_key)
                .map_err(|e| Error::Validation(format!("invalid API key: {}", e)))?,
        );
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_API_VERSION),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

#[async_trait]
impl ChatProvider for Anthropic {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    async fn create_completion(&self, request: ChatRequest) -> Result<ChatResponse> {
        base::validate_request(self.name(), self.is_configured(), &request)?;
        let body = to_messages_request(&request, false)?;

        tracing::debug!(model = %request.model, "issuing messages completion");
        let value = self
            .client
            .post(self.name(), &self.config.messages_url(), self.headers()?, body)
            .await?;

        parse_completion(value)
    }

    async fn create_stream(&self, request: ChatRequest) -> Result<EventStream> {
        base::validate_request(self.name(), self.is_configured(), &request)?;
        let body = to_messages_request(&request, true)?;

        tracing::debug!(model = %request.model, "opening messages stream");
        let source = self
            .client
            .post_event_stream(&self.config.messages_url(), self.headers()?, body)
            .await?;

        Ok(Box::pin(SseEventStream::new(
            source,
            MessagesNormalizer::new(),
        )))
    }
}
