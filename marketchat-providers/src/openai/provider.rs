//! OpenAI-compatible driver
//!
//! Implements the shared [`ChatProvider`] contract against any Chat
//! Completions endpoint. Cache blocks degrade to a flattened system message;
//! see the converter.

use crate::base;
use crate::http::{bearer_headers, HttpClient, ReqwestClient};
use crate::openai::{
    config::OpenAiConfig, converter::to_chat_completions_request, parser::parse_completion,
    stream::ChatCompletionsNormalizer,
};
use crate::sse::SseEventStream;
use async_trait::async_trait;
use marketchat_core::{
    ChatProvider, ChatRequest, ChatResponse, Error, EventStream, Result,
};
use reqwest::header::{HeaderMap, HeaderValue};
use std::sync::Arc;

/// OpenAI-compatible driver
#[derive(Clone)]
pub struct OpenAi {
    config: OpenAiConfig,
    client: Arc<dyn HttpClient>,
}

impl OpenAi {
    /// Create a new driver with the given configuration and client
    pub fn new(config: OpenAiConfig, client: Arc<dyn HttpClient>) -> Self {
        Self { config, client }
    }

    /// Create a new driver with just an API key
    pub fn with_api_key(api_key: impl Into<String>) -> Result<Self> {
        let client = Arc::new(ReqwestClient::new()?);
        Ok(Self::new(OpenAiConfig::new(api_key), client))
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = bearer_headers(&self.config.api_key)?;
        if let Some(org) = &self.config.organization {
            headers.insert(
                "OpenAI-Organization",
                HeaderValue::from_str(org)
                    .map_err(|e| Error::Validation(format!("invalid organization: {}", e)))?,
            );
        }
        Ok(headers)
    }
}

#[async_trait]
impl ChatProvider for OpenAi {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    async fn create_completion(&self, request: ChatRequest) -> Result<ChatResponse> {
        base::validate_request(self.name(), self.is_configured(), &request)?;
        let body = to_chat_completions_request(&request, false)?;

        tracing::debug!(model = %request.model, "issuing chat completion");
        let value = self
            .client
            .post(self.name(), &self.config.chat_url(), self.headers()?, body)
            .await?;

        parse_completion(value)
    }

    async fn create_stream(&self, request: ChatRequest) -> Result<EventStream> {
        base::validate_request(self.name(), self.is_configured(), &request)?;
        let body = to_chat_completions_request(&request, true)?;

        tracing::debug!(model = %request.model, "opening chat completion stream");
        let source = self
            .client
            .post_event_stream(&self.config.chat_url(), self.headers()?, body)
            .await?;

        Ok(Box::pin(SseEventStream::new(
            source,
            ChatCompletionsNormalizer::new(),
        )))
    }
}
