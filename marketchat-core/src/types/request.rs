//! Request types for chat interactions

use crate::prompt::CompiledSystemPrompt;
use crate::types::message::Message;
use crate::types::tool::Tool;
use thiserror::Error;

/// A provider-independent chat request
///
/// The same request can be served by any registered model; drivers adapt the
/// system prompt and tool definitions to their vendor's shapes.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    /// The model to use (a registry model id)
    pub model: String,
    /// The conversation messages
    pub messages: Vec<Message>,
    /// Compiled system prompt, if any
    pub system: Option<CompiledSystemPrompt>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Temperature for randomness
    pub temperature: Option<f32>,
    /// Available tools, in canonical shape
    pub tools: Vec<Tool>,
}

impl ChatRequest {
    /// Create a new request builder
    pub fn builder() -> ChatRequestBuilder {
        ChatRequestBuilder::default()
    }
}

/// Builder for [`ChatRequest`]
#[derive(Debug, Default)]
pub struct ChatRequestBuilder {
    model: Option<String>,
    messages: Vec<Message>,
    system: Option<CompiledSystemPrompt>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    tools: Vec<Tool>,
}

impl ChatRequestBuilder {
    /// Set the model id
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Add a message
    pub fn message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Add multiple messages
    pub fn messages(mut self, messages: impl IntoIterator<Item = Message>) -> Self {
        self.messages.extend(messages);
        self
    }

    /// Set the compiled system prompt
    pub fn system(mut self, system: CompiledSystemPrompt) -> Self {
        self.system = Some(system);
        self
    }

    /// Set max tokens
    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    /// Set temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Add a tool
    pub fn tool(mut self, tool: Tool) -> Self {
        self.tools.push(tool);
        self
    }

    /// Add multiple tools
    pub fn tools(mut self, tools: impl IntoIterator<Item = Tool>) -> Self {
        self.tools.extend(tools);
        self
    }

    /// Build the request, failing on structurally invalid input
    pub fn build(self) -> Result<ChatRequest, BuildError> {
        let model = self.model.filter(|m| !m.is_empty()).ok_or(BuildError::NoModel)?;
        if self.messages.is_empty() {
            return Err(BuildError::NoMessages);
        }
        Ok(ChatRequest {
            model,
            messages: self.messages,
            system: self.system,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            tools: self.tools,
        })
    }
}

/// Errors that can occur when building a request
#[derive(Debug, Error)]
pub enum BuildError {
    /// Request must name a model
    #[error("Request must name a model")]
    NoModel,
    /// Request must contain at least one message
    #[error("Request must contain at least one message")]
    NoMessages,
}
