//! Normalized non-streaming response

use crate::types::stream::Usage;
use crate::types::tool::ToolCall;

/// A complete, normalized response from a provider
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChatResponse {
    /// The generated text content
    pub content: String,
    /// Tool calls requested by the model
    pub tool_calls: Vec<ToolCall>,
    /// Normalized token usage, when reported
    pub usage: Option<Usage>,
    /// Model that served the request, as reported by the vendor
    pub model: Option<String>,
    /// Vendor response id
    pub id: Option<String>,
}

impl ChatResponse {
    /// Check if the response contains tool calls
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}
