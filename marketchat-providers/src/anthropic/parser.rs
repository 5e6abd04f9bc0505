//! Messages API response parsing (non-streaming)

use crate::base;
use marketchat_core::{ChatResponse, Result, ToolCall, Usage};
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
pub(crate) struct MessagesResponse {
    pub id: String,
    pub model: String,
    pub content: Vec<WireContentBlock>,
    pub usage: Option<Usage>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
pub(crate) enum WireContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse { id: String, name: String, input: Value },
    #[serde(other)]
    Unknown,
}

/// Parse a complete Messages API response into the normalized shape.
pub(crate) fn parse_completion(value: Value) -> Result<ChatResponse> {
    let response: MessagesResponse = serde_json::from_value(value)
        .map_err(|e| base::protocol_error("anthropic", format!("malformed response: {}", e)))?;

    let mut content_parts = Vec::new();
    let mut tool_calls = Vec::new();
    for block in response.content {
        match block {
            WireContentBlock::Text { text } => content_parts.push(text),
            WireContentBlock::ToolUse { id, name, input } => tool_calls.push(ToolCall {
                id,
                name,
                arguments: input.to_string(),
            }),
            WireContentBlock::Unknown => {}
        }
    }

    Ok(ChatResponse {
        content: content_parts.join("\n"),
        tool_calls,
        usage: response.usage,
        model: Some(response.model),
        id: Some(response.id),
    })
}
