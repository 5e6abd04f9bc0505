//! Chat Completions response parsing (non-streaming)

use crate::base;
use marketchat_core::{ChatResponse, Result, ToolCall, Usage};
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
struct ChatCompletionsResponse {
    id: String,
    model: String,
    choices: Vec<WireChoice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireMessage,
}

#[derive(Deserialize)]
struct WireMessage {
    content: Option<String>,
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Deserialize)]
struct WireToolCall {
    id: String,
    function: WireFunction,
}

#[derive(Deserialize)]
struct WireFunction {
    name: String,
    arguments: String,
}

/// Parse a complete Chat Completions response into the normalized shape.
pub(crate) fn parse_completion(value: Value) -> Result<ChatResponse> {
    let response: ChatCompletionsResponse = serde_json::from_value(value)
        .map_err(|e| base::protocol_error("openai", format!("malformed response: {}", e)))?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| base::protocol_error("openai", "no choices in response"))?;

    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|tc| ToolCall {
            id: tc.id,
            name: tc.function.name,
            arguments: tc.function.arguments,
        })
        .collect();

    Ok(ChatResponse {
        content: choice.message.content.unwrap_or_default(),
        tool_calls,
        usage: response.usage,
        model: Some(response.model),
        id: Some(response.id),
    })
}
