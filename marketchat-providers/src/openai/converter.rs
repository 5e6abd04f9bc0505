//! Conversion from canonical requests to Chat Completions wire format

use crate::tools::transform_tools;
use marketchat_core::{blocks_to_string, ChatRequest, Result, Role};
use serde_json::{json, Map, Value};

/// Build the Chat Completions request body.
///
/// This driver cannot accept cache blocks: a compiled prompt is flattened via
/// the compiler's string path and prepended as a system-role message at
/// position zero, after stripping any pre-existing system message to avoid
/// duplication.
pub fn to_chat_completions_request(request: &ChatRequest, stream: bool) -> Result<Value> {
    let system_text = request
        .system
        .as_ref()
        .map(blocks_to_string)
        .filter(|s| !s.is_empty());

    let mut messages: Vec<Value> = Vec::new();
    if let Some(text) = &system_text {
        messages.push(json!({"role": "system", "content": text}));
    }
    for msg in &request.messages {
        match msg.role {
            Role::System => {
                if system_text.is_some() {
                    continue;
                }
                messages.push(json!({"role": "system", "content": msg.content}));
            }
            Role::User => messages.push(json!({"role": "user", "content": msg.content})),
            Role::Assistant => {
                messages.push(json!({"role": "assistant", "content": msg.content}))
            }
            Role::Tool => messages.push(json!({
                "role": "tool",
                "tool_call_id": msg.tool_call_id.clone().unwrap_or_default(),
                "content": msg.content,
            })),
            // `Role` is non-exhaustive; no other variants exist in this workspace.
            _ => unreachable!(),
        }
    }

    let mut body = Map::new();
    body.insert("model".into(), Value::String(request.model.clone()));
    body.insert("messages".into(), Value::Array(messages));
    if let Some(max_tokens) = request.max_tokens {
        body.insert("max_tokens".into(), json!(max_tokens));
    }
    if let Some(temperature) = request.temperature {
        body.insert("temperature".into(), json!(temperature));
    }
    if !request.tools.is_empty() {
        body.insert(
            "tools".into(),
            Value::Array(transform_tools(&request.tools, &request.model)?),
        );
    }
    if stream {
        body.insert("stream".into(), Value::Bool(true));
        // Usage arrives in a trailing chunk after finish_reason.
        body.insert("stream_options".into(), json!({"include_usage": true}));
    }

    Ok(Value::Object(body))
}
