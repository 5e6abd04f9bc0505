//! Conversion from canonical requests to Messages API wire format

use crate::constants::DEFAULT_MAX_TOKENS;
use crate::tools::transform_tools;
use marketchat_core::{CacheTtl, ChatRequest, CompiledSystemPrompt, Result, Role};
use serde_json::{json, Map, Value};

/// Build the Messages API request body.
///
/// The compiled cache-block prompt passes through unmodified: this is the
/// only driver with genuine cache-block support.
pub fn to_messages_request(request: &ChatRequest, stream: bool) -> Result<Value> {
    let mut system = request.system.as_ref().and_then(system_value);
    let mut messages: Vec<Value> = Vec::new();

    for msg in &request.messages {
        match msg.role {
            // The Messages API takes system instructions as a separate
            // field; a system message in the list is folded in when no
            // compiled prompt was supplied.
            Role::System => {
                if system.is_none() && !msg.content.is_empty() {
                    system = Some(Value::String(msg.content.clone()));
                }
            }
            Role::User => messages.push(json!({"role": "user", "content": msg.content})),
            Role::Assistant => {
                messages.push(json!({"role": "assistant", "content": msg.content}))
            }
            Role::Tool => {
                let tool_use_id = msg.tool_call_id.clone().unwrap_or_default();
                messages.push(json!({
                    "role": "user",
                    "content": [{
                        "type": "tool_result",
                        "tool_use_id": tool_use_id,
                        "content": msg.content,
                    }],
                }));
            }
            // `Role` is non-exhaustive; no other variants exist in this workspace.
            _ => unreachable!(),
        }
    }

    let mut body = Map::new();
    body.insert("model".into(), Value::String(request.model.clone()));
    body.insert("messages".into(), Value::Array(messages));
    body.insert(
        "max_tokens".into(),
        json!(request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)),
    );
    if let Some(temperature) = request.temperature {
        body.insert("temperature".into(), json!(temperature));
    }
    if let Some(system) = system {
        body.insert("system".into(), system);
    }
    if !request.tools.is_empty() {
        body.insert(
            "tools".into(),
            Value::Array(transform_tools(&request.tools, &request.model)?),
        );
    }
    if stream {
        body.insert("stream".into(), Value::Bool(true));
    }

    Ok(Value::Object(body))
}

/// Serialize a compiled prompt as the Messages `system` field: a plain
/// string, or an array of text blocks carrying `cache_control` markers.
/// Returns `None` for an empty prompt so the field is omitted entirely.
fn system_value(prompt: &CompiledSystemPrompt) -> Option<Value> {
    match prompt {
        CompiledSystemPrompt::Text(text) => {
            (!text.is_empty()).then(|| Value::String(text.clone()))
        }
        CompiledSystemPrompt::Blocks(blocks) => {
            if blocks.is_empty() {
                return None;
            }
            Some(Value::Array(
                blocks
                    .iter()
                    .map(|block| {
                        let mut obj = json!({"type": "text", "text": block.text});
                        match block.ttl {
                            CacheTtl::OneHour => {
                                obj["cache_control"] =
                                    json!({"type": "ephemeral", "ttl": "1h"});
                            }
                            CacheTtl::FiveMinutes => {
                                obj["cache_control"] = json!({"type": "ephemeral"});
                            }
                            CacheTtl::NoCache => {}
                        }
                        obj
                    })
                    .collect(),
            ))
        }
    }
}
