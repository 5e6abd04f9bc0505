//! Canonical-to-vendor tool schema transformation
//!
//! The reverse direction (vendor tool invocation back to canonical events)
//! is handled inline by each driver's stream normalizer.

use marketchat_core::{registry, Error, Result, Tool, ToolFormat};
use serde_json::{json, Value};

/// Map canonical tool definitions into the wrapper shape the target model's
/// vendor expects. Total and order-preserving: every canonical tool maps to
/// exactly one vendor entry, none dropped or duplicated.
pub fn transform_tools(tools: &[Tool], model_id: &str) -> Result<Vec<Value>> {
    let format = registry::tool_format(model_id).ok_or_else(|| {
        Error::Validation(format!(
            "unknown model '{}': cannot determine tool format",
            model_id
        ))
    })?;

    Ok(tools
        .iter()
        .map(|tool| match format {
            ToolFormat::Flat => json!({
                "name": tool.name,
                "description": tool.description,
                "input_schema": tool.input_schema,
            }),
            ToolFormat::Nested => json!({
                "type": "function",
                "function": {
                    "name": tool.name,
                    "description": tool.description,
                    "parameters": tool.input_schema,
                },
            }),
        })
        .collect())
}
