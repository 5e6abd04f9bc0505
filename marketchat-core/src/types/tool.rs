//! Tool/function calling types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool the model may invoke, in one neutral shape independent of any
/// vendor's wrapper format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// The name of the tool
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// JSON Schema for the arguments
    pub input_schema: Value,
}

impl Tool {
    /// Create a tool definition
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// A completed tool call extracted from a non-streaming response
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    /// Unique ID for this call
    pub id: String,
    /// Name of the tool to call
    pub name: String,
    /// JSON-encoded arguments
    pub arguments: String,
}
