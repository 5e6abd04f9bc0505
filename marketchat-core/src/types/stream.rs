//! Canonical streaming events
//!
//! [`StreamEvent`] is the only shape that ever crosses the public boundary;
//! callers stay oblivious to which vendor served the request. Streams yield
//! `Result<StreamEvent, Error>` items: a failure surfaces as at most one
//! trailing `Err` followed by stream end, never by retracting events that
//! were already yielded.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Normalized token usage, regardless of vendor field naming
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens in the prompt
    #[serde(default, alias = "prompt_tokens")]
    pub input_tokens: u32,
    /// Tokens in the completion
    #[serde(default, alias = "completion_tokens")]
    pub output_tokens: u32,
}

impl Usage {
    /// Fold another usage report into this one. Vendors report counters
    /// cumulatively and sometimes split across events (input at message
    /// start, output at message end), so each field takes the larger value.
    pub fn merge(&mut self, other: Usage) {
        self.input_tokens = self.input_tokens.max(other.input_tokens);
        self.output_tokens = self.output_tokens.max(other.output_tokens);
    }
}

/// Finalized tool arguments carried by [`StreamEvent::ToolUseEnd`]
///
/// Argument fragments are accumulated raw and parsed exactly once, at call
/// completion. A parse failure is scoped to that call: the raw buffer is
/// surfaced as [`ToolArguments::Malformed`] and the stream continues.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolArguments {
    /// The accumulated buffer parsed as JSON
    Json(Value),
    /// The buffer was not valid JSON at finalize time
    Malformed {
        /// The raw accumulated text
        raw: String,
    },
}

impl ToolArguments {
    /// Parse an accumulated argument buffer. An empty buffer finalizes to an
    /// empty object, which is how vendors encode a no-argument call.
    pub fn from_raw(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return ToolArguments::Json(Value::Object(Default::default()));
        }
        match serde_json::from_str(raw) {
            Ok(value) => ToolArguments::Json(value),
            Err(_) => ToolArguments::Malformed {
                raw: raw.to_string(),
            },
        }
    }
}

/// One provider-independent piece of streamed model output
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum StreamEvent {
    /// A fragment of assistant text
    TextDelta {
        /// The text fragment
        text: String,
    },
    /// The model started a tool call
    ToolUseStart {
        /// Position of this call within the message
        index: usize,
        /// Vendor-assigned call id (may still be partial)
        id: String,
        /// Tool name (may still be partial)
        name: String,
    },
    /// A raw, unparsed fragment of tool-call arguments. Callers must not
    /// attempt to parse it; the complete payload arrives in `ToolUseEnd`.
    ToolUseDelta {
        /// Position of this call within the message
        index: usize,
        /// The raw argument fragment
        fragment: String,
    },
    /// A tool call completed; the accumulated buffer has been finalized
    ToolUseEnd {
        /// Position of this call within the message
        index: usize,
        /// Vendor-assigned call id
        id: String,
        /// Full tool name
        name: String,
        /// Parsed-or-raw argument payload
        arguments: ToolArguments,
    },
    /// The message finished. Emitted at most once per stream.
    MessageEnd {
        /// Normalized usage, when the vendor reported it
        usage: Option<Usage>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_usage_normalizes_openai_field_names() {
        let usage: Usage =
            serde_json::from_value(json!({"prompt_tokens": 120, "completion_tokens": 45}))
                .unwrap();
        assert_eq!(
            usage,
            Usage {
                input_tokens: 120,
                output_tokens: 45
            }
        );
    }

    #[test]
    fn test_usage_normalizes_messages_field_names() {
        let usage: Usage =
            serde_json::from_value(json!({"input_tokens": 120, "output_tokens": 45})).unwrap();
        assert_eq!(
            usage,
            Usage {
                input_tokens: 120,
                output_tokens: 45
            }
        );
    }

    #[test]
    fn test_usage_ignores_extra_vendor_fields() {
        let usage: Usage = serde_json::from_value(json!({
            "prompt_tokens": 7,
            "completion_tokens": 3,
            "total_tokens": 10,
            "cache_read_input_tokens": 5
        }))
        .unwrap();
        assert_eq!(usage.input_tokens, 7);
        assert_eq!(usage.output_tokens, 3);
    }

    #[test]
    fn test_usage_merge_takes_field_wise_max() {
        let mut usage = Usage {
            input_tokens: 120,
            output_tokens: 0,
        };
        usage.merge(Usage {
            input_tokens: 0,
            output_tokens: 45,
        });
        assert_eq!(usage.input_tokens, 120);
        assert_eq!(usage.output_tokens, 45);
    }

    #[test]
    fn test_tool_arguments_from_raw() {
        assert_eq!(
            ToolArguments::from_raw("{\"ticker\":\"AAPL\"}"),
            ToolArguments::Json(json!({"ticker": "AAPL"}))
        );
        assert_eq!(
            ToolArguments::from_raw(""),
            ToolArguments::Json(json!({}))
        );
        assert_eq!(
            ToolArguments::from_raw("{\"ticker\":"),
            ToolArguments::Malformed {
                raw: "{\"ticker\":".into()
            }
        );
    }
}
