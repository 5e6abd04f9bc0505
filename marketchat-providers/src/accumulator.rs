//! In-flight tool call accumulation
//!
//! One logical tool call may span many wire chunks. The buffer is append-only
//! across delta events and parsed exactly once, at call completion; no
//! incremental JSON parsing ever happens mid-stream.

use marketchat_core::{StreamEvent, ToolArguments};

/// An in-flight tool call, keyed by its index within the message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCallBuffer {
    /// Position of this call within the message
    pub index: usize,
    /// Vendor-assigned call id
    pub id: String,
    /// Tool name; some transports fragment the name itself
    pub name: String,
    /// Raw accumulated argument text
    pub arguments: String,
}

impl ToolCallBuffer {
    /// Start accumulating a call at `index`
    pub fn new(index: usize, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            index,
            id: id.into(),
            name: name.into(),
            arguments: String::new(),
        }
    }

    /// Append a name fragment
    pub fn push_name(&mut self, fragment: &str) {
        self.name.push_str(fragment);
    }

    /// Append a raw argument fragment
    pub fn push_arguments(&mut self, fragment: &str) {
        self.arguments.push_str(fragment);
    }

    /// Finalize the call: parse the accumulated buffer and produce the
    /// terminal event for this call.
    pub fn finish(self) -> StreamEvent {
        StreamEvent::ToolUseEnd {
            index: self.index,
            id: self.id,
            name: self.name,
            arguments: ToolArguments::from_raw(&self.arguments),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accumulate_and_finish() {
        let mut buffer = ToolCallBuffer::new(0, "call_1", "get_");
        buffer.push_name("quote");
        buffer.push_arguments("{\"tick");
        buffer.push_arguments("er\":\"AAPL\"}");

        match buffer.finish() {
            StreamEvent::ToolUseEnd {
                index,
                id,
                name,
                arguments,
            } => {
                assert_eq!(index, 0);
                assert_eq!(id, "call_1");
                assert_eq!(name, "get_quote");
                assert_eq!(arguments, ToolArguments::Json(json!({"ticker": "AAPL"})));
            }
            other => panic!("expected ToolUseEnd, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_buffer_is_scoped_to_the_call() {
        let mut buffer = ToolCallBuffer::new(1, "call_2", "get_quote");
        buffer.push_arguments("{\"ticker\": ");

        match buffer.finish() {
            StreamEvent::ToolUseEnd { arguments, .. } => {
                assert_eq!(
                    arguments,
                    ToolArguments::Malformed {
                        raw: "{\"ticker\": ".into()
                    }
                );
            }
            other => panic!("expected ToolUseEnd, got {:?}", other),
        }
    }
}
