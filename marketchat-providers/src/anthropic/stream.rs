//! Messages API stream normalization
//!
//! The vendor's block-start/delta/stop vocabulary already closely matches the
//! canonical one, so this normalizer is near-identity: it tracks in-flight
//! tool blocks by index, accumulates their partial-JSON input, and finalizes
//! each buffer when the block stops.

use crate::accumulator::ToolCallBuffer;
use crate::base;
use crate::sse::SseNormalizer;
use marketchat_core::{Error, Result, StreamEvent, Usage};
use serde::Deserialize;
use std::collections::HashMap;

const PROVIDER: &str = "anthropic";

#[derive(Deserialize)]
#[serde(tag = "type")]
enum WireStreamEvent {
    #[serde(rename = "message_start")]
    MessageStart { message: WireMessageStart },
    #[serde(rename = "content_block_start")]
    ContentBlockStart {
        index: usize,
        content_block: WireBlockStart,
    },
    #[serde(rename = "content_block_delta")]
    ContentBlockDelta { index: usize, delta: WireDelta },
    #[serde(rename = "content_block_stop")]
    ContentBlockStop { index: usize },
    #[serde(rename = "message_delta")]
    MessageDelta { delta: WireMessageDelta },
    #[serde(rename = "message_stop")]
    MessageStop,
    #[serde(rename = "ping")]
    Ping,
    #[serde(rename = "error")]
    ErrorEvent { error: WireError },
}

#[derive(Deserialize)]
struct WireMessageStart {
    usage: Option<Usage>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum WireBlockStart {
    #[serde(rename = "text")]
    Text {},
    #[serde(rename = "tool_use")]
    ToolUse { id: String, name: String },
    #[serde(other)]
    Unknown,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum WireDelta {
    #[serde(rename = "text_delta")]
    TextDelta { text: String },
    #[serde(rename = "input_json_delta")]
    InputJsonDelta { partial_json: String },
    #[serde(other)]
    Unknown,
}

#[derive(Deserialize)]
struct WireMessageDelta {
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct WireError {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

/// Protocol state machine for one Messages API stream
#[derive(Default)]
pub(crate) struct MessagesNormalizer {
    open_calls: HashMap<usize, ToolCallBuffer>,
    usage: Usage,
    usage_seen: bool,
    message_end_emitted: bool,
}

impl MessagesNormalizer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn record_usage(&mut self, usage: Option<Usage>) {
        if let Some(usage) = usage {
            self.usage.merge(usage);
            self.usage_seen = true;
        }
    }

    fn classify_wire_error(&self, error: WireError) -> Error {
        match error.kind.as_str() {
            "authentication_error" | "permission_error" => Error::Authentication {
                provider: PROVIDER.to_string(),
                message: error.message,
            },
            "rate_limit_error" => Error::RateLimit {
                provider: PROVIDER.to_string(),
                message: error.message,
                retry_after: None,
            },
            "overloaded_error" => Error::Server {
                provider: PROVIDER.to_string(),
                status: 529,
                message: error.message,
            },
            "api_error" => Error::Server {
                provider: PROVIDER.to_string(),
                status: 500,
                message: error.message,
            },
            _ => Error::Provider {
                provider: PROVIDER.to_string(),
                status: None,
                message: error.message,
            },
        }
    }
}

impl SseNormalizer for MessagesNormalizer {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    fn handle_message(&mut self, event: &str, data: &str) -> Result<Vec<StreamEvent>> {
        // Anthropic also names the SSE event; a top-level error event may
        // arrive before any JSON body we recognize.
        if event == "error" {
            let error: WireError = serde_json::from_str::<ErrorEnvelope>(data)
                .map(|e| e.error)
                .map_err(|e| base::protocol_error(PROVIDER, format!("malformed error event: {}", e)))?;
            return Err(self.classify_wire_error(error));
        }

        let parsed: WireStreamEvent = serde_json::from_str(data)
            .map_err(|e| base::protocol_error(PROVIDER, format!("malformed stream event: {}", e)))?;

        let events = match parsed {
            WireStreamEvent::MessageStart { message } => {
                self.record_usage(message.usage);
                Vec::new()
            }
            WireStreamEvent::ContentBlockStart {
                index,
                content_block,
            } => match content_block {
                WireBlockStart::ToolUse { id, name } => {
                    self.open_calls
                        .insert(index, ToolCallBuffer::new(index, &id, &name));
                    vec![StreamEvent::ToolUseStart { index, id, name }]
                }
                WireBlockStart::Text {} | WireBlockStart::Unknown => Vec::new(),
            },
            WireStreamEvent::ContentBlockDelta { index, delta } => match delta {
                WireDelta::TextDelta { text } => vec![StreamEvent::TextDelta { text }],
                WireDelta::InputJsonDelta { partial_json } => {
                    match self.open_calls.get_mut(&index) {
                        Some(buffer) => {
                            buffer.push_arguments(&partial_json);
                            vec![StreamEvent::ToolUseDelta {
                                index,
                                fragment: partial_json,
                            }]
                        }
                        None => {
                            tracing::warn!(index, "input delta for unknown block, ignoring");
                            Vec::new()
                        }
                    }
                }
                WireDelta::Unknown => Vec::new(),
            },
            WireStreamEvent::ContentBlockStop { index } => {
                // Text block stops carry no canonical meaning; tool blocks
                // finalize their accumulated buffer here.
                match self.open_calls.remove(&index) {
                    Some(buffer) => vec![buffer.finish()],
                    None => Vec::new(),
                }
            }
            WireStreamEvent::MessageDelta { delta } => {
                self.record_usage(delta.usage);
                Vec::new()
            }
            WireStreamEvent::MessageStop => {
                if self.message_end_emitted {
                    Vec::new()
                } else {
                    self.message_end_emitted = true;
                    vec![StreamEvent::MessageEnd {
                        usage: self.usage_seen.then_some(self.usage),
                    }]
                }
            }
            WireStreamEvent::Ping => Vec::new(),
            WireStreamEvent::ErrorEvent { error } => {
                return Err(self.classify_wire_error(error));
            }
        };
        Ok(events)
    }

    fn handle_end(&mut self) -> Vec<StreamEvent> {
        // MessageEnd is tied to an explicit message_stop; an abrupt close
        // without one simply ends the sequence.
        Vec::new()
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: WireError,
}
