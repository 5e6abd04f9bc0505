//! Chat Completions stream normalization
//!
//! One logical tool call may span many chunks: the first carries `{id,
//! function.name}`, later chunks carry only `function.arguments` fragments,
//! split at arbitrary byte boundaries by the transport. Some transports
//! fragment the name itself. The normalizer keeps one map from call index to
//! in-flight buffer per stream and finalizes every open call when a finish is
//! signaled.

use crate::accumulator::ToolCallBuffer;
use crate::base;
use crate::sse::SseNormalizer;
use marketchat_core::{Error, Result, StreamEvent, Usage};
use serde::Deserialize;
use std::collections::BTreeMap;

const PROVIDER: &str = "openai";

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<WireChoice>,
    usage: Option<Usage>,
    error: Option<WireError>,
}

#[derive(Deserialize)]
struct WireChoice {
    #[serde(default)]
    delta: WireDelta,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
struct WireDelta {
    content: Option<String>,
    tool_calls: Option<Vec<WireToolCallDelta>>,
}

#[derive(Deserialize)]
struct WireToolCallDelta {
    index: usize,
    id: Option<String>,
    function: Option<WireFunctionDelta>,
}

#[derive(Deserialize)]
struct WireFunctionDelta {
    name: Option<String>,
    arguments: Option<String>,
}

#[derive(Deserialize)]
struct WireError {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

/// Protocol state machine for one Chat Completions stream
#[derive(Default)]
pub(crate) struct ChatCompletionsNormalizer {
    open_calls: BTreeMap<usize, ToolCallBuffer>,
    usage: Option<Usage>,
    finish_seen: bool,
    message_end_emitted: bool,
}

impl ChatCompletionsNormalizer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Flush every still-open accumulator in index order, then emit the
    /// single MessageEnd. Called on `[DONE]` (or on transport end after an
    /// observed finish); MessageEnd is never emitted twice.
    fn terminate(&mut self) -> Vec<StreamEvent> {
        let mut events: Vec<StreamEvent> = std::mem::take(&mut self.open_calls)
            .into_values()
            .map(ToolCallBuffer::finish)
            .collect();
        if !self.message_end_emitted {
            self.message_end_emitted = true;
            events.push(StreamEvent::MessageEnd { usage: self.usage });
        }
        events
    }

    fn handle_tool_call_delta(
        &mut self,
        tc: WireToolCallDelta,
        events: &mut Vec<StreamEvent>,
    ) {
        let index = tc.index;
        let (name_fragment, argument_fragment) = match tc.function {
            Some(f) => (f.name, f.arguments),
            None => (None, None),
        };

        match tc.id.filter(|id| !id.is_empty()) {
            // A chunk carrying an id opens a new accumulator; the name may
            // still be partial.
            Some(id) if !self.open_calls.contains_key(&index) => {
                let name = name_fragment.unwrap_or_default();
                self.open_calls
                    .insert(index, ToolCallBuffer::new(index, &id, &name));
                events.push(StreamEvent::ToolUseStart { index, id, name });
            }
            _ => {
                let buffer = self.open_calls.entry(index).or_insert_with(|| {
                    // Arguments with no preceding id: fail soft and keep the
                    // stream alive.
                    tracing::warn!(index, "tool call fragment for unopened call");
                    ToolCallBuffer::new(index, "", "")
                });
                if let Some(name) = name_fragment {
                    buffer.push_name(&name);
                }
            }
        }

        if let Some(fragment) = argument_fragment {
            if !fragment.is_empty() {
                if let Some(buffer) = self.open_calls.get_mut(&index) {
                    buffer.push_arguments(&fragment);
                }
                events.push(StreamEvent::ToolUseDelta { index, fragment });
            }
        }
    }
}

impl SseNormalizer for ChatCompletionsNormalizer {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    fn handle_message(&mut self, _event: &str, data: &str) -> Result<Vec<StreamEvent>> {
        if data.trim() == "[DONE]" {
            return Ok(self.terminate());
        }
        if self.message_end_emitted {
            // The message already ended; nothing after it may reopen state.
            return Ok(Vec::new());
        }

        let chunk: StreamChunk = serde_json::from_str(data)
            .map_err(|e| base::protocol_error(PROVIDER, format!("malformed chunk: {}", e)))?;

        if let Some(error) = chunk.error {
            let message = match error.code {
                Some(code) => format!("{} ({})", error.message, code),
                None => error.message,
            };
            return Err(Error::Provider {
                provider: PROVIDER.to_string(),
                status: None,
                message,
            });
        }

        // Usage arrives in a trailing, choice-less chunk when
        // stream_options.include_usage is set.
        if let Some(usage) = chunk.usage {
            let merged = match self.usage {
                Some(mut existing) => {
                    existing.merge(usage);
                    existing
                }
                None => usage,
            };
            self.usage = Some(merged);
        }

        let mut events = Vec::new();
        if let Some(choice) = chunk.choices.into_iter().next() {
            if let Some(text) = choice.delta.content {
                if !text.is_empty() {
                    events.push(StreamEvent::TextDelta { text });
                }
            }
            for tc in choice.delta.tool_calls.unwrap_or_default() {
                self.handle_tool_call_delta(tc, &mut events);
            }
            if choice.finish_reason.is_some() {
                self.finish_seen = true;
                // Every still-open call ends here; MessageEnd itself waits
                // for the explicit [DONE] terminator.
                let mut flushed: Vec<StreamEvent> = std::mem::take(&mut self.open_calls)
                    .into_values()
                    .map(ToolCallBuffer::finish)
                    .collect();
                events.append(&mut flushed);
            }
        }
        Ok(events)
    }

    fn handle_end(&mut self) -> Vec<StreamEvent> {
        // Transport ended without [DONE]. Only a stream whose finish was
        // observed still owes its MessageEnd.
        if self.finish_seen && !self.message_end_emitted {
            self.terminate()
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketchat_core::ToolArguments;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn feed(n: &mut ChatCompletionsNormalizer, data: &str) -> Vec<StreamEvent> {
        n.handle_message("message", data).unwrap()
    }

    fn tool_start_chunk(index: usize, id: &str, name: &str) -> String {
        json!({"choices": [{"delta": {"tool_calls": [
            {"index": index, "id": id, "type": "function",
             "function": {"name": name, "arguments": ""}}]}}]})
        .to_string()
    }

    fn tool_args_chunk(index: usize, fragment: &str) -> String {
        json!({"choices": [{"delta": {"tool_calls": [
            {"index": index, "function": {"arguments": fragment}}]}}]})
        .to_string()
    }

    fn finish_chunk(reason: &str) -> String {
        json!({"choices": [{"delta": {}, "finish_reason": reason}]}).to_string()
    }

    #[test]
    fn test_text_deltas() {
        let mut n = ChatCompletionsNormalizer::new();
        let events = feed(
            &mut n,
            &json!({"choices": [{"delta": {"content": "AAPL is "}}]}).to_string(),
        );
        assert_eq!(
            events,
            vec![StreamEvent::TextDelta {
                text: "AAPL is ".into()
            }]
        );
    }

    #[test]
    fn test_end_to_end_tool_call_scenario() {
        // Two tools offered, the vendor streams one call across three
        // argument-bearing chunks, then finishes with no text.
        let mut n = ChatCompletionsNormalizer::new();
        let mut all = Vec::new();
        all.extend(feed(&mut n, &tool_start_chunk(0, "call_1", "get_quote")));
        all.extend(feed(&mut n, &tool_args_chunk(0, "{\"ticker\"")));
        all.extend(feed(&mut n, &tool_args_chunk(0, ":\"AAPL\"}")));
        all.extend(feed(&mut n, &finish_chunk("tool_calls")));
        all.extend(feed(&mut n, "[DONE]"));

        let kinds: Vec<&str> = all
            .iter()
            .map(|e| match e {
                StreamEvent::TextDelta { .. } => "text",
                StreamEvent::ToolUseStart { .. } => "start",
                StreamEvent::ToolUseDelta { .. } => "delta",
                StreamEvent::ToolUseEnd { .. } => "end",
                StreamEvent::MessageEnd { .. } => "message_end",
                _ => "other",
            })
            .collect();
        assert_eq!(kinds, vec!["start", "delta", "delta", "end", "message_end"]);

        match &all[3] {
            StreamEvent::ToolUseEnd {
                id,
                name,
                arguments,
                ..
            } => {
                assert_eq!(id, "call_1");
                assert_eq!(name, "get_quote");
                assert_eq!(arguments, &ToolArguments::Json(json!({"ticker": "AAPL"})));
            }
            other => panic!("expected ToolUseEnd, got {:?}", other),
        }
    }

    #[test]
    fn test_fragmentation_independence() {
        let arguments = r#"{"ticker":"AAPL","window":"5d","fields":["open","close"]}"#;

        let final_payload = |piece_count: usize| -> StreamEvent {
            let mut n = ChatCompletionsNormalizer::new();
            feed(&mut n, &tool_start_chunk(0, "call_1", "get_quote"));
            let bytes = arguments.as_bytes();
            let chunk_size = bytes.len().div_ceil(piece_count);
            for piece in arguments
                .as_bytes()
                .chunks(chunk_size)
                .map(|c| std::str::from_utf8(c).unwrap())
            {
                feed(&mut n, &tool_args_chunk(0, piece));
            }
            let mut events = feed(&mut n, &finish_chunk("tool_calls"));
            events.remove(0)
        };

        let reference = final_payload(1);
        for pieces in [2, 10, arguments.len()] {
            assert_eq!(final_payload(pieces), reference, "{} pieces", pieces);
        }
        match reference {
            StreamEvent::ToolUseEnd { arguments: args, .. } => {
                assert_eq!(
                    args,
                    ToolArguments::Json(serde_json::from_str(arguments).unwrap())
                );
            }
            other => panic!("expected ToolUseEnd, got {:?}", other),
        }
    }

    #[test]
    fn test_fragmented_name_is_reassembled() {
        let mut n = ChatCompletionsNormalizer::new();
        feed(&mut n, &tool_start_chunk(0, "call_1", "get_"));
        feed(
            &mut n,
            &json!({"choices": [{"delta": {"tool_calls": [
                {"index": 0, "function": {"name": "quote"}}]}}]})
            .to_string(),
        );
        let events = feed(&mut n, &finish_chunk("tool_calls"));
        match &events[0] {
            StreamEvent::ToolUseEnd { name, .. } => assert_eq!(name, "get_quote"),
            other => panic!("expected ToolUseEnd, got {:?}", other),
        }
    }

    #[test]
    fn test_interleaved_calls_keep_separate_buffers() {
        let mut n = ChatCompletionsNormalizer::new();
        feed(&mut n, &tool_start_chunk(0, "call_1", "get_quote"));
        feed(&mut n, &tool_start_chunk(1, "call_2", "portfolio_positions"));
        feed(&mut n, &tool_args_chunk(1, "{}"));
        feed(&mut n, &tool_args_chunk(0, "{\"ticker\":\"AAPL\"}"));
        let events = feed(&mut n, &finish_chunk("tool_calls"));

        assert_eq!(events.len(), 2);
        match (&events[0], &events[1]) {
            (
                StreamEvent::ToolUseEnd {
                    index: 0,
                    id: id0,
                    arguments: args0,
                    ..
                },
                StreamEvent::ToolUseEnd { index: 1, id: id1, .. },
            ) => {
                assert_eq!(id0, "call_1");
                assert_eq!(id1, "call_2");
                assert_eq!(args0, &ToolArguments::Json(json!({"ticker": "AAPL"})));
            }
            other => panic!("unexpected events {:?}", other),
        }
    }

    #[test]
    fn test_usage_from_trailing_chunk() {
        let mut n = ChatCompletionsNormalizer::new();
        feed(
            &mut n,
            &json!({"choices": [{"delta": {"content": "hi"}}]}).to_string(),
        );
        feed(&mut n, &finish_chunk("stop"));
        // stream_options.include_usage delivers a choice-less usage chunk.
        feed(
            &mut n,
            &json!({"choices": [],
                    "usage": {"prompt_tokens": 120, "completion_tokens": 45,
                              "total_tokens": 165}})
            .to_string(),
        );
        let events = feed(&mut n, "[DONE]");
        assert_eq!(
            events,
            vec![StreamEvent::MessageEnd {
                usage: Some(Usage {
                    input_tokens: 120,
                    output_tokens: 45
                })
            }]
        );
    }

    #[test]
    fn test_message_end_emitted_exactly_once() {
        let mut n = ChatCompletionsNormalizer::new();
        feed(&mut n, &finish_chunk("stop"));
        let events = feed(&mut n, "[DONE]");
        assert_eq!(events.len(), 1);
        // Neither a duplicate [DONE] nor the transport end re-emits it.
        assert!(feed(&mut n, "[DONE]").is_empty());
        assert!(n.handle_end().is_empty());
    }

    #[test]
    fn test_transport_end_after_finish_still_emits_message_end() {
        let mut n = ChatCompletionsNormalizer::new();
        feed(&mut n, &finish_chunk("stop"));
        let events = n.handle_end();
        assert_eq!(events, vec![StreamEvent::MessageEnd { usage: None }]);
        // Without an observed finish, an abrupt end owes nothing.
        let mut n = ChatCompletionsNormalizer::new();
        feed(
            &mut n,
            &json!({"choices": [{"delta": {"content": "partial"}}]}).to_string(),
        );
        assert!(n.handle_end().is_empty());
    }

    #[test]
    fn test_error_chunk_terminates() {
        let mut n = ChatCompletionsNormalizer::new();
        let err = n
            .handle_message(
                "message",
                &json!({"error": {"message": "The server had an error", "code": "server_error"}})
                    .to_string(),
            )
            .unwrap_err();
        assert_eq!(err.kind(), "provider_error");
        assert!(err.to_string().contains("The server had an error"));
    }

    #[test]
    fn test_malformed_chunk_is_protocol_error() {
        let mut n = ChatCompletionsNormalizer::new();
        let err = n.handle_message("message", "{not json").unwrap_err();
        assert_eq!(err.kind(), "protocol_error");
    }
}
