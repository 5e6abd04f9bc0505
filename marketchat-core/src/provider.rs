//! The shared provider contract

use crate::error::Result;
use crate::types::request::ChatRequest;
use crate::types::response::ChatResponse;
use crate::types::stream::StreamEvent;
use async_trait::async_trait;
use std::pin::Pin;

/// A pull-based sequence of canonical events
///
/// Consumed incrementally by the caller; dropping the stream aborts the
/// underlying vendor connection. A slow consumer simply delays the next
/// upstream read, so no unbounded buffering occurs.
pub type EventStream = Pin<Box<dyn futures_core::Stream<Item = Result<StreamEvent>> + Send>>;

/// The contract every driver implements
///
/// Drivers form a small closed set behind this one interface, selected once
/// through the model registry. New vendors are added as new implementations,
/// never by branching on model ids at call sites.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Stable provider name (e.g. "anthropic", "openai")
    fn name(&self) -> &'static str;

    /// Whether credentials are present for this driver
    fn is_configured(&self) -> bool;

    /// Send a request and get the complete normalized response
    async fn create_completion(&self, request: ChatRequest) -> Result<ChatResponse>;

    /// Send a request and get a canonical event stream
    async fn create_stream(&self, request: ChatRequest) -> Result<EventStream>;
}
