//! Core traits and types for the marketchat provider layer
//!
//! This crate holds everything vendor-independent: the canonical streaming
//! event vocabulary, request/response types, the error taxonomy, the model
//! registry, and the system prompt compiler. Vendor drivers live in
//! `marketchat-providers`.

#![warn(missing_docs)]

pub mod error;
pub mod prompt;
pub mod provider;
pub mod registry;
pub mod types;

pub use error::{Error, Result};
pub use prompt::{
    blocks_to_string, compile, CacheBlock, CacheTtl, CompiledSystemPrompt, PromptSection,
    SystemPromptIntent, Volatility, MAX_CACHE_BLOCKS,
};
pub use provider::{ChatProvider, EventStream};
pub use registry::{ModelDescriptor, ProviderKind, ToolFormat};
pub use types::{
    message::{Message, Role},
    request::{BuildError, ChatRequest, ChatRequestBuilder},
    response::ChatResponse,
    stream::{StreamEvent, ToolArguments, Usage},
    tool::{Tool, ToolCall},
};
