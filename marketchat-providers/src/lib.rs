//! Vendor drivers for the marketchat provider layer
//!
//! Each driver translates canonical requests into one vendor's wire format
//! and normalizes that vendor's stream into the shared event vocabulary. The
//! [`ProviderResolver`] is the usual entry point: it routes a request to the
//! driver registered for its model.

#![warn(missing_docs)]

pub mod anthropic;
pub mod base;
pub mod http;
pub mod openai;
pub mod resolver;
pub mod tools;

pub(crate) mod accumulator;
mod constants;
pub(crate) mod sse;

pub use anthropic::{Anthropic, AnthropicConfig};
pub use http::{HttpClient, ReqwestClient};
pub use openai::{OpenAi, OpenAiConfig};
pub use resolver::{ProviderResolver, ResolverConfig};
pub use tools::transform_tools;
