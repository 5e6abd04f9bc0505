//! Messages-style driver (Anthropic)

pub mod config;
mod converter;
mod parser;
mod provider;
mod stream;

pub use config::AnthropicConfig;
pub use provider::Anthropic;
