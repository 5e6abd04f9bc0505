//! OpenAI-compatible driver (Chat Completions)

pub mod config;
mod converter;
mod parser;
mod provider;
mod stream;

pub use config::OpenAiConfig;
pub use provider::OpenAi;
