//! Constants for driver implementations

/// Default Anthropic base URL
pub const ANTHROPIC_DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Anthropic API version header value
pub const ANTHROPIC_API_VERSION: &str = "2023-06-01";

/// Default OpenAI base URL
pub const OPENAI_DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default max tokens if the request does not specify one. The Messages API
/// requires the field.
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
