//! Static model registry
//!
//! Maps a model identifier to its provider, tool-schema format, and caching
//! capabilities. The table is fixed at compile time and read-only for the
//! life of the process. Unknown ids return `None` so callers can fail soft.

use std::fmt;

/// The provider serving a given model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// Messages-style streaming API
    Anthropic,
    /// OpenAI-compatible chat completions API
    OpenAi,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Anthropic => write!(f, "anthropic"),
            ProviderKind::OpenAi => write!(f, "openai"),
        }
    }
}

/// The wrapper shape a vendor expects for tool definitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolFormat {
    /// Flat `{name, description, input_schema}`
    Flat,
    /// Nested `{type: "function", function: {...}}`
    Nested,
}

/// Capabilities and routing information for one model id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelDescriptor {
    /// The model identifier as sent on the wire
    pub model_id: &'static str,
    /// Which driver serves this model
    pub provider: ProviderKind,
    /// Tool definition shape the vendor expects
    pub tool_format: ToolFormat,
    /// Whether the model accepts explicit TTL-tagged cache blocks
    pub supports_caching: bool,
    /// Whether the vendor caches on a byte-identical request prefix
    pub supports_prefix_caching: bool,
}

const MODELS: &[ModelDescriptor] = &[
    ModelDescriptor {
        model_id: "claude-sonnet-4-5",
        provider: ProviderKind::Anthropic,
        tool_format: ToolFormat::Flat,
        supports_caching: true,
        supports_prefix_caching: false,
    },
    ModelDescriptor {
        model_id: "claude-haiku-4-5",
        provider: ProviderKind::Anthropic,
        tool_format: ToolFormat::Flat,
        supports_caching: true,
        supports_prefix_caching: false,
    },
    ModelDescriptor {
        model_id: "claude-3-5-haiku-latest",
        provider: ProviderKind::Anthropic,
        tool_format: ToolFormat::Flat,
        supports_caching: true,
        supports_prefix_caching: false,
    },
    ModelDescriptor {
        model_id: "gpt-4o",
        provider: ProviderKind::OpenAi,
        tool_format: ToolFormat::Nested,
        supports_caching: false,
        supports_prefix_caching: true,
    },
    ModelDescriptor {
        model_id: "gpt-4o-mini",
        provider: ProviderKind::OpenAi,
        tool_format: ToolFormat::Nested,
        supports_caching: false,
        supports_prefix_caching: true,
    },
    ModelDescriptor {
        model_id: "gpt-4.1",
        provider: ProviderKind::OpenAi,
        tool_format: ToolFormat::Nested,
        supports_caching: false,
        supports_prefix_caching: true,
    },
    ModelDescriptor {
        model_id: "gpt-4.1-mini",
        provider: ProviderKind::OpenAi,
        tool_format: ToolFormat::Nested,
        supports_caching: false,
        supports_prefix_caching: true,
    },
];

/// Look up the full descriptor for a model id
pub fn lookup(model_id: &str) -> Option<&'static ModelDescriptor> {
    MODELS.iter().find(|m| m.model_id == model_id)
}

/// The provider serving `model_id`, if known
pub fn provider(model_id: &str) -> Option<ProviderKind> {
    lookup(model_id).map(|m| m.provider)
}

/// The tool definition shape for `model_id`, if known
pub fn tool_format(model_id: &str) -> Option<ToolFormat> {
    lookup(model_id).map(|m| m.tool_format)
}

/// Whether `model_id` accepts TTL-tagged cache blocks. Unknown ids are
/// treated as not supporting them.
pub fn supports_caching(model_id: &str) -> bool {
    lookup(model_id).is_some_and(|m| m.supports_caching)
}

/// Whether `model_id` benefits from byte-identical prefix caching
pub fn supports_prefix_caching(model_id: &str) -> bool {
    lookup(model_id).is_some_and(|m| m.supports_prefix_caching)
}

/// All registered models, for health and capability endpoints
pub fn models() -> impl Iterator<Item = &'static ModelDescriptor> {
    MODELS.iter()
}
