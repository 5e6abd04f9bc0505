//! Model-to-driver resolution and the unified entry points
//!
//! The resolver owns driver construction: callers hand it a request whose
//! `model` field names a registered model, and it routes to a cached driver
//! instance. Drivers are cached per effective configuration so repeated
//! requests reuse one HTTP connection pool.

use crate::anthropic::{Anthropic, AnthropicConfig};
use crate::http::{HttpClient, ReqwestClient};
use crate::openai::{OpenAi, OpenAiConfig};
use async_trait::async_trait;
use marketchat_core::{
    registry, ChatProvider, ChatRequest, ChatResponse, Error, EventStream, ProviderKind, Result,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Per-provider configuration consumed by the resolver
#[derive(Debug, Clone, Default)]
pub struct ResolverConfig {
    /// Messages-style driver settings
    pub anthropic: AnthropicConfig,
    /// OpenAI-compatible driver settings
    pub openai: OpenAiConfig,
}

impl ResolverConfig {
    /// Read both driver configurations from the environment
    pub fn from_env() -> Self {
        Self {
            anthropic: AnthropicConfig::from_env(),
            openai: OpenAiConfig::from_env(),
        }
    }
}

/// Cache key: a driver instance is reusable only while its effective
/// credentials and endpoint are unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DriverKey {
    provider: ProviderKind,
    api_key: String,
    base_url: String,
}

/// Routes requests to the driver registered for their model
pub struct ProviderResolver {
    config: ResolverConfig,
    client: Arc<dyn HttpClient>,
    cache: Mutex<HashMap<DriverKey, Arc<dyn ChatProvider>>>,
}

impl ProviderResolver {
    /// Create a resolver over the given configuration
    pub fn new(config: ResolverConfig) -> Result<Self> {
        let client = Arc::new(ReqwestClient::new()?);
        Ok(Self::with_client(config, client))
    }

    /// Create a resolver reading configuration from the environment
    pub fn from_env() -> Result<Self> {
        Self::new(ResolverConfig::from_env())
    }

    /// Create a resolver with an injected transport, for tests
    pub fn with_client(config: ResolverConfig, client: Arc<dyn HttpClient>) -> Self {
        Self {
            config,
            client,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn key_for(&self, provider: ProviderKind) -> DriverKey {
        match provider {
            ProviderKind::Anthropic => DriverKey {
                provider,
                api_key: self.config.anthropic.api_key.clone(),
                base_url: self.config.anthropic.base_url.clone(),
            },
            ProviderKind::OpenAi => DriverKey {
                provider,
                api_key: self.config.openai.api_key.clone(),
                base_url: self.config.openai.base_url.clone(),
            },
        }
    }

    fn build(&self, provider: ProviderKind) -> Arc<dyn ChatProvider> {
        match provider {
            ProviderKind::Anthropic => Arc::new(Anthropic::new(
                self.config.anthropic.clone(),
                Arc::clone(&self.client),
            )),
            ProviderKind::OpenAi => Arc::new(OpenAi::new(
                self.config.openai.clone(),
                Arc::clone(&self.client),
            )),
        }
    }

    /// Resolve `model_id` to its driver, constructing and caching it on first
    /// use. Unknown model ids fail with a validation error before any network
    /// activity.
    pub fn resolve(&self, model_id: &str) -> Result<Arc<dyn ChatProvider>> {
        let provider = registry::provider(model_id)
            .ok_or_else(|| Error::Validation(format!("unknown model: {}", model_id)))?;

        let key = self.key_for(provider);
        let mut cache = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(driver) = cache.get(&key) {
            return Ok(Arc::clone(driver));
        }

        tracing::debug!(%provider, model = model_id, "constructing driver");
        let driver = self.build(provider);
        cache.insert(key, Arc::clone(&driver));
        Ok(driver)
    }

    /// Whether the driver for `provider` has credentials
    pub fn is_provider_configured(&self, provider: ProviderKind) -> bool {
        match provider {
            ProviderKind::Anthropic => self.config.anthropic.is_configured(),
            ProviderKind::OpenAi => self.config.openai.is_configured(),
        }
    }
}

#[async_trait]
impl ChatProvider for ProviderResolver {
    fn name(&self) -> &'static str {
        "resolver"
    }

    fn is_configured(&self) -> bool {
        registry::models()
            .any(|m| self.is_provider_configured(m.provider))
    }

    async fn create_completion(&self, request: ChatRequest) -> Result<ChatResponse> {
        self.resolve(&request.model)?.create_completion(request).await
    }

    /// Open a normalized stream for the request's model. The canonical event
    /// vocabulary is identical regardless of which driver serves it.
    async fn create_stream(&self, request: ChatRequest) -> Result<EventStream> {
        self.resolve(&request.model)?.create_stream(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> ProviderResolver {
        let mut config = ResolverConfig::default();
        config.anthropic.api_key = "sk-ant-test".into();
        config.openai.api_key = "sk-test".into();
        ProviderResolver::with_client(
            config,
            Arc::new(ReqwestClient::new().unwrap()),
        )
    }

    #[test]
    fn test_every_registered_model_resolves() {
        let resolver = resolver();
        for desc in registry::models() {
            let driver = resolver.resolve(desc.model_id).unwrap();
            assert_eq!(driver.name(), desc.provider.to_string());
        }
    }

    #[test]
    fn test_unknown_model_is_validation_error() {
        let err = match resolver().resolve("gpt-99-ultra") {
            Ok(_) => panic!("expected error"),
            Err(err) => err,
        };
        assert_eq!(err.kind(), "validation_error");
        assert!(err.to_string().contains("gpt-99-ultra"));
    }

    #[test]
    fn test_same_provider_reuses_cached_driver() {
        let resolver = resolver();
        let a = resolver.resolve("gpt-4o").unwrap();
        let b = resolver.resolve("gpt-4o-mini").unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let c = resolver.resolve("claude-sonnet-4-5").unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn test_configured_flags() {
        let resolver = resolver();
        assert!(resolver.is_provider_configured(ProviderKind::Anthropic));
        assert!(resolver.is_configured());

        let empty = ProviderResolver::with_client(
            ResolverConfig::default(),
            Arc::new(ReqwestClient::new().unwrap()),
        );
        assert!(!empty.is_provider_configured(ProviderKind::OpenAi));
        assert!(!empty.is_configured());
    }
}
