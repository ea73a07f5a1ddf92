//! LLM Router
//!
//! Holds every configured provider, ranks them (configured default first, then
//! cheaper before more expensive) and fails over down the ranking until one
//! provider answers within its timeout.

use super::ollama::OllamaProvider;
use super::openai::OpenAIProvider;
use super::{CompletionRequest, LLMError, LLMProvider};
use crate::config::LLMConfig;
use std::sync::Arc;
use std::time::Duration;

/// LLM Router that fails over between providers
pub struct LLMRouter {
    /// Available LLM providers
    providers: Vec<Box<dyn LLMProvider>>,

    /// LLM configuration
    config: Arc<LLMConfig>,
}

impl LLMRouter {
    /// Create a new LLM router
    ///
    /// # Arguments
    /// * `providers` - List of available LLM providers
    /// * `config` - LLM configuration
    pub fn new(providers: Vec<Box<dyn LLMProvider>>, config: Arc<LLMConfig>) -> Self {
        Self { providers, config }
    }

    /// Build the router from configuration.
    ///
    /// Ollama is always registered (it needs no key). The OpenAI-compatible
    /// provider is registered only when its API key variable is set.
    pub fn from_config(config: &LLMConfig) -> Self {
        let mut providers: Vec<Box<dyn LLMProvider>> = vec![Box::new(OllamaProvider::new(
            config.ollama.base_url.clone(),
            config.ollama.model.clone(),
        ))];

        if OpenAIProvider::has_api_key(&config.openai) {
            providers.push(Box::new(OpenAIProvider::new(config.openai.clone())));
        } else {
            tracing::info!(
                "{} not set, OpenAI-compatible provider disabled",
                config.openai.api_key_env
            );
        }

        Self::new(providers, Arc::new(config.clone()))
    }

    /// Names of the registered providers, in registration order
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Rank providers for a request of the given size
    ///
    /// Ranking:
    /// 1. The configured default provider first
    /// 2. Cheaper providers before more expensive ones
    ///
    /// Ties keep registration order.
    pub fn rank_providers(&self, estimated_tokens: usize) -> Vec<&dyn LLMProvider> {
        let mut providers: Vec<&dyn LLMProvider> =
            self.providers.iter().map(|b| b.as_ref()).collect();

        let default_provider = &self.config.default_provider;

        providers.sort_by(|a, b| {
            let score = |p: &dyn LLMProvider| {
                let mut score = 0.0_f64;
                if p.name() == default_provider {
                    score += 200.0;
                }
                score - p.estimated_cost(estimated_tokens) * 1000.0
            };

            score(*b)
                .partial_cmp(&score(*a))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        providers
    }

    /// Call LLM providers with automatic failover
    ///
    /// Tries providers in ranked order, each bounded by
    /// `provider_timeout_secs`, and returns the first success together with
    /// the name of the provider that produced it.
    pub async fn complete(&self, request: &CompletionRequest) -> super::Result<(String, String)> {
        if self.providers.is_empty() {
            return Err(LLMError::ProviderUnavailable(
                "No LLM providers configured".to_string(),
            ));
        }

        // ~4 characters per token
        let estimated_tokens = request.total_chars() / 4 + request.max_tokens as usize;
        let timeout_secs = self.config.provider_timeout_secs;

        for provider in self.rank_providers(estimated_tokens) {
            tracing::debug!(
                "Attempting provider: {} (timeout: {}s)",
                provider.name(),
                timeout_secs
            );

            let result =
                tokio::time::timeout(Duration::from_secs(timeout_secs), provider.complete(request))
                    .await;

            match result {
                Ok(Ok(text)) => {
                    tracing::debug!("Provider {} succeeded", provider.name());
                    return Ok((text, provider.name().to_string()));
                }
                Ok(Err(e)) => {
                    tracing::warn!("Provider {} failed: {}", provider.name(), e);
                }
                Err(_) => {
                    tracing::warn!(
                        "Provider {} timed out after {}s",
                        provider.name(),
                        timeout_secs
                    );
                }
            }
        }

        tracing::error!("All LLM providers exhausted");
        Err(LLMError::ProviderUnavailable(
            "All LLM providers failed".to_string(),
        ))
    }

    /// Check the health of all registered providers
    /// Returns a list of (provider_name, is_healthy)
    pub async fn check_health(&self) -> Vec<(&str, bool)> {
        let mut results = Vec::new();
        for provider in &self.providers {
            let is_healthy = provider.check_health().await;
            results.push((provider.name(), is_healthy));
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    enum Behaviour {
        Answer(&'static str),
        Fail,
        Hang,
    }

    // Mock provider for testing
    struct MockProvider {
        name: String,
        cost_per_1k: f64,
        behaviour: Behaviour,
    }

    impl MockProvider {
        fn new(name: &str, cost_per_1k: f64, behaviour: Behaviour) -> Box<dyn LLMProvider> {
            Box::new(Self {
                name: name.to_string(),
                cost_per_1k,
                behaviour,
            })
        }
    }

    #[async_trait]
    impl LLMProvider for MockProvider {
        fn name(&self) -> &str {
            &self.name
        }

        fn is_local(&self) -> bool {
            self.cost_per_1k == 0.0
        }

        fn estimated_cost(&self, tokens: usize) -> f64 {
            (tokens as f64 / 1000.0) * self.cost_per_1k
        }

        async fn complete(&self, _request: &CompletionRequest) -> super::super::Result<String> {
            match self.behaviour {
                Behaviour::Answer(text) => Ok(text.to_string()),
                Behaviour::Fail => Err(LLMError::ProviderUnavailable("down".to_string())),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(String::new())
                }
            }
        }
    }

    fn create_test_config(default_provider: &str) -> Arc<LLMConfig> {
        Arc::new(LLMConfig {
            default_provider: default_provider.to_string(),
            provider_timeout_secs: 1,
            ..Default::default()
        })
    }

    #[test]
    fn test_rank_providers_default_first() {
        let router = LLMRouter::new(
            vec![
                MockProvider::new("ollama", 0.0, Behaviour::Fail),
                MockProvider::new("openai", 0.002, Behaviour::Fail),
            ],
            create_test_config("openai"),
        );

        let ranked = router.rank_providers(1000);
        assert_eq!(ranked[0].name(), "openai");
        assert_eq!(ranked[1].name(), "ollama");
    }

    #[test]
    fn test_rank_providers_consider_cost() {
        let router = LLMRouter::new(
            vec![
                MockProvider::new("expensive", 0.010, Behaviour::Fail),
                MockProvider::new("cheap", 0.001, Behaviour::Fail),
                MockProvider::new("medium", 0.005, Behaviour::Fail),
            ],
            create_test_config("ollama"),
        );

        let ranked = router.rank_providers(1000);
        assert_eq!(ranked[0].name(), "cheap");
        assert_eq!(ranked[1].name(), "medium");
        assert_eq!(ranked[2].name(), "expensive");
    }

    #[tokio::test]
    async fn test_failover_to_second_provider() {
        let router = LLMRouter::new(
            vec![
                MockProvider::new("openai", 0.002, Behaviour::Fail),
                MockProvider::new("ollama", 0.0, Behaviour::Answer("backup answer")),
            ],
            create_test_config("openai"),
        );

        let (text, provider) = router
            .complete(&CompletionRequest::prompt("hello", 0.5, 50))
            .await
            .unwrap();
        assert_eq!(text, "backup answer");
        assert_eq!(provider, "ollama");
    }

    #[tokio::test]
    async fn test_hanging_provider_times_out() {
        let router = LLMRouter::new(
            vec![
                MockProvider::new("openai", 0.002, Behaviour::Hang),
                MockProvider::new("ollama", 0.0, Behaviour::Answer("local answer")),
            ],
            create_test_config("openai"),
        );

        let (text, _) = router
            .complete(&CompletionRequest::prompt("hello", 0.5, 50))
            .await
            .unwrap();
        assert_eq!(text, "local answer");
    }

    #[tokio::test]
    async fn test_all_providers_fail() {
        let router = LLMRouter::new(
            vec![MockProvider::new("ollama", 0.0, Behaviour::Fail)],
            create_test_config("ollama"),
        );

        let err = router
            .complete(&CompletionRequest::prompt("hello", 0.5, 50))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("All LLM providers failed"));
    }

    #[tokio::test]
    async fn test_no_providers() {
        let router = LLMRouter::new(vec![], create_test_config("ollama"));
        let err = router
            .complete(&CompletionRequest::prompt("hello", 0.5, 50))
            .await
            .unwrap_err();
        assert!(matches!(err, LLMError::ProviderUnavailable(_)));
    }
}
