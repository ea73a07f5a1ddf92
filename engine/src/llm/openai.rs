//! OpenAI-compatible LLM Provider
//!
//! Talks to any `/chat/completions` endpoint that follows the OpenAI wire
//! format. The default configuration targets Groq. The API key is read from
//! the environment variable named in `llm.openai.api_key_env` on every call.

use super::{CompletionRequest, LLMError, LLMProvider};
use crate::config::OpenAIConfig;
use async_trait::async_trait;
use serde_json::json;

pub struct OpenAIProvider {
    config: OpenAIConfig,
    client: reqwest::Client,
}

impl OpenAIProvider {
    pub fn new(config: OpenAIConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Whether the configured key variable is set and non-empty
    pub fn has_api_key(config: &OpenAIConfig) -> bool {
        std::env::var(&config.api_key_env)
            .map(|key| !key.trim().is_empty())
            .unwrap_or(false)
    }

    fn api_key(&self) -> super::Result<String> {
        std::env::var(&self.config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                LLMError::AuthenticationFailed(format!("{} is not set", self.config.api_key_env))
            })
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn is_local(&self) -> bool {
        false
    }

    fn estimated_cost(&self, tokens: usize) -> f64 {
        // Approx $0.0002 per 1k tokens for hosted Llama models
        (tokens as f64 / 1000.0) * 0.0002
    }

    async fn check_health(&self) -> bool {
        Self::has_api_key(&self.config)
    }

    async fn complete(&self, request: &CompletionRequest) -> super::Result<String> {
        let api_key = self.api_key()?;

        let url = format!("{}/chat/completions", self.config.base_url);

        let api_messages: Vec<_> = request
            .messages
            .iter()
            .map(|msg| {
                json!({
                    "role": msg.role.to_string(),
                    "content": msg.content
                })
            })
            .collect();

        let payload = json!({
            "model": self.config.model,
            "messages": api_messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LLMError::Timeout
                } else {
                    LLMError::NetworkError(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(match status.as_u16() {
                401 | 403 => LLMError::AuthenticationFailed(text),
                429 => LLMError::RateLimitExceeded,
                500..=599 => {
                    LLMError::ProviderUnavailable(format!("API error ({}): {}", status, text))
                }
                _ => LLMError::InvalidRequest(text),
            });
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(e.to_string()))?;

        let choice = data
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .ok_or_else(|| LLMError::ParseError("No choices in response".to_string()))?;

        choice
            .get("message")
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(|content| content.to_string())
            .ok_or_else(|| LLMError::ParseError("Empty content".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_provider_properties() {
        let provider = OpenAIProvider::new(OpenAIConfig::default());

        assert_eq!(provider.name(), "openai");
        assert!(!provider.is_local());
        assert!(provider.estimated_cost(1000) > 0.0);
    }

    #[tokio::test]
    async fn test_missing_key_is_authentication_failure() {
        let config = OpenAIConfig {
            api_key_env: "GAUGE_TEST_UNSET_KEY_VARIABLE".to_string(),
            ..Default::default()
        };
        let provider = OpenAIProvider::new(config);

        assert!(!provider.check_health().await);
        let result = provider
            .complete(&CompletionRequest::prompt("hi", 0.5, 10))
            .await;
        assert!(matches!(result, Err(LLMError::AuthenticationFailed(_))));
    }
}
