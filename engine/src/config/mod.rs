//! Configuration management
//!
//! This module handles loading, validation, and management of the Gauge configuration.
//! Configuration is stored in TOML format at ~/.gauge/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Log level
//! - **llm**: LLM provider settings and preferences
//! - **interview**: Multiple-choice target and collaborator timeout
//! - **sessions**: Session store capacity and idle expiry
//! - **server**: HTTP API bind address and CORS origins
//!
//! Every section is optional in the file; missing values take their defaults.
//!
//! # Examples
//!
//! ```no_run
//! use gauge_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load configuration from default location
//! let config = Config::load_or_create()?;
//!
//! // Access configuration values
//! println!("Default provider: {}", config.llm.default_provider);
//! println!("MCQ target: {}", config.interview.target_mcq_count);
//! # Ok(())
//! # }
//! ```

use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Providers the router knows how to build
pub const KNOWN_PROVIDERS: [&str; 2] = ["ollama", "openai"];

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Core engine settings
    #[serde(default)]
    pub core: CoreConfig,

    /// LLM provider configuration
    #[serde(default)]
    pub llm: LLMConfig,

    /// Interview flow settings
    #[serde(default)]
    pub interview: InterviewConfig,

    /// Session store settings
    #[serde(default)]
    pub sessions: SessionsConfig,

    /// HTTP API settings
    #[serde(default)]
    pub server: ServerConfig,
}

/// Core engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// Default LLM provider (ollama, openai)
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Per-provider attempt timeout in seconds
    #[serde(default = "default_provider_timeout_secs")]
    pub provider_timeout_secs: u64,

    /// Ollama provider settings
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// OpenAI-compatible provider settings
    #[serde(default)]
    pub openai: OpenAIConfig,
}

/// Ollama provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL for Ollama API
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

/// OpenAI-compatible provider configuration (Groq by default)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    /// Base URL for the chat completions API
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_openai_model")]
    pub model: String,

    /// Name of the environment variable holding the API key.
    /// The key itself is never written to the config file.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

/// Interview flow configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewConfig {
    /// Multiple-choice questions to ask before the run may end
    #[serde(default = "default_target_mcq_count")]
    pub target_mcq_count: usize,

    /// Timeout for each collaborator call, in seconds
    #[serde(default = "default_collaborator_timeout_secs")]
    pub collaborator_timeout_secs: u64,
}

/// Session store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// Maximum number of sessions held at once
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Seconds of inactivity after which a session is evicted
    #[serde(default = "default_idle_ttl_secs")]
    pub idle_ttl_secs: u64,
}

/// HTTP API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Origins allowed by CORS; `"*"` allows any
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_provider_timeout_secs() -> u64 {
    30
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_openai_model() -> String {
    "meta-llama/llama-4-scout-17b-16e-instruct".to_string()
}

fn default_api_key_env() -> String {
    "GROQ_API_KEY".to_string()
}

fn default_target_mcq_count() -> usize {
    5
}

fn default_collaborator_timeout_secs() -> u64 {
    60
}

fn default_max_sessions() -> usize {
    256
}

fn default_idle_ttl_secs() -> u64 {
    3600
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:3000".to_string(),
    ]
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            provider_timeout_secs: default_provider_timeout_secs(),
            ollama: OllamaConfig::default(),
            openai: OpenAIConfig::default(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            model: default_ollama_model(),
        }
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            model: default_openai_model(),
            api_key_env: default_api_key_env(),
        }
    }
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            target_mcq_count: default_target_mcq_count(),
            collaborator_timeout_secs: default_collaborator_timeout_secs(),
        }
    }
}

impl InterviewConfig {
    pub fn collaborator_timeout(&self) -> Duration {
        Duration::from_secs(self.collaborator_timeout_secs)
    }
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            max_sessions: default_max_sessions(),
            idle_ttl_secs: default_idle_ttl_secs(),
        }
    }
}

impl SessionsConfig {
    pub fn idle_ttl(&self) -> Duration {
        Duration::from_secs(self.idle_ttl_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.gauge/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default configuration.
    /// Validates the configuration after loading and returns descriptive errors
    /// if validation fails.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_or_create() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, EngineError> {
        let mut config: Config = toml::from_str(contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Create default configuration and save to path
    ///
    /// Creates the configuration directory if it doesn't exist, generates
    /// a default configuration, and saves it to the specified path.
    pub fn create_default(path: &Path) -> Result<Self, EngineError> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let mut config = Self::default();
        config.validate_and_process()?;

        // Serialize to TOML
        let toml_string = toml::to_string_pretty(&config)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;

        // Write to file
        fs::write(path, toml_string)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(config)
    }

    /// Get the default configuration file path (~/.gauge/config.toml)
    pub fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".gauge").join("config.toml"))
    }

    /// Validate and normalize configuration values
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Config` naming the first invalid field.
    fn validate_and_process(&mut self) -> Result<(), EngineError> {
        // Validate log level
        self.core.log_level = self.core.log_level.trim().to_ascii_lowercase();
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        // Validate default provider
        if !KNOWN_PROVIDERS.contains(&self.llm.default_provider.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid default provider '{}'. Must be one of: {}",
                self.llm.default_provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if self.llm.provider_timeout_secs == 0 {
            return Err(EngineError::Config(
                "provider_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.llm.openai.api_key_env.trim().is_empty() {
            return Err(EngineError::Config(
                "llm.openai.api_key_env must name an environment variable".to_string(),
            ));
        }

        // Trailing slashes would double up when joining endpoint paths
        self.llm.ollama.base_url = self.llm.ollama.base_url.trim_end_matches('/').to_string();
        self.llm.openai.base_url = self.llm.openai.base_url.trim_end_matches('/').to_string();

        if self.interview.collaborator_timeout_secs == 0 {
            return Err(EngineError::Config(
                "collaborator_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.sessions.max_sessions == 0 {
            return Err(EngineError::Config(
                "max_sessions must be at least 1".to_string(),
            ));
        }

        if self.sessions.idle_ttl_secs == 0 {
            return Err(EngineError::Config(
                "idle_ttl_secs must be greater than 0".to_string(),
            ));
        }

        if self.server.host.trim().is_empty() {
            return Err(EngineError::Config("server.host must not be empty".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_creation() {
        let config = Config::default();

        assert_eq!(config.core.log_level, "info");
        assert_eq!(config.llm.default_provider, "openai");
        assert_eq!(config.llm.openai.api_key_env, "GROQ_API_KEY");
        assert_eq!(config.interview.target_mcq_count, 5);
        assert_eq!(config.interview.collaborator_timeout_secs, 60);
        assert_eq!(config.sessions.max_sessions, 256);
        assert_eq!(config.sessions.idle_ttl_secs, 3600);
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.interview.target_mcq_count, 5);
        assert_eq!(config.llm.ollama.base_url, "http://localhost:11434");
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = Config::from_toml_str(
            r#"
[interview]
target_mcq_count = 3
"#,
        )
        .unwrap();

        assert_eq!(config.interview.target_mcq_count, 3);
        assert_eq!(config.interview.collaborator_timeout_secs, 60);
    }

    #[test]
    fn test_invalid_provider_rejected() {
        let err = Config::from_toml_str(
            r#"
[llm]
default_provider = "anthropic"
"#,
        )
        .unwrap_err();

        assert!(err.to_string().contains("Invalid default provider"));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = Config::from_toml_str(
            r#"
[sessions]
max_sessions = 0
"#,
        )
        .unwrap_err();

        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = Config::from_toml_str(
            r#"
[llm.ollama]
base_url = "http://localhost:11434/"
"#,
        )
        .unwrap();

        assert_eq!(config.llm.ollama.base_url, "http://localhost:11434");
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_string = toml::to_string(&config).unwrap();

        // Verify it can be deserialized back
        let deserialized: Config = toml::from_str(&toml_string).unwrap();
        assert_eq!(config.core.log_level, deserialized.core.log_level);
        assert_eq!(
            config.llm.default_provider,
            deserialized.llm.default_provider
        );
        assert_eq!(
            config.server.allowed_origins,
            deserialized.server.allowed_origins
        );
    }
}
