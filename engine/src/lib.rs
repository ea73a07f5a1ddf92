//! Gauge Engine Library
//!
//! Adaptive skills interview engine. Used by the `gauge` binary and by the
//! integration tests.

/// Configuration management module
pub mod config;

/// LLM provider abstraction layer
pub mod llm;

/// Level profiles, skill plans and topic lists
pub mod catalog;

/// Per-area score blending and summaries
pub mod scoring;

/// Interview sessions, adaptive policy and the session store
pub mod session;

/// Model-backed collaborators
pub mod interviewer;

/// HTTP API
pub mod server;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
