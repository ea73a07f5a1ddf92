//! Error types and handling
//!
//! This module provides the error types used throughout the Gauge engine.
//! All errors implement the `GaugeErrorExt` trait which provides user-friendly
//! hints and indicates whether errors are recoverable.
//!
//! # Security
//!
//! All error messages are scrubbed to ensure:
//! - No secrets (API keys, tokens) are included
//! - No raw model output is echoed back to candidates
//! - All hints are safe to display to end users

use thiserror::Error;

/// Trait for Gauge error extensions
///
/// This trait provides additional context for errors, including user-friendly
/// hints and recoverability information. All engine errors implement this trait.
pub trait GaugeErrorExt {
    /// Returns a user-friendly hint for the error
    ///
    /// The hint is safe to display to candidates and does not contain:
    /// - Secrets (API keys, tokens, passwords)
    /// - Prompt text or raw model output
    /// - Internal implementation details
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors leave the session usable (the caller may retry or
    /// correct the request). Non-recoverable errors end the interview run.
    fn is_recoverable(&self) -> bool;
}

/// Main engine error type
///
/// # Error Categories
///
/// - **Configuration**: Invalid or missing configuration
/// - **Protocol**: Requests that violate the interview state machine
/// - **Collaborator**: Question source, judge or report failures
/// - **LLM Provider**: API failures, authentication errors, timeouts
/// - **Session Store**: Lookup, capacity and concurrent-access errors
///
/// # Examples
///
/// ```
/// use sdk::errors::{EngineError, GaugeErrorExt};
///
/// let error = EngineError::NoPendingQuestion;
/// println!("Hint: {}", error.user_hint());
/// assert!(error.is_recoverable());
///
/// let fatal_error = EngineError::LLMTimeout;
/// assert!(!fatal_error.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Protocol errors
    #[error("Session is {actual}, expected {expected}")]
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("No active question to answer")]
    NoPendingQuestion,

    #[error("Interview is not complete yet")]
    NotComplete,

    #[error("Invalid interview plan: {0}")]
    InvalidPlan(String),

    // Collaborator errors
    #[error("{collaborator} failed: {message}")]
    Collaborator {
        collaborator: &'static str,
        message: String,
    },

    // LLM provider errors
    #[error("LLM provider error: {0}")]
    LLMProvider(String),

    #[error("LLM call timed out")]
    LLMTimeout,

    #[error("All LLM providers exhausted")]
    AllProvidersExhausted,

    // Session store errors
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Session is busy: {0}")]
    SessionBusy(String),

    #[error("Session store is full ({capacity} active sessions)")]
    StoreFull { capacity: usize },

    // Network errors
    #[error("Network error: {0}")]
    Network(String),

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Build a collaborator failure for the named collaborator
    pub fn collaborator(collaborator: &'static str, message: impl Into<String>) -> Self {
        Self::Collaborator {
            collaborator,
            message: message.into(),
        }
    }

    /// Returns true for errors caused by a caller violating the interview protocol
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidState { .. }
                | Self::NoPendingQuestion
                | Self::NotComplete
                | Self::SessionBusy(_)
        )
    }
}

impl GaugeErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            // Configuration errors
            Self::Config(_) => "Check your config.toml file for errors",

            // Protocol errors
            Self::InvalidState { .. } => "This interview is not accepting answers",
            Self::NoPendingQuestion => "There is no open question to answer",
            Self::NotComplete => "Finish the interview before requesting the report",
            Self::InvalidPlan(_) => "The interview plan is misconfigured",

            // Collaborator errors
            Self::Collaborator { .. } => {
                "The assessment service failed. Your answers so far were kept"
            }

            // LLM provider errors
            Self::LLMProvider(_) => "LLM provider unavailable. Check your API keys and network",
            Self::LLMTimeout => "LLM provider took too long to respond",
            Self::AllProvidersExhausted => "No LLM providers available. Check configuration",

            // Session store errors
            Self::SessionNotFound(_) => "Session not found. Start a new interview",
            Self::SessionBusy(_) => "The previous answer is still being processed",
            Self::StoreFull { .. } => "Too many interviews in progress. Try again later",

            // Network errors
            Self::Network(_) => "Network operation failed. Check your connection",

            // Generic IO error
            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            // Errors that end the interview run
            Self::Collaborator { .. }
            | Self::LLMProvider(_)
            | Self::LLMTimeout
            | Self::AllProvidersExhausted
            | Self::Network(_) => false,

            // All other errors are potentially recoverable
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_errors_are_recoverable() {
        let errors = [
            EngineError::NoPendingQuestion,
            EngineError::NotComplete,
            EngineError::InvalidState {
                expected: "in_progress",
                actual: "completed",
            },
            EngineError::SessionBusy("abc".to_string()),
        ];

        for err in errors {
            assert!(err.is_protocol_error());
            assert!(err.is_recoverable());
        }
    }

    #[test]
    fn test_collaborator_errors_end_the_run() {
        let err = EngineError::collaborator("answer judge", "connection reset");
        assert!(!err.is_recoverable());
        assert!(!err.is_protocol_error());
        assert_eq!(err.to_string(), "answer judge failed: connection reset");
    }

    #[test]
    fn test_invalid_state_message() {
        let err = EngineError::InvalidState {
            expected: "in_progress",
            actual: "initialized",
        };
        assert_eq!(err.to_string(), "Session is initialized, expected in_progress");
    }
}
