//! LLM-backed collaborators
//!
//! Implementations of the four session collaborators on top of the
//! [`LLMRouter`]. Each one owns its prompt templates, cleans up whatever the
//! model sends back and substitutes a deterministic fallback when the output
//! cannot be used. Provider failures are passed up unchanged.

pub mod judge;
pub mod messages;
pub mod questions;
pub mod report;

use crate::llm::router::LLMRouter;
use crate::llm::CompletionRequest;
use crate::session::Collaborators;
use sdk::errors::EngineError;
use sdk::types::SkillArea;
use std::sync::Arc;

pub use judge::LlmAnswerJudge;
pub use messages::LlmInterviewer;
pub use questions::LlmQuestionSource;
pub use report::LlmReportCompiler;

/// Thin prompt helper shared by the collaborators
#[derive(Clone)]
pub struct LlmClient {
    router: Arc<LLMRouter>,
}

impl LlmClient {
    pub fn new(router: Arc<LLMRouter>) -> Self {
        Self { router }
    }

    /// Send a single-turn prompt and return the trimmed reply
    pub async fn prompt(
        &self,
        prompt: String,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, EngineError> {
        let request = CompletionRequest::prompt(prompt, temperature, max_tokens);
        let (text, provider) = self.router.complete(&request).await?;
        tracing::debug!("{} replied with {} characters", provider, text.len());
        Ok(text.trim().to_string())
    }
}

/// Build the full collaborator set over one router
pub fn collaborators(router: Arc<LLMRouter>) -> Collaborators {
    let client = LlmClient::new(router);
    Collaborators {
        questions: Arc::new(LlmQuestionSource::new(client.clone())),
        judge: Arc::new(LlmAnswerJudge::new(client.clone())),
        interviewer: Arc::new(LlmInterviewer::new(client.clone())),
        reports: Arc::new(LlmReportCompiler::new(client)),
    }
}

/// Lower-case area name as used in prompts ("pivot tables")
pub(crate) fn spoken(area: SkillArea) -> String {
    area.as_str().replace('_', " ")
}

/// Remove the first matching prefix, if any
pub(crate) fn strip_any_prefix<'a>(text: &'a str, prefixes: &[&str]) -> &'a str {
    prefixes
        .iter()
        .find_map(|prefix| text.strip_prefix(prefix))
        .map(str::trim_start)
        .unwrap_or(text)
}
