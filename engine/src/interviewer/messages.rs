use super::{spoken, strip_any_prefix, LlmClient};
use crate::session::static_welcome;
use async_trait::async_trait;
use sdk::collaborator::Interviewer;
use sdk::errors::EngineError;
use sdk::types::{PositionLevel, SkillArea};

const WELCOME_TEMPERATURE: f32 = 0.6;
const WELCOME_MAX_TOKENS: u32 = 150;
const TRANSITION_TEMPERATURE: f32 = 0.6;
const TRANSITION_MAX_TOKENS: u32 = 100;

const WELCOME_PREFIXES: [&str; 5] = [
    "Here is a warm and professional welcome message:",
    "Here's a welcome message:",
    "Welcome message:",
    "Here is the message:",
    "Here's the welcome message:",
];

/// Welcome and transition text from the model
pub struct LlmInterviewer {
    client: LlmClient,
}

impl LlmInterviewer {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Interviewer for LlmInterviewer {
    async fn welcome_message(
        &self,
        candidate_name: &str,
        level: PositionLevel,
    ) -> Result<String, EngineError> {
        let prompt = format!(
            r#"Generate a warm, professional welcome message for {name} starting an Excel skills assessment at {level} level.

Requirements:
- Address them by name
- Briefly explain the process (8-12 questions, adapts to skill level, mix of multiple choice and open questions)
- Encourage detailed explanations
- Keep it natural and conversational
- NO placeholder text or formatting instructions
- 2-3 sentences maximum

Return ONLY the welcome message, nothing else."#,
            name = candidate_name,
            level = level,
        );

        let raw = self
            .client
            .prompt(prompt, WELCOME_TEMPERATURE, WELCOME_MAX_TOKENS)
            .await?;

        let message = clean_welcome(&raw);
        if message.is_empty() {
            tracing::warn!("Empty welcome message from model, using static text");
            return Ok(static_welcome(candidate_name, level));
        }
        Ok(message)
    }

    async fn transition_message(
        &self,
        from: SkillArea,
        to: SkillArea,
        performance: f64,
    ) -> Result<String, EngineError> {
        let prompt = format!(
            "Generate a brief, encouraging transition message for an Excel skills interview.\n\
             The candidate just finished questions about {} with {} performance.\n\
             Now moving to questions about {}.\n\n\
             Keep it to 1-2 sentences, professional but encouraging.",
            spoken(from),
            performance_text(performance),
            spoken(to),
        );

        self.client
            .prompt(prompt, TRANSITION_TEMPERATURE, TRANSITION_MAX_TOKENS)
            .await
    }
}

/// Drop known preambles and quotes wrapping the whole message
pub fn clean_welcome(raw: &str) -> String {
    let message = strip_any_prefix(raw.trim(), &WELCOME_PREFIXES).trim();
    let message = message
        .strip_prefix('"')
        .and_then(|m| m.strip_suffix('"'))
        .unwrap_or(message);
    message.trim().to_string()
}

fn performance_text(performance: f64) -> &'static str {
    if performance > 0.8 {
        "excellent"
    } else if performance > 0.6 {
        "good"
    } else {
        "developing"
    }
}
