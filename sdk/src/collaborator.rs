//! Collaborator traits
//!
//! The interview controller never talks to a language model directly. It asks
//! these four collaborators for questions, verdicts, presentation text and the
//! report narrative, and depends only on the shapes and ranges they return.
//!
//! Implementations must be `Send + Sync` so a single instance can serve every
//! session held by the store.

use crate::errors::EngineError;
use crate::report::{ReportNarrative, ScoreSummary};
use crate::types::{
    AnswerRecord, ChoiceSet, Evaluation, GeneratedQuestion, PositionLevel, QuestionFormat,
    QuestionRecord, SkillArea,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Snapshot of the session handed to the question source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionContext {
    pub position_level: PositionLevel,
    /// Texts of every question asked so far, in order
    pub previous_questions: Vec<String>,
    /// Current blended score per covered area
    pub performance: Vec<(SkillArea, f64)>,
}

/// What the controller wants asked next
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRequest {
    pub skill_area: SkillArea,
    pub difficulty: f64,
    pub format: QuestionFormat,
    pub context: QuestionContext,
}

/// One answer to be judged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeRequest {
    pub question: String,
    pub answer: String,
    pub skill_area: SkillArea,
    pub difficulty: f64,
    pub format: QuestionFormat,
    /// Options and correct label for multiple-choice questions
    pub choices: Option<ChoiceSet>,
}

/// Everything a report compiler may draw on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportInput {
    pub candidate_name: String,
    pub position_level: PositionLevel,
    pub duration_secs: f64,
    pub summary: ScoreSummary,
    pub questions: Vec<QuestionRecord>,
    pub answers: Vec<AnswerRecord>,
}

/// Produces question text (and options) for a skill area
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Generate a question in the requested format.
    ///
    /// A multiple-choice request may be answered with an open-ended question
    /// only if the source cannot produce options at all; the controller
    /// counts whatever format comes back.
    async fn generate_question(
        &self,
        request: &QuestionRequest,
    ) -> Result<GeneratedQuestion, EngineError>;
}

/// Scores a candidate answer
#[async_trait]
pub trait AnswerJudge: Send + Sync {
    /// Returns an evaluation; the controller normalizes `overall_score`
    async fn evaluate_answer(&self, request: &JudgeRequest) -> Result<Evaluation, EngineError>;
}

/// Presentation text around the questions
#[async_trait]
pub trait Interviewer: Send + Sync {
    async fn welcome_message(
        &self,
        candidate_name: &str,
        level: PositionLevel,
    ) -> Result<String, EngineError>;

    /// Text shown when moving from one skill area to another.
    /// `performance` is the current score of the area being left.
    async fn transition_message(
        &self,
        from: SkillArea,
        to: SkillArea,
        performance: f64,
    ) -> Result<String, EngineError>;
}

/// Writes the narrative part of the final report
#[async_trait]
pub trait ReportCompiler: Send + Sync {
    async fn compile_report(&self, input: &ReportInput) -> Result<ReportNarrative, EngineError>;
}
