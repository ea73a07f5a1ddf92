//! Gauge SDK
//!
//! Shared library providing the domain types, collaborator traits and error
//! types of the Gauge interview engine. Collaborator implementations depend on
//! this crate only.

/// Collaborator traits and request types
pub mod collaborator;

/// Error types and handling
pub mod errors;

/// Score summary and report types
pub mod report;

/// Interview domain types
pub mod types;

// Re-export commonly used types
pub use collaborator::{
    AnswerJudge, Interviewer, JudgeRequest, QuestionContext, QuestionRequest, QuestionSource,
    ReportCompiler, ReportInput,
};
pub use errors::{EngineError, GaugeErrorExt};
pub use report::{
    AssessmentReport, ReportNarrative, ScoreSummary, SkillAssessment, SkillBreakdown, SkillLevel,
};
pub use types::{
    normalize_score, AnswerRecord, ChoiceLabel, ChoiceSet, Evaluation, GeneratedQuestion,
    PositionLevel, QuestionFormat, QuestionRecord, RubricScores, SessionState, SkillArea,
};
