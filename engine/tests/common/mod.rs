//! Scripted collaborators shared by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use gauge_engine::session::Collaborators;
use sdk::collaborator::{
    AnswerJudge, Interviewer, JudgeRequest, QuestionRequest, QuestionSource, ReportCompiler,
    ReportInput,
};
use sdk::errors::EngineError;
use sdk::report::ReportNarrative;
use sdk::types::{
    ChoiceSet, Evaluation, GeneratedQuestion, PositionLevel, QuestionFormat, SkillArea,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Answers every request in the requested format.
/// Fails on the call numbered `fail_on` (0-based) when set.
pub struct ScriptedSource {
    calls: AtomicUsize,
    fail_on: Option<usize>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_on: None,
        }
    }

    pub fn failing_on(call: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_on: Some(call),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuestionSource for ScriptedSource {
    async fn generate_question(
        &self,
        request: &QuestionRequest,
    ) -> Result<GeneratedQuestion, EngineError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on == Some(call) {
            return Err(EngineError::collaborator("question source", "scripted failure"));
        }

        let text = format!(
            "Q{} on {} at {:.2}",
            call + 1,
            request.skill_area,
            request.difficulty
        );
        Ok(match request.format {
            QuestionFormat::OpenEnded => GeneratedQuestion::OpenEnded { text },
            QuestionFormat::MultipleChoice => GeneratedQuestion::MultipleChoice {
                text,
                choices: ChoiceSet::from_parts(
                    vec![
                        "first".to_string(),
                        "second".to_string(),
                        "third".to_string(),
                        "fourth".to_string(),
                    ],
                    "B",
                )
                .map_err(|e| EngineError::collaborator("question source", e))?,
            },
        })
    }
}

/// Hands out scores from a queue, then a default
pub struct ScriptedJudge {
    scores: Mutex<VecDeque<f64>>,
    default_score: f64,
}

impl ScriptedJudge {
    pub fn new(scores: Vec<f64>, default_score: f64) -> Self {
        Self {
            scores: Mutex::new(scores.into()),
            default_score,
        }
    }

    pub fn constant(score: f64) -> Self {
        Self::new(Vec::new(), score)
    }
}

#[async_trait]
impl AnswerJudge for ScriptedJudge {
    async fn evaluate_answer(&self, request: &JudgeRequest) -> Result<Evaluation, EngineError> {
        let score = self
            .scores
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.default_score);
        let mut evaluation =
            Evaluation::with_score(score, request.format == QuestionFormat::MultipleChoice);
        evaluation.feedback = format!("Scored {:.1}", score);
        Ok(evaluation)
    }
}

/// Fixed score with `is_mcq` always left at false, whatever the format
pub struct FormatBlindJudge(pub f64);

#[async_trait]
impl AnswerJudge for FormatBlindJudge {
    async fn evaluate_answer(&self, _request: &JudgeRequest) -> Result<Evaluation, EngineError> {
        Ok(Evaluation::with_score(self.0, false))
    }
}

/// Never answers within any reasonable timeout
pub struct StalledJudge(pub Duration);

#[async_trait]
impl AnswerJudge for StalledJudge {
    async fn evaluate_answer(&self, _request: &JudgeRequest) -> Result<Evaluation, EngineError> {
        tokio::time::sleep(self.0).await;
        Ok(Evaluation::with_score(1.0, false))
    }
}

pub struct FailingJudge;

#[async_trait]
impl AnswerJudge for FailingJudge {
    async fn evaluate_answer(&self, _request: &JudgeRequest) -> Result<Evaluation, EngineError> {
        Err(EngineError::collaborator("answer judge", "scripted failure"))
    }
}

pub struct EchoInterviewer;

#[async_trait]
impl Interviewer for EchoInterviewer {
    async fn welcome_message(
        &self,
        candidate_name: &str,
        level: PositionLevel,
    ) -> Result<String, EngineError> {
        Ok(format!("Hello {}, {} track", candidate_name, level))
    }

    async fn transition_message(
        &self,
        from: SkillArea,
        to: SkillArea,
        _performance: f64,
    ) -> Result<String, EngineError> {
        Ok(format!("Moving from {} to {}", from, to))
    }
}

pub struct SummaryReports;

#[async_trait]
impl ReportCompiler for SummaryReports {
    async fn compile_report(&self, input: &ReportInput) -> Result<ReportNarrative, EngineError> {
        Ok(ReportNarrative {
            interview_summary: format!(
                "{} answered {} questions",
                input.candidate_name,
                input.answers.len()
            ),
            ..ReportNarrative::default()
        })
    }
}

/// Counts how many times a report was compiled
#[derive(Default)]
pub struct CountingReports {
    calls: AtomicUsize,
}

impl CountingReports {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReportCompiler for CountingReports {
    async fn compile_report(&self, input: &ReportInput) -> Result<ReportNarrative, EngineError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(ReportNarrative {
            interview_summary: format!("Report {} for {}", call, input.candidate_name),
            ..ReportNarrative::default()
        })
    }
}

pub fn collaborators(
    questions: Arc<dyn QuestionSource>,
    judge: Arc<dyn AnswerJudge>,
) -> Collaborators {
    Collaborators {
        questions,
        judge,
        interviewer: Arc::new(EchoInterviewer),
        reports: Arc::new(SummaryReports),
    }
}

pub fn scripted(judge: ScriptedJudge) -> Collaborators {
    collaborators(Arc::new(ScriptedSource::new()), Arc::new(judge))
}
