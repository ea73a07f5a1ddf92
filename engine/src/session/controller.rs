//! Interview session controller
//!
//! Drives one adaptive interview run: asks the collaborators for questions and
//! verdicts, folds the verdicts into skill scores, adapts difficulty and
//! decides when the run is over.
//!
//! Every step works on a staged copy of the session progress. The copy is
//! committed only once the step has an outcome, so a dropped future leaves the
//! session exactly as it was before the call.

use super::policy::{self, InterviewPlan};
use crate::catalog;
use crate::config::InterviewConfig;
use crate::scoring::{self, SkillScores};
use chrono::{DateTime, Utc};
use sdk::collaborator::{
    AnswerJudge, Interviewer, JudgeRequest, QuestionContext, QuestionRequest, QuestionSource,
    ReportCompiler, ReportInput,
};
use sdk::errors::EngineError;
use sdk::report::{AssessmentReport, ScoreSummary};
use sdk::types::{
    AnswerRecord, GeneratedQuestion, PositionLevel, QuestionFormat, QuestionRecord, SessionState,
    SkillArea,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const COMPLETION_MESSAGE: &str =
    "Thank you for completing the interview! Your assessment report is ready.";

const DEFAULT_FEEDBACK: &str = "Thank you for your answer.";

/// Opaque session identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(SessionId)
            .map_err(|_| EngineError::SessionNotFound(s.to_string()))
    }
}

/// The collaborators a session calls out to
#[derive(Clone)]
pub struct Collaborators {
    pub questions: Arc<dyn QuestionSource>,
    pub judge: Arc<dyn AnswerJudge>,
    pub interviewer: Arc<dyn Interviewer>,
    pub reports: Arc<dyn ReportCompiler>,
}

/// Per-session tuning that is not part of the plan
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSettings {
    pub initial_difficulty: f64,
    /// Upper bound on every collaborator call
    pub collaborator_timeout: Duration,
}

/// What the candidate sees of a question. Never carries the correct label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionView {
    pub index: usize,
    pub text: String,
    pub skill_area: SkillArea,
    pub format: QuestionFormat,
    pub options: Option<[String; 4]>,
    pub difficulty: f64,
}

impl QuestionView {
    fn from_record(index: usize, record: &QuestionRecord) -> Self {
        Self {
            index,
            text: record.text.clone(),
            skill_area: record.skill_area,
            format: record.format,
            options: record.options().cloned(),
            difficulty: record.difficulty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartOutcome {
    pub session_id: SessionId,
    pub welcome_message: String,
    pub question: QuestionView,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitOutcome {
    /// Judge feedback, or the completion message once the run is over
    pub message: String,
    pub transition: Option<String>,
    pub next_question: Option<QuestionView>,
    pub is_complete: bool,
    /// Normalized score of the answer just submitted
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub session_id: SessionId,
    pub candidate_name: String,
    pub position_level: PositionLevel,
    pub state: SessionState,
    /// Number of answers so far
    pub current_question: usize,
    pub total_questions: usize,
    pub max_questions: usize,
    pub mcq_count: usize,
    pub target_mcq_count: usize,
    /// Areas that have at least one scored answer
    pub skill_areas_covered: Vec<SkillArea>,
    pub difficulty: f64,
}

/// Mutable part of a session, staged and committed as a unit
#[derive(Debug, Clone)]
struct Progress {
    difficulty: f64,
    questions: Vec<QuestionRecord>,
    answers: Vec<AnswerRecord>,
    skill_scores: SkillScores,
    mcq_count: usize,
}

impl Progress {
    fn new(initial_difficulty: f64) -> Self {
        Self {
            difficulty: initial_difficulty,
            questions: Vec::new(),
            answers: Vec::new(),
            skill_scores: SkillScores::new(),
            mcq_count: 0,
        }
    }

    fn pending_question(&self) -> Option<&QuestionRecord> {
        if self.questions.len() > self.answers.len() {
            self.questions.get(self.answers.len())
        } else {
            None
        }
    }

    fn asked_areas(&self) -> Vec<SkillArea> {
        self.questions.iter().map(|q| q.skill_area).collect()
    }

    fn push_question(&mut self, question: GeneratedQuestion, area: SkillArea) -> usize {
        if question.format() == QuestionFormat::MultipleChoice {
            self.mcq_count += 1;
        }
        self.questions
            .push(QuestionRecord::new(question, area, self.difficulty));
        self.questions.len() - 1
    }

    fn question_context(&self, level: PositionLevel) -> QuestionContext {
        QuestionContext {
            position_level: level,
            previous_questions: self.questions.iter().map(|q| q.text.clone()).collect(),
            performance: self.skill_scores.snapshot(),
        }
    }
}

/// One adaptive interview run
pub struct InterviewSession {
    id: SessionId,
    candidate_name: String,
    position_level: PositionLevel,
    state: SessionState,
    created_at: DateTime<Utc>,
    plan: InterviewPlan,
    settings: SessionSettings,
    progress: Progress,
    collaborators: Collaborators,
    /// First successfully compiled report, returned by later `finalize` calls
    report: Option<AssessmentReport>,
}

impl fmt::Debug for InterviewSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterviewSession")
            .field("id", &self.id)
            .field("candidate_name", &self.candidate_name)
            .field("position_level", &self.position_level)
            .field("state", &self.state)
            .field("created_at", &self.created_at)
            .field("plan", &self.plan)
            .field("settings", &self.settings)
            .field("progress", &self.progress)
            .field("report", &self.report)
            .finish_non_exhaustive()
    }
}

impl InterviewSession {
    /// Session with the standard plan for `level`
    pub fn for_level(
        candidate_name: impl Into<String>,
        level: PositionLevel,
        config: &InterviewConfig,
        collaborators: Collaborators,
    ) -> Self {
        let settings = SessionSettings {
            initial_difficulty: catalog::profile(level).initial_difficulty,
            collaborator_timeout: config.collaborator_timeout(),
        };
        let plan = InterviewPlan::for_level(level, config.target_mcq_count);
        Self::with_plan(candidate_name, level, plan, settings, collaborators)
    }

    pub fn with_plan(
        candidate_name: impl Into<String>,
        level: PositionLevel,
        plan: InterviewPlan,
        settings: SessionSettings,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            id: SessionId::new(),
            candidate_name: candidate_name.into(),
            position_level: level,
            state: SessionState::Initialized,
            created_at: Utc::now(),
            plan,
            settings,
            progress: Progress::new(settings.initial_difficulty),
            collaborators,
            report: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn candidate_name(&self) -> &str {
        &self.candidate_name
    }

    pub fn position_level(&self) -> PositionLevel {
        self.position_level
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn plan(&self) -> &InterviewPlan {
        &self.plan
    }

    pub fn difficulty(&self) -> f64 {
        self.progress.difficulty
    }

    pub fn mcq_count(&self) -> usize {
        self.progress.mcq_count
    }

    pub fn questions(&self) -> &[QuestionRecord] {
        &self.progress.questions
    }

    pub fn answers(&self) -> &[AnswerRecord] {
        &self.progress.answers
    }

    pub fn skill_scores(&self) -> &SkillScores {
        &self.progress.skill_scores
    }

    /// The question waiting for an answer, if any
    pub fn current_question(&self) -> Option<QuestionView> {
        let index = self.progress.answers.len();
        self.progress
            .pending_question()
            .map(|record| QuestionView::from_record(index, record))
    }

    /// Open the interview: welcome message and first question
    pub async fn start(&mut self) -> Result<StartOutcome, EngineError> {
        if self.state != SessionState::Initialized {
            return Err(EngineError::InvalidState {
                expected: SessionState::Initialized.as_str(),
                actual: self.state.as_str(),
            });
        }

        info!(
            "Starting interview {} for {} ({})",
            self.id, self.candidate_name, self.position_level
        );

        let welcome_message = self.welcome().await;

        let mut staged = self.progress.clone();
        let area = self.plan.first_area();
        let format = policy::opening_format(&self.plan);

        let question = match self.ask(&staged, area, format).await {
            Ok(question) => question,
            Err(e) => {
                self.fail(&e);
                return Err(e);
            }
        };

        let index = staged.push_question(question, area);
        let view = QuestionView::from_record(index, &staged.questions[index]);

        self.progress = staged;
        self.state = SessionState::InProgress;

        Ok(StartOutcome {
            session_id: self.id,
            welcome_message,
            question: view,
        })
    }

    /// Judge an answer to the pending question and move the run forward
    pub async fn submit_answer(&mut self, answer: &str) -> Result<SubmitOutcome, EngineError> {
        if self.state != SessionState::InProgress {
            return Err(EngineError::InvalidState {
                expected: SessionState::InProgress.as_str(),
                actual: self.state.as_str(),
            });
        }

        let question_index = self.progress.answers.len();
        let question = self
            .progress
            .pending_question()
            .cloned()
            .ok_or(EngineError::NoPendingQuestion)?;

        let request = JudgeRequest {
            question: question.text.clone(),
            answer: answer.to_string(),
            skill_area: question.skill_area,
            difficulty: question.difficulty,
            format: question.format,
            choices: question.choices.clone(),
        };

        let judged = with_timeout(
            self.settings.collaborator_timeout,
            "answer judge",
            self.collaborators.judge.evaluate_answer(&request),
        )
        .await;

        let mut evaluation = match judged {
            Ok(evaluation) => evaluation.normalized(),
            Err(e) => {
                self.fail(&e);
                return Err(e);
            }
        };

        // The format of the stored question decides the MCQ tally, not the judge
        evaluation.is_mcq = question.format == QuestionFormat::MultipleChoice;

        let score = evaluation.overall_score;
        let message = if evaluation.feedback.trim().is_empty() {
            DEFAULT_FEEDBACK.to_string()
        } else {
            evaluation.feedback.clone()
        };

        let mut staged = self.progress.clone();
        staged.answers.push(AnswerRecord {
            answer: answer.to_string(),
            evaluation,
            question_index,
            answered_at: Utc::now(),
        });
        let blended = staged.skill_scores.record(question.skill_area, score);
        let previous_difficulty = staged.difficulty;
        staged.difficulty = policy::adapt_difficulty(previous_difficulty, score);
        let cursor = staged.answers.len();

        debug!(
            "Session {} answer {}: score {:.2}, {} now {:.2}, difficulty {:.2} -> {:.2}",
            self.id,
            cursor,
            score,
            question.skill_area,
            blended,
            previous_difficulty,
            staged.difficulty
        );

        let asked = staged.asked_areas();
        if !policy::should_continue(&self.plan, cursor, staged.mcq_count, &asked) {
            self.progress = staged;
            self.state = SessionState::Completed;
            info!(
                "Interview {} completed after {} answers ({} multiple choice)",
                self.id, cursor, self.progress.mcq_count
            );
            return Ok(SubmitOutcome {
                message: COMPLETION_MESSAGE.to_string(),
                transition: None,
                next_question: None,
                is_complete: true,
                score,
            });
        }

        let format = policy::next_format(&self.plan, cursor, staged.mcq_count);
        let area = policy::next_area(&self.plan, &asked, format, &staged.skill_scores);

        let next = match self.ask(&staged, area, format).await {
            Ok(question) => question,
            Err(e) => {
                // The verdict stands even though the run cannot go on
                self.progress = staged;
                self.fail(&e);
                return Err(e);
            }
        };

        let transition = if area != question.skill_area {
            let performance = staged
                .skill_scores
                .get(question.skill_area)
                .unwrap_or(score);
            self.transition(question.skill_area, area, performance).await
        } else {
            None
        };

        let index = staged.push_question(next, area);
        let view = QuestionView::from_record(index, &staged.questions[index]);
        self.progress = staged;

        Ok(SubmitOutcome {
            message,
            transition,
            next_question: Some(view),
            is_complete: false,
            score,
        })
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            session_id: self.id,
            candidate_name: self.candidate_name.clone(),
            position_level: self.position_level,
            state: self.state,
            current_question: self.progress.answers.len(),
            total_questions: self.progress.questions.len(),
            max_questions: self.plan.max_questions(),
            mcq_count: self.progress.mcq_count,
            target_mcq_count: self.plan.target_mcq_count(),
            skill_areas_covered: self.progress.skill_scores.areas(),
            difficulty: self.progress.difficulty,
        }
    }

    /// Score summary over the answers so far; valid in every state
    pub fn summary(&self) -> ScoreSummary {
        let questions = &self.progress.questions;
        scoring::aggregate(self.progress.answers.iter().filter_map(|answer| {
            questions
                .get(answer.question_index)
                .map(|question| (question.skill_area, &answer.evaluation))
        }))
    }

    /// Build the final report of a completed run.
    ///
    /// The report compiler runs once; later calls return the stored report.
    pub async fn finalize(&mut self) -> Result<AssessmentReport, EngineError> {
        if let Some(report) = &self.report {
            return Ok(report.clone());
        }

        match self.state {
            SessionState::Completed => {}
            SessionState::Failed => {
                return Err(EngineError::InvalidState {
                    expected: SessionState::Completed.as_str(),
                    actual: self.state.as_str(),
                })
            }
            SessionState::Initialized | SessionState::InProgress => {
                return Err(EngineError::NotComplete)
            }
        }

        let summary = self.summary();
        let duration_secs = (Utc::now() - self.created_at).num_milliseconds() as f64 / 1000.0;
        let input = ReportInput {
            candidate_name: self.candidate_name.clone(),
            position_level: self.position_level,
            duration_secs,
            summary: summary.clone(),
            questions: self.progress.questions.clone(),
            answers: self.progress.answers.clone(),
        };

        let narrative = with_timeout(
            self.settings.collaborator_timeout,
            "report compiler",
            self.collaborators.reports.compile_report(&input),
        )
        .await?;

        info!(
            "Report for interview {} compiled (overall {:.2})",
            self.id, summary.overall_score
        );

        let report = AssessmentReport {
            session_id: self.id.to_string(),
            candidate_name: self.candidate_name.clone(),
            position_level: self.position_level,
            questions_asked: self.progress.questions.len(),
            duration_secs,
            summary,
            narrative,
            generated_at: Utc::now(),
        };
        self.report = Some(report.clone());
        Ok(report)
    }

    async fn ask(
        &self,
        progress: &Progress,
        area: SkillArea,
        format: QuestionFormat,
    ) -> Result<GeneratedQuestion, EngineError> {
        let request = QuestionRequest {
            skill_area: area,
            difficulty: progress.difficulty,
            format,
            context: progress.question_context(self.position_level),
        };

        debug!(
            "Session {} requesting {} question on {} at difficulty {:.2}",
            self.id, format, area, progress.difficulty
        );

        let question = with_timeout(
            self.settings.collaborator_timeout,
            "question source",
            self.collaborators.questions.generate_question(&request),
        )
        .await?;

        if question.format() != format {
            warn!(
                "Question source returned {} instead of {} for {}",
                question.format(),
                format,
                area
            );
        }
        Ok(question)
    }

    async fn welcome(&self) -> String {
        let result = with_timeout(
            self.settings.collaborator_timeout,
            "interviewer",
            self.collaborators
                .interviewer
                .welcome_message(&self.candidate_name, self.position_level),
        )
        .await;

        match result {
            Ok(message) if !message.trim().is_empty() => message,
            Ok(_) => static_welcome(&self.candidate_name, self.position_level),
            Err(e) => {
                warn!("Welcome message unavailable, using static text: {}", e);
                static_welcome(&self.candidate_name, self.position_level)
            }
        }
    }

    async fn transition(&self, from: SkillArea, to: SkillArea, performance: f64) -> Option<String> {
        let result = with_timeout(
            self.settings.collaborator_timeout,
            "interviewer",
            self.collaborators
                .interviewer
                .transition_message(from, to, performance),
        )
        .await;

        match result {
            Ok(message) if !message.trim().is_empty() => Some(message),
            Ok(_) => None,
            Err(e) => {
                warn!("Transition message from {} to {} omitted: {}", from, to, e);
                None
            }
        }
    }

    fn fail(&mut self, err: &EngineError) {
        error!(
            "Interview {} failed after {} answers: {}",
            self.id,
            self.progress.answers.len(),
            err
        );
        self.state = SessionState::Failed;
    }
}

/// Static welcome used when the interviewer has nothing to say
pub fn static_welcome(candidate_name: &str, level: PositionLevel) -> String {
    format!(
        "Welcome {}! Let's begin your {} level Excel skills interview.",
        candidate_name, level
    )
}

async fn with_timeout<T, F>(
    timeout: Duration,
    collaborator: &'static str,
    call: F,
) -> Result<T, EngineError>
where
    F: Future<Output = Result<T, EngineError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => {
            warn!(
                "{} did not answer within {}s",
                collaborator,
                timeout.as_secs_f64()
            );
            Err(EngineError::LLMTimeout)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sdk::report::ReportNarrative;
    use sdk::types::{ChoiceSet, Evaluation};

    struct FixedSource;

    #[async_trait]
    impl QuestionSource for FixedSource {
        async fn generate_question(
            &self,
            request: &QuestionRequest,
        ) -> Result<GeneratedQuestion, EngineError> {
            let text = format!("Question on {}", request.skill_area);
            Ok(match request.format {
                QuestionFormat::OpenEnded => GeneratedQuestion::OpenEnded { text },
                QuestionFormat::MultipleChoice => GeneratedQuestion::MultipleChoice {
                    text,
                    choices: ChoiceSet::from_parts(
                        vec!["one".into(), "two".into(), "three".into(), "four".into()],
                        "B",
                    )
                    .map_err(|e| EngineError::collaborator("question source", e))?,
                },
            })
        }
    }

    struct FixedJudge(f64);

    #[async_trait]
    impl AnswerJudge for FixedJudge {
        async fn evaluate_answer(&self, request: &JudgeRequest) -> Result<Evaluation, EngineError> {
            Ok(Evaluation::with_score(
                self.0,
                request.format == QuestionFormat::MultipleChoice,
            ))
        }
    }

    struct SilentInterviewer;

    #[async_trait]
    impl Interviewer for SilentInterviewer {
        async fn welcome_message(
            &self,
            _candidate_name: &str,
            _level: PositionLevel,
        ) -> Result<String, EngineError> {
            Err(EngineError::LLMTimeout)
        }

        async fn transition_message(
            &self,
            _from: SkillArea,
            _to: SkillArea,
            _performance: f64,
        ) -> Result<String, EngineError> {
            Err(EngineError::LLMTimeout)
        }
    }

    struct EmptyReports;

    #[async_trait]
    impl ReportCompiler for EmptyReports {
        async fn compile_report(
            &self,
            _input: &ReportInput,
        ) -> Result<ReportNarrative, EngineError> {
            Ok(ReportNarrative::default())
        }
    }

    fn session(score: f64) -> InterviewSession {
        InterviewSession::for_level(
            "Ada",
            PositionLevel::Beginner,
            &InterviewConfig::default(),
            Collaborators {
                questions: Arc::new(FixedSource),
                judge: Arc::new(FixedJudge(score)),
                interviewer: Arc::new(SilentInterviewer),
                reports: Arc::new(EmptyReports),
            },
        )
    }

    #[test]
    fn test_session_id_round_trip() {
        let id = SessionId::new();
        let parsed: SessionId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<SessionId>().is_err());
    }

    #[tokio::test]
    async fn test_start_uses_static_welcome_on_failure() {
        let mut session = session(0.5);
        let outcome = session.start().await.unwrap();

        assert_eq!(outcome.welcome_message, static_welcome("Ada", PositionLevel::Beginner));
        assert_eq!(outcome.question.index, 0);
        assert_eq!(outcome.question.skill_area, SkillArea::FormulaBasic);
        assert_eq!(outcome.question.format, QuestionFormat::OpenEnded);
        assert_eq!(outcome.question.difficulty, 0.25);
        assert_eq!(session.state(), SessionState::InProgress);
    }

    #[tokio::test]
    async fn test_start_twice_is_rejected() {
        let mut session = session(0.5);
        session.start().await.unwrap();
        let err = session.start().await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn test_answer_before_start_is_rejected() {
        let mut session = session(0.5);
        let err = session.submit_answer("anything").await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidState {
                expected: "in_progress",
                actual: "initialized"
            }
        ));
    }

    #[tokio::test]
    async fn test_judge_scale_is_normalized() {
        let mut session = session(7.0);
        session.start().await.unwrap();
        let outcome = session.submit_answer("my answer").await.unwrap();

        assert!((outcome.score - 0.7).abs() < 1e-12);
        assert_eq!(outcome.message, DEFAULT_FEEDBACK);
        // Area changed but the interviewer failed, so no transition
        assert_eq!(outcome.transition, None);
    }

    #[tokio::test]
    async fn test_run_to_completion_and_finalize() {
        let mut session = session(0.9);
        session.start().await.unwrap();

        let mut answers = 0;
        loop {
            let outcome = session.submit_answer("A").await.unwrap();
            answers += 1;
            if outcome.is_complete {
                assert_eq!(outcome.message, COMPLETION_MESSAGE);
                break;
            }
        }

        assert!(answers <= 8);
        assert_eq!(session.state(), SessionState::Completed);
        assert!(session.current_question().is_none());

        let err = session.submit_answer("late").await.unwrap_err();
        assert!(err.is_protocol_error());

        let report = session.finalize().await.unwrap();
        assert_eq!(report.questions_asked, answers);
        assert_eq!(report.candidate_name, "Ada");
    }

    #[tokio::test]
    async fn test_finalize_before_completion() {
        let mut session = session(0.5);
        session.start().await.unwrap();
        assert!(matches!(
            session.finalize().await,
            Err(EngineError::NotComplete)
        ));
    }
}
