//! Integration tests for the model-backed collaborators
//!
//! Each collaborator talks to a mock Ollama endpoint through the router.

use serde_json::json;
use std::sync::Arc;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

use gauge_engine::catalog::DifficultyBand;
use gauge_engine::config::{InterviewConfig, LLMConfig};
use gauge_engine::interviewer::questions::fallback_mcq;
use gauge_engine::interviewer::{
    self, LlmAnswerJudge, LlmClient, LlmQuestionSource, LlmReportCompiler,
};
use gauge_engine::llm::{ollama::OllamaProvider, router::LLMRouter, LLMProvider};
use gauge_engine::session::InterviewSession;
use sdk::collaborator::{
    AnswerJudge, JudgeRequest, QuestionContext, QuestionRequest, QuestionSource, ReportCompiler,
    ReportInput,
};
use sdk::report::ReportNarrative;
use sdk::types::{
    ChoiceLabel, GeneratedQuestion, PositionLevel, QuestionFormat, SessionState, SkillArea,
};

async fn mock_ollama(content: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "llama3.1:8b",
            "message": { "role": "assistant", "content": content },
            "done": true
        })))
        .mount(&server)
        .await;
    server
}

async fn failing_ollama() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    server
}

fn router(server: &MockServer) -> Arc<LLMRouter> {
    let providers: Vec<Box<dyn LLMProvider>> =
        vec![Box::new(OllamaProvider::new(server.uri(), "llama3.1:8b"))];
    let config = LLMConfig {
        default_provider: "ollama".to_string(),
        provider_timeout_secs: 5,
        ..LLMConfig::default()
    };
    Arc::new(LLMRouter::new(providers, Arc::new(config)))
}

fn client(server: &MockServer) -> LlmClient {
    LlmClient::new(router(server))
}

fn question_request(area: SkillArea, format: QuestionFormat) -> QuestionRequest {
    QuestionRequest {
        skill_area: area,
        difficulty: 0.25,
        format,
        context: QuestionContext {
            position_level: PositionLevel::Beginner,
            previous_questions: vec!["What does SUM do?".to_string()],
            performance: vec![(SkillArea::FormulaBasic, 0.9)],
        },
    }
}

#[tokio::test]
async fn test_multiple_choice_from_model() {
    let reply = r#"Here you go:
```json
{"question": "Which function counts non-empty cells?",
 "options": ["A) COUNT", "B) COUNTA", "C) COUNTBLANK", "D) SUM"],
 "correct_answer": "B)"}
```"#;
    let server = mock_ollama(reply).await;
    let source = LlmQuestionSource::new(client(&server));

    let question = source
        .generate_question(&question_request(
            SkillArea::FormulaBasic,
            QuestionFormat::MultipleChoice,
        ))
        .await
        .unwrap();

    let choices = question.choices().unwrap();
    assert_eq!(question.text(), "Which function counts non-empty cells?");
    assert_eq!(choices.correct, ChoiceLabel::B);
    assert_eq!(choices.option(ChoiceLabel::B), "B) COUNTA");
}

#[tokio::test]
async fn test_malformed_multiple_choice_uses_fallback() {
    let server = mock_ollama("Sorry, I cannot produce options right now.").await;
    let source = LlmQuestionSource::new(client(&server));

    let question = source
        .generate_question(&question_request(
            SkillArea::DataAnalysis,
            QuestionFormat::MultipleChoice,
        ))
        .await
        .unwrap();

    assert_eq!(
        question,
        fallback_mcq(SkillArea::DataAnalysis, DifficultyBand::Beginner)
    );
}

#[tokio::test]
async fn test_open_ended_question_is_cleaned() {
    let server =
        mock_ollama("Here's a question: **How would you** total sales per region?").await;
    let source = LlmQuestionSource::new(client(&server));

    let question = source
        .generate_question(&question_request(
            SkillArea::DataAnalysis,
            QuestionFormat::OpenEnded,
        ))
        .await
        .unwrap();

    match question {
        GeneratedQuestion::OpenEnded { text } => {
            assert!(!text.contains('*'));
            assert!(text.contains("total sales per region"));
        }
        other => panic!("expected open-ended question, got {:?}", other),
    }
}

#[tokio::test]
async fn test_provider_failure_propagates_from_question_source() {
    let server = failing_ollama().await;
    let source = LlmQuestionSource::new(client(&server));

    let result = source
        .generate_question(&question_request(
            SkillArea::FormulaBasic,
            QuestionFormat::OpenEnded,
        ))
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_open_ended_judgement() {
    let server = mock_ollama(
        r#"{"score": 8, "feedback": "Clear use of SUMIFS.", "strengths": ["Precise"]}"#,
    )
    .await;
    let judge = LlmAnswerJudge::new(client(&server));

    let evaluation = judge
        .evaluate_answer(&JudgeRequest {
            question: "How would you total sales per region?".to_string(),
            answer: "I would use SUMIFS with the region column as the criteria range."
                .to_string(),
            skill_area: SkillArea::DataAnalysis,
            difficulty: 0.5,
            format: QuestionFormat::OpenEnded,
            choices: None,
        })
        .await
        .unwrap();

    assert!((evaluation.overall_score - 0.8).abs() < 1e-9);
    assert_eq!(evaluation.feedback, "Clear use of SUMIFS.");
    assert_eq!(evaluation.strengths, vec!["Precise".to_string()]);
    assert!(!evaluation.areas_for_improvement.is_empty());
    assert!(!evaluation.is_mcq);
}

#[tokio::test]
async fn test_report_falls_back_when_provider_fails() {
    let server = failing_ollama().await;
    let compiler = LlmReportCompiler::new(client(&server));

    let summary = gauge_engine::scoring::aggregate(std::iter::empty::<(SkillArea, &sdk::types::Evaluation)>());
    let narrative: ReportNarrative = compiler
        .compile_report(&ReportInput {
            candidate_name: "Ada".to_string(),
            position_level: PositionLevel::Beginner,
            duration_secs: 12.0,
            summary,
            questions: Vec::new(),
            answers: Vec::new(),
        })
        .await
        .unwrap();

    assert!(!narrative.interview_summary.is_empty());
    assert!(!narrative.next_steps.is_empty());
}

#[tokio::test]
async fn test_full_interview_against_mock_model() {
    let reply = r#"{"question": "Which function adds a range?",
        "options": ["SUM", "AVERAGE", "COUNT", "MAX"],
        "correct_answer": "A",
        "score": 7,
        "feedback": "Reasonable approach."}"#;
    let server = mock_ollama(reply).await;

    let mut session = InterviewSession::for_level(
        "Ada",
        PositionLevel::Beginner,
        &InterviewConfig::default(),
        interviewer::collaborators(router(&server)),
    );

    session.start().await.unwrap();
    loop {
        let answer = match session.current_question().unwrap().format {
            QuestionFormat::MultipleChoice => "A",
            QuestionFormat::OpenEnded => "I would sum the column with =SUM(B2:B20) and check totals.",
        };
        if session.submit_answer(answer).await.unwrap().is_complete {
            break;
        }
    }

    assert_eq!(session.state(), SessionState::Completed);
    let report = session.finalize().await.unwrap();
    assert_eq!(report.questions_asked, 6);
    assert!(report.summary.mcq_average.unwrap() > 0.99);
    assert!(!report.narrative.skill_assessments.is_empty());
}
