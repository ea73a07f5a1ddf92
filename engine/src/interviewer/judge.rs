//! Answer judging
//!
//! Multiple-choice answers are scored locally against the stored label.
//! Open-ended answers go to the model, which is asked for a JSON verdict with
//! a 0 to 10 score; whatever it leaves out is filled from score-band templates.

use super::{spoken, LlmClient};
use crate::llm::extract_json_object;
use async_trait::async_trait;
use regex::Regex;
use sdk::collaborator::{AnswerJudge, JudgeRequest};
use sdk::errors::EngineError;
use sdk::types::{normalize_score, ChoiceLabel, ChoiceSet, Evaluation, RubricScores, SkillArea};
use serde_json::Value;
use std::sync::OnceLock;
use tracing::warn;

const JUDGE_TEMPERATURE: f32 = 0.3;
const JUDGE_MAX_TOKENS: u32 = 600;

/// Score used when the reply carries no number at all
const NEUTRAL_QUALITY: f64 = 5.0;

/// Answers shorter than this cannot score above `SHORT_ANSWER_CAP`
const SHORT_ANSWER_CHARS: usize = 10;
const SHORT_ANSWER_CAP: f64 = 2.0;

static LABEL_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
static NUMBER_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

fn label_patterns() -> &'static [Regex] {
    LABEL_PATTERNS.get_or_init(|| {
        [
            r"^([ABCD])\)",
            r"^([ABCD])\.",
            r"^\(([ABCD])\)",
            r"^([ABCD])$",
            r"OPTION\s+([ABCD])",
            r"ANSWER\s+([ABCD])",
            r"([ABCD])\s*[-:]",
            r"^([ABCD])\b",
        ]
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
    })
}

fn number_pattern() -> Option<&'static Regex> {
    NUMBER_PATTERN
        .get_or_init(|| Regex::new(r"\d+(?:\.\d+)?").ok())
        .as_ref()
}

pub struct LlmAnswerJudge {
    client: LlmClient,
}

impl LlmAnswerJudge {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }

    async fn open_ended(&self, request: &JudgeRequest) -> Result<Evaluation, EngineError> {
        let raw = self
            .client
            .prompt(judge_prompt(request), JUDGE_TEMPERATURE, JUDGE_MAX_TOKENS)
            .await?;
        Ok(evaluation_from_reply(&raw, &request.answer, request.skill_area))
    }
}

#[async_trait]
impl AnswerJudge for LlmAnswerJudge {
    async fn evaluate_answer(&self, request: &JudgeRequest) -> Result<Evaluation, EngineError> {
        match &request.choices {
            Some(choices) => Ok(judge_choice(&request.answer, choices, request.skill_area)),
            None => self.open_ended(request).await,
        }
    }
}

/// Pick the option label out of a free-form answer. Defaults to A.
pub fn extract_choice(answer: &str) -> ChoiceLabel {
    let answer = answer.trim().to_uppercase();

    for pattern in label_patterns() {
        if let Some(label) = pattern
            .captures(&answer)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().chars().next())
            .and_then(ChoiceLabel::from_char)
        {
            return label;
        }
    }

    ChoiceLabel::ALL
        .into_iter()
        .find(|label| answer.contains(label.as_char()))
        .unwrap_or(ChoiceLabel::A)
}

/// Score a multiple-choice answer against the stored label
pub fn judge_choice(answer: &str, choices: &ChoiceSet, area: SkillArea) -> Evaluation {
    let selected = extract_choice(answer);
    let is_correct = selected == choices.correct;
    let score = if is_correct { 1.0 } else { 0.0 };
    let area_name = spoken(area);

    let mut evaluation = Evaluation::with_score(score, true);
    evaluation.selected_answer = Some(selected);
    evaluation.is_correct = Some(is_correct);
    evaluation.rubric = Some(RubricScores {
        technical_accuracy: score * 10.0,
        completeness: score * 10.0,
        practical_understanding: score * 10.0,
        communication_clarity: 10.0,
    });

    if is_correct {
        evaluation.feedback = format!(
            "Correct! You selected the right answer for this {} question.",
            area_name
        );
        evaluation.strengths = strings(&[
            "Accurate knowledge demonstrated",
            "Correct understanding of the concept",
        ]);
        evaluation.areas_for_improvement = strings(&[
            "Continue building on this knowledge",
            "Practice similar concepts",
        ]);
        evaluation.follow_up_suggestions = strings(&[
            "Continue practicing similar questions",
            "Build on this knowledge with more advanced topics",
            "Apply this concept in practical scenarios",
        ]);
    } else {
        evaluation.feedback = format!(
            "Incorrect. The correct answer was {}. This {} question tests fundamental knowledge.",
            choices.correct, area_name
        );
        evaluation.strengths = strings(&["Attempted the question", "Engaged with the material"]);
        evaluation.areas_for_improvement = strings(&[
            "Review this concept area",
            "Practice more questions on this topic",
            "Study the fundamentals",
        ]);
        evaluation.follow_up_suggestions = vec![
            format!("Review {} fundamentals", area_name),
            "Practice more multiple choice questions on this topic".to_string(),
            "Study Excel documentation for this concept".to_string(),
            "Try hands-on practice with Excel".to_string(),
        ];
    }

    evaluation
}

fn judge_prompt(request: &JudgeRequest) -> String {
    format!(
        r#"Evaluate this Excel skills answer.

QUESTION: {question}
ANSWER: {answer}
SKILL AREA: {area}

Rate the answer from 0 to 10 considering technical accuracy of Excel knowledge,
completeness of the response, practical understanding and quality of explanation:
0-2 = Very poor/incorrect
3-4 = Poor with major issues
5-6 = Average/basic understanding
7-8 = Good with solid knowledge
9-10 = Excellent/expert level

Respond in this exact JSON format:
{{
    "score": 7,
    "feedback": "Two sentences specific to this answer",
    "strengths": ["strength"],
    "areas_for_improvement": ["improvement"],
    "follow_up_suggestions": ["suggestion"]
}}

If the answer is weak, be honest about its deficiencies."#,
        question = request.question,
        answer = request.answer,
        area = spoken(request.skill_area),
    )
}

/// Turn the model's reply into a complete, normalized evaluation
pub fn evaluation_from_reply(raw: &str, answer: &str, area: SkillArea) -> Evaluation {
    let parsed = extract_json_object(raw);

    let quality = match parsed.as_ref().and_then(score_field) {
        Some(score) => score,
        None => {
            if parsed.is_some() {
                warn!("Judge reply for {} has no score field", area);
            } else {
                warn!("Judge reply for {} is not JSON, reading first number", area);
            }
            first_number(raw).unwrap_or(NEUTRAL_QUALITY)
        }
    };

    let mut quality = if quality.is_finite() {
        quality.clamp(0.0, 10.0)
    } else {
        NEUTRAL_QUALITY
    };
    if answer.trim().chars().count() < SHORT_ANSWER_CHARS {
        quality = quality.min(SHORT_ANSWER_CAP);
    }

    let mut evaluation = Evaluation::with_score(normalize_score(quality / 10.0), false);
    evaluation.rubric = Some(RubricScores::from_quality(quality));
    evaluation.feedback = field(&parsed, "feedback")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| feedback_for(quality, area));
    evaluation.strengths = string_list(field(&parsed, "strengths"))
        .unwrap_or_else(|| strings(strengths_for(quality)));
    evaluation.areas_for_improvement = string_list(field(&parsed, "areas_for_improvement"))
        .unwrap_or_else(|| strings(improvements_for(quality)));
    evaluation.follow_up_suggestions = string_list(field(&parsed, "follow_up_suggestions"))
        .unwrap_or_else(|| strings(suggestions_for(quality)));

    evaluation
}

fn field<'a>(parsed: &'a Option<Value>, name: &str) -> Option<&'a Value> {
    parsed.as_ref().and_then(|value| value.get(name))
}

fn score_field(value: &Value) -> Option<f64> {
    if let Some(score) = value.get("score").and_then(Value::as_f64) {
        return Some(score);
    }
    // Some models answer with the unit-scale field instead
    value
        .get("overall_score")
        .and_then(Value::as_f64)
        .map(|s| if s <= 1.0 { s * 10.0 } else { s })
}

fn first_number(text: &str) -> Option<f64> {
    number_pattern()?
        .find(text)
        .and_then(|m| m.as_str().parse().ok())
}

fn string_list(value: Option<&Value>) -> Option<Vec<String>> {
    let items: Vec<String> = value?
        .as_array()?
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn strengths_for(quality: f64) -> &'static [&'static str] {
    if quality >= 8.0 {
        &[
            "Excellent technical knowledge",
            "Clear and detailed explanation",
            "Practical approach demonstrated",
        ]
    } else if quality >= 6.0 {
        &[
            "Good understanding of concepts",
            "Adequate explanation provided",
            "Shows practical awareness",
        ]
    } else if quality >= 4.0 {
        &[
            "Basic understanding shown",
            "Attempted to address the question",
            "Some relevant points made",
        ]
    } else {
        &["Participated in the assessment", "Provided a response"]
    }
}

fn improvements_for(quality: f64) -> &'static [&'static str] {
    if quality >= 8.0 {
        &[
            "Could explore more advanced techniques",
            "Consider edge cases in solutions",
        ]
    } else if quality >= 6.0 {
        &[
            "Could provide more detailed explanations",
            "Practice more complex scenarios",
        ]
    } else if quality >= 4.0 {
        &[
            "Need to improve technical accuracy",
            "Should provide more complete explanations",
            "Practice fundamental concepts",
        ]
    } else {
        &[
            "Requires significant improvement in Excel knowledge",
            "Need to study basic Excel functions",
            "Should practice with guided tutorials",
        ]
    }
}

fn suggestions_for(quality: f64) -> &'static [&'static str] {
    if quality >= 8.0 {
        &[
            "Explore advanced Excel features",
            "Consider teaching others these concepts",
        ]
    } else if quality >= 6.0 {
        &[
            "Practice explaining solutions step-by-step",
            "Try more complex scenarios",
        ]
    } else if quality >= 4.0 {
        &[
            "Review Excel documentation for this topic",
            "Practice with simpler examples first",
        ]
    } else {
        &[
            "Start with basic Excel tutorials",
            "Practice fundamental concepts daily",
            "Consider taking a structured Excel course",
        ]
    }
}

fn feedback_for(quality: f64, area: SkillArea) -> String {
    let skill = area.display_name();
    if quality >= 8.0 {
        format!("Excellent work on this {} question! Your answer demonstrates strong technical knowledge and practical understanding.", skill)
    } else if quality >= 6.0 {
        format!("Good response to this {} question. You show solid understanding with room for more detail in your explanations.", skill)
    } else if quality >= 4.0 {
        format!("Your answer shows basic understanding of {}, but there are some technical inaccuracies that need attention.", skill)
    } else {
        format!("This {} answer needs significant improvement. The response shows limited understanding of the concepts involved.", skill)
    }
}
