//! Interview domain types
//!
//! Closed enumerations for position levels, skill areas, question formats and
//! option labels, plus the immutable question, answer and evaluation records
//! exchanged between the engine and collaborator implementations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Position level the candidate is assessed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl PositionLevel {
    pub const ALL: [PositionLevel; 3] = [
        PositionLevel::Beginner,
        PositionLevel::Intermediate,
        PositionLevel::Advanced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PositionLevel::Beginner => "beginner",
            PositionLevel::Intermediate => "intermediate",
            PositionLevel::Advanced => "advanced",
        }
    }
}

impl fmt::Display for PositionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PositionLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(PositionLevel::Beginner),
            "intermediate" => Ok(PositionLevel::Intermediate),
            "advanced" => Ok(PositionLevel::Advanced),
            other => Err(format!("unknown position level '{}'", other)),
        }
    }
}

/// Assessed skill area.
///
/// This is also the question-type tag handed to the question source, so the
/// lowest-scoring area can be asked about directly without any lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillArea {
    FormulaBasic,
    FormulaAdvanced,
    DataAnalysis,
    PivotTables,
    ChartsVisualization,
    DataValidation,
    MacrosVba,
    ScenarioBased,
    McqBasic,
    McqAdvanced,
}

impl SkillArea {
    pub const ALL: [SkillArea; 10] = [
        SkillArea::FormulaBasic,
        SkillArea::FormulaAdvanced,
        SkillArea::DataAnalysis,
        SkillArea::PivotTables,
        SkillArea::ChartsVisualization,
        SkillArea::DataValidation,
        SkillArea::MacrosVba,
        SkillArea::ScenarioBased,
        SkillArea::McqBasic,
        SkillArea::McqAdvanced,
    ];

    /// Wire identifier (snake_case)
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillArea::FormulaBasic => "formula_basic",
            SkillArea::FormulaAdvanced => "formula_advanced",
            SkillArea::DataAnalysis => "data_analysis",
            SkillArea::PivotTables => "pivot_tables",
            SkillArea::ChartsVisualization => "charts_visualization",
            SkillArea::DataValidation => "data_validation",
            SkillArea::MacrosVba => "macros_vba",
            SkillArea::ScenarioBased => "scenario_based",
            SkillArea::McqBasic => "mcq_basic",
            SkillArea::McqAdvanced => "mcq_advanced",
        }
    }

    /// Human-readable name used in prompts and reports
    pub fn display_name(&self) -> &'static str {
        match self {
            SkillArea::FormulaBasic => "Formula Basic",
            SkillArea::FormulaAdvanced => "Formula Advanced",
            SkillArea::DataAnalysis => "Data Analysis",
            SkillArea::PivotTables => "Pivot Tables",
            SkillArea::ChartsVisualization => "Charts Visualization",
            SkillArea::DataValidation => "Data Validation",
            SkillArea::MacrosVba => "Macros Vba",
            SkillArea::ScenarioBased => "Scenario Based",
            SkillArea::McqBasic => "Mcq Basic",
            SkillArea::McqAdvanced => "Mcq Advanced",
        }
    }

    /// Whether the area exists specifically to carry multiple-choice questions
    pub fn is_mcq_area(&self) -> bool {
        matches!(self, SkillArea::McqBasic | SkillArea::McqAdvanced)
    }
}

impl fmt::Display for SkillArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SkillArea {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SkillArea::ALL
            .into_iter()
            .find(|area| area.as_str() == s)
            .ok_or_else(|| format!("unknown skill area '{}'", s))
    }
}

/// Question format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionFormat {
    OpenEnded,
    MultipleChoice,
}

impl QuestionFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionFormat::OpenEnded => "open_ended",
            QuestionFormat::MultipleChoice => "multiple_choice",
        }
    }
}

impl fmt::Display for QuestionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label of one of the four multiple-choice options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChoiceLabel {
    A,
    B,
    C,
    D,
}

impl ChoiceLabel {
    pub const ALL: [ChoiceLabel; 4] = [ChoiceLabel::A, ChoiceLabel::B, ChoiceLabel::C, ChoiceLabel::D];

    pub fn as_char(&self) -> char {
        match self {
            ChoiceLabel::A => 'A',
            ChoiceLabel::B => 'B',
            ChoiceLabel::C => 'C',
            ChoiceLabel::D => 'D',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' => Some(ChoiceLabel::A),
            'B' => Some(ChoiceLabel::B),
            'C' => Some(ChoiceLabel::C),
            'D' => Some(ChoiceLabel::D),
            _ => None,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            ChoiceLabel::A => 0,
            ChoiceLabel::B => 1,
            ChoiceLabel::C => 2,
            ChoiceLabel::D => 3,
        }
    }
}

impl fmt::Display for ChoiceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for ChoiceLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => {
                ChoiceLabel::from_char(c).ok_or_else(|| format!("invalid option label '{}'", s))
            }
            _ => Err(format!("invalid option label '{}'", s)),
        }
    }
}

/// The four options of a multiple-choice question and its correct label.
///
/// Every option text starts with its label, e.g. `"B) =VLOOKUP(...)"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceSet {
    pub options: [String; 4],
    pub correct: ChoiceLabel,
}

impl ChoiceSet {
    /// Build a choice set from raw option strings and a correct label.
    ///
    /// Options without a leading `X)` / `X.` label are labelled by position.
    /// Fails unless there are exactly four non-empty options and the correct
    /// label is one of A to D.
    pub fn from_parts(options: Vec<String>, correct: &str) -> Result<Self, String> {
        if options.len() != 4 {
            return Err(format!("expected 4 options, got {}", options.len()));
        }
        let correct: ChoiceLabel = correct.parse()?;

        let mut labelled: [String; 4] = Default::default();
        for (label, (slot, raw)) in ChoiceLabel::ALL
            .into_iter()
            .zip(labelled.iter_mut().zip(options))
        {
            let raw = raw.trim();
            if raw.is_empty() {
                return Err(format!("option {} is empty", label));
            }
            *slot = if has_label_prefix(raw, label) {
                raw.to_string()
            } else {
                format!("{}) {}", label, raw)
            };
        }

        Ok(Self {
            options: labelled,
            correct,
        })
    }

    pub fn option(&self, label: ChoiceLabel) -> &str {
        &self.options[label.index()]
    }
}

fn has_label_prefix(option: &str, label: ChoiceLabel) -> bool {
    let mut chars = option.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some(c), Some(')' | '.' | ':')) if c.to_ascii_uppercase() == label.as_char()
    )
}

/// A question as produced by a question source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum GeneratedQuestion {
    OpenEnded { text: String },
    MultipleChoice { text: String, choices: ChoiceSet },
}

impl GeneratedQuestion {
    pub fn text(&self) -> &str {
        match self {
            GeneratedQuestion::OpenEnded { text } | GeneratedQuestion::MultipleChoice { text, .. } => {
                text
            }
        }
    }

    pub fn format(&self) -> QuestionFormat {
        match self {
            GeneratedQuestion::OpenEnded { .. } => QuestionFormat::OpenEnded,
            GeneratedQuestion::MultipleChoice { .. } => QuestionFormat::MultipleChoice,
        }
    }

    pub fn choices(&self) -> Option<&ChoiceSet> {
        match self {
            GeneratedQuestion::OpenEnded { .. } => None,
            GeneratedQuestion::MultipleChoice { choices, .. } => Some(choices),
        }
    }
}

/// A question that has been asked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub text: String,
    pub skill_area: SkillArea,
    /// Adaptive difficulty at the time the question was asked
    pub difficulty: f64,
    pub format: QuestionFormat,
    /// Present only for multiple-choice questions
    pub choices: Option<ChoiceSet>,
    pub asked_at: DateTime<Utc>,
}

impl QuestionRecord {
    pub fn new(question: GeneratedQuestion, skill_area: SkillArea, difficulty: f64) -> Self {
        let format = question.format();
        let (text, choices) = match question {
            GeneratedQuestion::OpenEnded { text } => (text, None),
            GeneratedQuestion::MultipleChoice { text, choices } => (text, Some(choices)),
        };

        Self {
            text,
            skill_area,
            difficulty,
            format,
            choices,
            asked_at: Utc::now(),
        }
    }

    pub fn options(&self) -> Option<&[String; 4]> {
        self.choices.as_ref().map(|c| &c.options)
    }

    pub fn correct_answer(&self) -> Option<ChoiceLabel> {
        self.choices.as_ref().map(|c| c.correct)
    }
}

/// Rubric sub-scores on a 0 to 10 scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RubricScores {
    pub technical_accuracy: f64,
    pub completeness: f64,
    pub practical_understanding: f64,
    pub communication_clarity: f64,
}

impl RubricScores {
    /// Derive the rubric from a single 0 to 10 quality score
    pub fn from_quality(quality: f64) -> Self {
        Self {
            technical_accuracy: quality,
            completeness: (quality - 1.0).max(0.0),
            practical_understanding: (quality - 0.5).max(0.0),
            communication_clarity: (quality + 1.0).min(10.0),
        }
    }
}

fn neutral_score() -> f64 {
    0.5
}

/// Verdict on one answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Score in [0, 1] once normalized
    #[serde(default = "neutral_score")]
    pub overall_score: f64,

    #[serde(default)]
    pub is_mcq: bool,

    #[serde(default)]
    pub strengths: Vec<String>,

    #[serde(default)]
    pub areas_for_improvement: Vec<String>,

    #[serde(default)]
    pub feedback: String,

    #[serde(default)]
    pub follow_up_suggestions: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rubric: Option<RubricScores>,

    /// Multiple choice only: the label the candidate picked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_answer: Option<ChoiceLabel>,

    /// Multiple choice only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
}

impl Evaluation {
    /// Minimal evaluation carrying only a score
    pub fn with_score(overall_score: f64, is_mcq: bool) -> Self {
        Self {
            overall_score,
            is_mcq,
            strengths: Vec::new(),
            areas_for_improvement: Vec::new(),
            feedback: String::new(),
            follow_up_suggestions: Vec::new(),
            rubric: None,
            selected_answer: None,
            is_correct: None,
        }
    }

    /// Force `overall_score` into [0, 1]
    pub fn normalized(mut self) -> Self {
        self.overall_score = normalize_score(self.overall_score);
        self
    }
}

/// Map a judge score onto [0, 1].
///
/// Non-finite values become the neutral 0.5, values on a 0 to 10 scale are
/// divided by ten, and the result is clamped.
pub fn normalize_score(score: f64) -> f64 {
    if !score.is_finite() {
        return neutral_score();
    }
    let score = if score > 1.0 && score <= 10.0 {
        score / 10.0
    } else {
        score
    };
    score.clamp(0.0, 1.0)
}

/// An answer that has been evaluated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub answer: String,
    pub evaluation: Evaluation,
    /// Index of the question this answers
    pub question_index: usize,
    pub answered_at: DateTime<Utc>,
}

/// Lifecycle state of an interview session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Initialized,
    InProgress,
    Completed,
    Failed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Initialized => "initialized",
            SessionState::InProgress => "in_progress",
            SessionState::Completed => "completed",
            SessionState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Failed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
