//! Question generation
//!
//! Open-ended questions come back as prose and are cleaned of the usual model
//! preambles. Multiple-choice questions are requested as JSON; anything that
//! does not parse into a question with exactly four options and a valid label
//! is replaced by a fixed question for the same area.

use super::{spoken, strip_any_prefix, LlmClient};
use crate::catalog::{self, DifficultyBand};
use crate::llm::extract_json_object;
use async_trait::async_trait;
use sdk::collaborator::{QuestionContext, QuestionRequest, QuestionSource};
use sdk::errors::EngineError;
use sdk::types::{ChoiceSet, GeneratedQuestion, QuestionFormat, SkillArea};
use tracing::warn;

const OPEN_ENDED_TEMPERATURE: f32 = 0.7;
const OPEN_ENDED_MAX_TOKENS: u32 = 400;
const MCQ_TEMPERATURE: f32 = 0.7;
const MCQ_MAX_TOKENS: u32 = 500;

/// Previous questions quoted back to the model to avoid repeats
const RECENT_QUESTIONS: usize = 3;

const PREAMBLES: [&str; 9] = [
    "Here's your intermediate difficulty question:",
    "Here's your beginner difficulty question:",
    "Here's your advanced difficulty question:",
    "Here's a question:",
    "**Question:**",
    "Question:",
    "Here's your question:",
    "Here is a",
    "Here's a",
];

pub struct LlmQuestionSource {
    client: LlmClient,
}

impl LlmQuestionSource {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }

    async fn open_ended(&self, request: &QuestionRequest) -> Result<GeneratedQuestion, EngineError> {
        let band = DifficultyBand::from_difficulty(request.difficulty);
        let raw = self
            .client
            .prompt(
                open_ended_prompt(request, band),
                OPEN_ENDED_TEMPERATURE,
                OPEN_ENDED_MAX_TOKENS,
            )
            .await?;

        let text = clean_question_text(&raw);
        if text.is_empty() {
            warn!(
                "Empty open-ended question for {}, using fallback",
                request.skill_area
            );
            return Ok(fallback_open_ended(request));
        }

        Ok(GeneratedQuestion::OpenEnded { text })
    }

    async fn multiple_choice(
        &self,
        request: &QuestionRequest,
    ) -> Result<GeneratedQuestion, EngineError> {
        let band = DifficultyBand::from_difficulty(request.difficulty);
        let raw = self
            .client
            .prompt(mcq_prompt(request, band), MCQ_TEMPERATURE, MCQ_MAX_TOKENS)
            .await?;

        match parse_mcq(&raw) {
            Ok(question) => Ok(question),
            Err(reason) => {
                warn!(
                    "Malformed multiple-choice question for {} ({}), using fallback",
                    request.skill_area, reason
                );
                Ok(fallback_mcq(request.skill_area, band))
            }
        }
    }
}

#[async_trait]
impl QuestionSource for LlmQuestionSource {
    async fn generate_question(
        &self,
        request: &QuestionRequest,
    ) -> Result<GeneratedQuestion, EngineError> {
        match request.format {
            QuestionFormat::OpenEnded => self.open_ended(request).await,
            QuestionFormat::MultipleChoice => self.multiple_choice(request).await,
        }
    }
}

fn complexity(band: DifficultyBand) -> (&'static str, &'static str) {
    match band {
        DifficultyBand::Beginner => (
            "Keep the scenario simple with basic data. Focus on fundamental concepts.",
            "Example: A small table with 10-20 rows of data.",
        ),
        DifficultyBand::Intermediate => (
            "Use moderate complexity with realistic business scenarios.",
            "Example: A dataset with 50-100 rows requiring multiple steps.",
        ),
        DifficultyBand::Advanced => (
            "Create complex, multi-step scenarios requiring advanced techniques.",
            "Example: Large datasets with multiple conditions and advanced formulas.",
        ),
    }
}

/// Short description of past performance for the prompt
fn performance_note(context: &QuestionContext) -> String {
    let strong: Vec<String> = context
        .performance
        .iter()
        .filter(|(_, score)| *score > 0.7)
        .map(|(area, _)| spoken(*area))
        .collect();
    let weak: Vec<String> = context
        .performance
        .iter()
        .filter(|(_, score)| *score < 0.5)
        .map(|(area, _)| spoken(*area))
        .collect();

    let mut parts = Vec::new();
    if !strong.is_empty() {
        parts.push(format!("Strong in: {}", strong.join(", ")));
    }
    if !weak.is_empty() {
        parts.push(format!("Needs improvement in: {}", weak.join(", ")));
    }
    if parts.is_empty() {
        "Consistent performance".to_string()
    } else {
        parts.join("; ")
    }
}

fn recent_questions(context: &QuestionContext) -> String {
    let skip = context
        .previous_questions
        .len()
        .saturating_sub(RECENT_QUESTIONS);
    let recent: Vec<String> = context.previous_questions[skip..]
        .iter()
        .map(|q| format!("- {}", q.lines().next().unwrap_or_default()))
        .collect();

    if recent.is_empty() {
        "None".to_string()
    } else {
        recent.join("\n")
    }
}

fn open_ended_prompt(request: &QuestionRequest, band: DifficultyBand) -> String {
    let level = request.context.position_level;
    let topics = catalog::topics(request.skill_area, level).join(", ");
    let (complexity, example) = complexity(band);

    format!(
        r#"Create a clear, well-structured Excel question for {area} at {band} difficulty level.

Skill Focus: {topics}
Difficulty: {band} ({complexity})
Position Level: {level}
Candidate so far: {performance}
Do not repeat these earlier questions:
{recent}

Requirements:
1. Start with a clear business scenario
2. Provide specific data context (column names, data types, row counts)
3. Ask for a specific solution with explanation
4. {example}
5. End with "Please explain your approach and the formulas you would use."

Format:
- Use clear paragraphs
- No meta-commentary or prefixes
- No asterisks or formatting markers
- Return ONLY the question content"#,
        area = spoken(request.skill_area),
        band = band,
        topics = topics,
        complexity = complexity,
        level = level,
        performance = performance_note(&request.context),
        recent = recent_questions(&request.context),
        example = example,
    )
}

fn mcq_prompt(request: &QuestionRequest, band: DifficultyBand) -> String {
    let level = request.context.position_level;
    let topics = catalog::topics(request.skill_area, level).join(", ");

    format!(
        r#"Create a multiple choice question for Excel skills at {band} difficulty level.

Skill Focus: {area} - {topics}
Difficulty: {band}
Position Level: {level}
Do not repeat these earlier questions:
{recent}

Requirements:
1. Create a clear, practical Excel question
2. Provide exactly 4 answer options (A, B, C, D)
3. Make sure only ONE option is clearly correct
4. Include plausible but incorrect distractors
5. Focus on real-world Excel scenarios

Return your response in this exact JSON format:
{{
    "question": "Your question text here",
    "options": ["A) First option", "B) Second option", "C) Third option", "D) Fourth option"],
    "correct_answer": "A"
}}"#,
        band = band,
        area = spoken(request.skill_area),
        topics = topics,
        level = level,
        recent = recent_questions(&request.context),
    )
}

/// Strip preambles and markdown emphasis from an open-ended question
pub fn clean_question_text(raw: &str) -> String {
    let text = strip_any_prefix(raw.trim(), &PREAMBLES);
    let text = text.replace("**", "").replace('*', "");
    text.replace("  ", " ").trim().to_string()
}

/// Parse the model's JSON reply into a multiple-choice question
pub fn parse_mcq(raw: &str) -> Result<GeneratedQuestion, String> {
    let value = extract_json_object(raw).ok_or("no JSON object in reply")?;

    let text = value
        .get("question")
        .and_then(|q| q.as_str())
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .ok_or("missing question text")?;

    let options = value
        .get("options")
        .and_then(|o| o.as_array())
        .ok_or("missing options")?
        .iter()
        .map(|o| o.as_str().map(str::to_string).ok_or("non-string option"))
        .collect::<Result<Vec<_>, _>>()?;

    let correct = value
        .get("correct_answer")
        .and_then(|c| c.as_str())
        .ok_or("missing correct_answer")?
        .trim()
        .trim_end_matches([')', '.']);

    let choices = ChoiceSet::from_parts(options, correct)?;
    Ok(GeneratedQuestion::MultipleChoice { text, choices })
}

/// Generic open-ended question used when the model returns nothing usable
pub fn fallback_open_ended(request: &QuestionRequest) -> GeneratedQuestion {
    let topic = catalog::topics(request.skill_area, request.context.position_level)
        .first()
        .copied()
        .unwrap_or("everyday spreadsheet work");

    GeneratedQuestion::OpenEnded {
        text: format!(
            "You maintain a sales workbook with columns Date, Region, Product, Units and Revenue. \
             Describe how you would apply {} to answer a question your manager asks about this data. \
             Please explain your approach and the formulas you would use.",
            topic
        ),
    }
}

/// Fixed multiple-choice question for an area and difficulty band
pub fn fallback_mcq(area: SkillArea, band: DifficultyBand) -> GeneratedQuestion {
    let key = match area {
        SkillArea::McqBasic if band == DifficultyBand::Advanced => SkillArea::FormulaAdvanced,
        SkillArea::McqBasic | SkillArea::ScenarioBased => SkillArea::FormulaBasic,
        SkillArea::McqAdvanced if band == DifficultyBand::Advanced => SkillArea::MacrosVba,
        SkillArea::McqAdvanced => SkillArea::PivotTables,
        other => other,
    };

    let (text, options, correct): (&str, [&str; 4], &str) = match key {
        SkillArea::DataAnalysis => (
            "What is the keyboard shortcut to apply an AutoFilter to a data range in Excel?",
            ["A) Ctrl+Shift+L", "B) Ctrl+Alt+F", "C) Ctrl+F", "D) Alt+D+F"],
            "A",
        ),
        SkillArea::FormulaAdvanced => (
            "Which formula returns the price from column B for the product code in E2, requiring an exact match in column A?",
            [
                "A) =VLOOKUP(E2,A:B,2,TRUE)",
                "B) =VLOOKUP(E2,A:B,2,FALSE)",
                "C) =HLOOKUP(E2,A:B,2,FALSE)",
                "D) =LOOKUP(E2,B:B)",
            ],
            "B",
        ),
        SkillArea::PivotTables => (
            "In the PivotTable Fields pane, which area do you drag a numeric field into to have it summed?",
            ["A) Filters", "B) Columns", "C) Values", "D) Rows"],
            "C",
        ),
        SkillArea::ChartsVisualization => (
            "Which chart type is best suited to showing monthly revenue trends over two years?",
            ["A) Pie chart", "B) Line chart", "C) Doughnut chart", "D) Radar chart"],
            "B",
        ),
        SkillArea::DataValidation => (
            "How do you restrict a cell so users can only pick values from a drop-down list?",
            [
                "A) Data > Data Validation > Allow: List",
                "B) Home > Conditional Formatting",
                "C) Review > Protect Sheet",
                "D) Formulas > Define Name",
            ],
            "A",
        ),
        SkillArea::MacrosVba => (
            "Which file format must a workbook use to keep its VBA macros when saved?",
            ["A) .xlsx", "B) .csv", "C) .xltx", "D) .xlsm"],
            "D",
        ),
        _ => (
            "Which Excel function would you use to calculate the average of values in cells A1 through A10?",
            [
                "A) =AVERAGE(A1:A10)",
                "B) =AVG(A1:A10)",
                "C) =MEAN(A1:A10)",
                "D) =SUM(A1:A10)/10",
            ],
            "A",
        ),
    };

    match ChoiceSet::from_parts(options.iter().map(|o| o.to_string()).collect(), correct) {
        Ok(choices) => GeneratedQuestion::MultipleChoice {
            text: text.to_string(),
            choices,
        },
        // The bank above is always well formed
        Err(_) => GeneratedQuestion::OpenEnded {
            text: text.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdk::types::{ChoiceLabel, PositionLevel};

    fn request(area: SkillArea, format: QuestionFormat) -> QuestionRequest {
        QuestionRequest {
            skill_area: area,
            difficulty: 0.55,
            format,
            context: QuestionContext {
                position_level: PositionLevel::Intermediate,
                previous_questions: vec![],
                performance: vec![],
            },
        }
    }

    #[test]
    fn test_clean_question_text() {
        let raw = "Here's your beginner difficulty question: You have a **sales** table.  Use *SUM*.";
        assert_eq!(
            clean_question_text(raw),
            "You have a sales table. Use SUM."
        );
        assert_eq!(clean_question_text("**Question:** What is A1?"), "What is A1?");
    }

    #[test]
    fn test_parse_mcq_adds_missing_labels() {
        let raw = r#"Sure! {"question": "Pick one", "options": ["=SUM", "=AVG", "=MEAN", "=ADD"], "correct_answer": "a"}"#;
        let question = parse_mcq(raw).unwrap();

        let choices = question.choices().unwrap();
        assert_eq!(choices.options[0], "A) =SUM");
        assert_eq!(choices.correct, ChoiceLabel::A);
        assert_eq!(question.text(), "Pick one");
    }

    #[test]
    fn test_parse_mcq_rejects_malformed_output() {
        assert!(parse_mcq("no json here").is_err());
        assert!(parse_mcq(r#"{"question": "Q", "options": ["A) 1", "B) 2", "C) 3"], "correct_answer": "A"}"#).is_err());
        assert!(parse_mcq(r#"{"question": "Q", "options": ["A) 1", "B) 2", "C) 3", "D) 4"], "correct_answer": "E"}"#).is_err());
        assert!(parse_mcq(r#"{"question": " ", "options": ["A) 1", "B) 2", "C) 3", "D) 4"], "correct_answer": "A"}"#).is_err());
    }

    #[test]
    fn test_fallbacks_are_well_formed() {
        for area in SkillArea::ALL {
            for band in [
                DifficultyBand::Beginner,
                DifficultyBand::Intermediate,
                DifficultyBand::Advanced,
            ] {
                let question = fallback_mcq(area, band);
                assert_eq!(question.format(), QuestionFormat::MultipleChoice);
            }
        }

        let average = fallback_mcq(SkillArea::FormulaBasic, DifficultyBand::Beginner);
        assert!(average.text().contains("average"));
        assert_eq!(average.choices().unwrap().correct, ChoiceLabel::A);

        let filter = fallback_mcq(SkillArea::DataAnalysis, DifficultyBand::Beginner);
        assert!(filter.text().contains("AutoFilter"));
    }

    #[test]
    fn test_prompts_mention_topics_and_band() {
        let req = request(SkillArea::PivotTables, QuestionFormat::OpenEnded);
        let prompt = open_ended_prompt(&req, DifficultyBand::Intermediate);
        assert!(prompt.contains("pivot tables at intermediate difficulty"));
        assert!(prompt.contains("grouping data"));

        let prompt = mcq_prompt(&req, DifficultyBand::Intermediate);
        assert!(prompt.contains("\"correct_answer\""));
    }

    #[test]
    fn test_performance_note() {
        let mut context = request(SkillArea::FormulaBasic, QuestionFormat::OpenEnded).context;
        assert_eq!(performance_note(&context), "Consistent performance");

        context.performance = vec![
            (SkillArea::FormulaBasic, 0.9),
            (SkillArea::DataAnalysis, 0.2),
        ];
        assert_eq!(
            performance_note(&context),
            "Strong in: formula basic; Needs improvement in: data analysis"
        );
    }
}
