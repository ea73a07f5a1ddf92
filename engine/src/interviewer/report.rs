//! Report narrative
//!
//! Per-skill assessments are always templated from the blended scores. The
//! overall insights come from the model as JSON; when that is unusable (or
//! the model is unreachable) a narrative keyed on the overall score band is
//! written instead, so a completed interview always gets a report.

use super::{spoken, LlmClient};
use crate::llm::extract_json_object;
use async_trait::async_trait;
use sdk::collaborator::{ReportCompiler, ReportInput};
use sdk::errors::EngineError;
use sdk::report::{ReportNarrative, ScoreSummary, SkillAssessment, SkillBreakdown, SkillLevel};
use serde::Deserialize;
use tracing::warn;

const INSIGHTS_TEMPERATURE: f32 = 0.4;
const INSIGHTS_MAX_TOKENS: u32 = 600;

/// Insights section as returned by the model
#[derive(Debug, Deserialize)]
struct Insights {
    key_strengths: Vec<String>,
    improvement_recommendations: Vec<String>,
    next_steps: Vec<String>,
    interview_summary: String,
}

impl Insights {
    fn is_usable(&self) -> bool {
        !self.key_strengths.is_empty()
            && !self.improvement_recommendations.is_empty()
            && !self.next_steps.is_empty()
            && !self.interview_summary.trim().is_empty()
    }
}

pub struct LlmReportCompiler {
    client: LlmClient,
}

impl LlmReportCompiler {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ReportCompiler for LlmReportCompiler {
    async fn compile_report(&self, input: &ReportInput) -> Result<ReportNarrative, EngineError> {
        let skill_assessments = input
            .summary
            .skill_breakdown
            .iter()
            .map(assess_skill)
            .collect();

        let insights = match self
            .client
            .prompt(insights_prompt(input), INSIGHTS_TEMPERATURE, INSIGHTS_MAX_TOKENS)
            .await
        {
            Ok(raw) => parse_insights(&raw).unwrap_or_else(|| {
                warn!("Malformed report insights, using score-band narrative");
                fallback_insights(&input.candidate_name, &input.summary)
            }),
            Err(e) => {
                warn!("Report insights unavailable ({}), using score-band narrative", e);
                fallback_insights(&input.candidate_name, &input.summary)
            }
        };

        Ok(ReportNarrative {
            skill_assessments,
            key_strengths: insights.key_strengths,
            improvement_recommendations: insights.improvement_recommendations,
            next_steps: insights.next_steps,
            interview_summary: insights.interview_summary,
        })
    }
}

fn insights_prompt(input: &ReportInput) -> String {
    let summary = &input.summary;
    let area_line = |entry: Option<&SkillBreakdown>| match entry {
        Some(entry) => format!("{} ({:.1}%)", spoken(entry.skill_area), entry.score * 100.0),
        None => "general (50.0%)".to_string(),
    };
    let scores: Vec<String> = summary
        .skill_breakdown
        .iter()
        .map(|entry| {
            format!(
                "- {}: {:.1}%",
                entry.skill_area.display_name(),
                entry.score * 100.0
            )
        })
        .collect();

    format!(
        r#"Generate specific, performance-based feedback for an Excel skills assessment.

CANDIDATE: {name}
POSITION LEVEL: {level}
OVERALL SCORE: {overall:.1}% ({overall_level} level)
DURATION: {minutes:.1} minutes
STRONGEST AREA: {strongest}
WEAKEST AREA: {weakest}

ALL SKILL SCORES:
{scores}

Based on this ACTUAL performance data, provide specific feedback in JSON format:
{{
    "key_strengths": ["strength based on high-scoring areas", "specific skill demonstrated well", "performance-based strength"],
    "improvement_recommendations": ["specific area needing work based on low scores", "targeted improvement suggestion", "skill-specific recommendation"],
    "next_steps": ["actionable next step based on performance level", "specific learning recommendation", "career-relevant suggestion"],
    "interview_summary": "2-3 sentence summary of actual performance, mentioning specific scores and skill levels demonstrated"
}}

IMPORTANT:
- Base ALL feedback on the actual scores provided
- If score is high (>70%), focus on advanced skills and expertise shown
- If score is low (<40%), focus on fundamental gaps and basic improvements needed
- If score is medium (40-70%), focus on building on existing knowledge
- Mention specific skill areas by name"#,
        name = input.candidate_name,
        level = input.position_level,
        overall = summary.overall_score * 100.0,
        overall_level = summary.overall_level,
        minutes = input.duration_secs / 60.0,
        strongest = area_line(summary.strongest()),
        weakest = area_line(summary.weakest()),
        scores = scores.join("\n"),
    )
}

fn parse_insights(raw: &str) -> Option<Insights> {
    let value = extract_json_object(raw)?;
    serde_json::from_value::<Insights>(value)
        .ok()
        .filter(Insights::is_usable)
}

/// Templated assessment of one skill area
pub fn assess_skill(entry: &SkillBreakdown) -> SkillAssessment {
    let area = spoken(entry.skill_area);
    let (strengths, improvements): (Vec<String>, Vec<String>) = if entry.score >= 0.8 {
        (
            vec![
                format!("Excellent {} knowledge demonstrated", area),
                "Provided detailed, accurate technical explanations".to_string(),
                "Showed advanced understanding of complex concepts".to_string(),
            ],
            vec![
                "Continue exploring cutting-edge features in this area".to_string(),
                "Consider advanced certifications or specializations".to_string(),
            ],
        )
    } else if entry.score >= 0.6 {
        (
            vec![
                format!("Good grasp of {} fundamentals", area),
                "Solid understanding of key concepts".to_string(),
                "Practical approach to problem-solving".to_string(),
            ],
            vec![
                format!("Deepen knowledge of advanced {} features", area),
                "Practice more complex scenarios in this area".to_string(),
            ],
        )
    } else if entry.score >= 0.3 {
        (
            vec![
                format!("Basic understanding of {} concepts", area),
                "Awareness of fundamental principles".to_string(),
            ],
            vec![
                format!("Strengthen core {} skills", area),
                "Practice fundamental operations and functions".to_string(),
                "Focus on building confidence in this area".to_string(),
            ],
        )
    } else {
        (
            vec!["Attempted to address the questions in this area".to_string()],
            vec![
                format!("Requires comprehensive training in {}", area),
                "Start with basic tutorials and guided practice".to_string(),
                "Focus on fundamental concepts before advancing".to_string(),
            ],
        )
    };

    SkillAssessment {
        skill_area: entry.skill_area,
        score: entry.score,
        level: SkillLevel::from_score(entry.score),
        strengths,
        areas_for_improvement: improvements,
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Narrative keyed on the overall score band
fn fallback_insights(candidate_name: &str, summary: &ScoreSummary) -> Insights {
    let overall = summary.overall_score;
    let percent = format!("{:.0}%", overall * 100.0);
    let strongest = summary
        .strongest()
        .map(|entry| spoken(entry.skill_area))
        .unwrap_or_else(|| "general".to_string());
    let weakest = summary
        .weakest()
        .map(|entry| spoken(entry.skill_area))
        .unwrap_or_else(|| "general".to_string());

    if overall >= 0.8 {
        Insights {
            key_strengths: vec![
                format!("Demonstrated expert-level Excel knowledge with {} overall score", percent),
                format!("Excelled in {} with strong technical skills", strongest),
                "Provided detailed, accurate explanations showing deep understanding".to_string(),
            ],
            improvement_recommendations: to_strings(&[
                "Continue exploring advanced Excel features and automation",
                "Consider sharing knowledge through mentoring or training others",
                "Stay updated with latest Excel updates and Power Platform integration",
            ]),
            next_steps: to_strings(&[
                "Pursue advanced Excel certifications or Power BI training",
                "Take on complex data analysis projects requiring advanced Excel skills",
                "Consider roles requiring expert-level spreadsheet and data analysis capabilities",
            ]),
            interview_summary: format!(
                "{} demonstrated exceptional Excel proficiency with a {} score, showing expert-level skills across multiple areas and providing comprehensive, technically accurate responses.",
                candidate_name, percent
            ),
        }
    } else if overall >= 0.6 {
        Insights {
            key_strengths: vec![
                format!("Solid Excel foundation with {} overall performance", percent),
                format!("Strong performance in {}", strongest),
                "Good understanding of core Excel concepts and practical applications".to_string(),
            ],
            improvement_recommendations: vec![
                format!("Focus on strengthening {} skills", weakest),
                "Practice more complex scenarios and advanced functions".to_string(),
                "Develop deeper understanding of Excel's analytical capabilities".to_string(),
            ],
            next_steps: to_strings(&[
                "Take intermediate to advanced Excel courses",
                "Practice with real-world datasets and business scenarios",
                "Learn advanced functions like INDEX/MATCH, pivot table calculations",
            ]),
            interview_summary: format!(
                "{} showed good Excel competency with a {} score, demonstrating solid understanding in most areas with room for growth in advanced features.",
                candidate_name, percent
            ),
        }
    } else if overall >= 0.3 {
        Insights {
            key_strengths: vec![
                format!("Basic Excel knowledge foundation with {} score", percent),
                "Understanding of fundamental spreadsheet concepts".to_string(),
                "Willingness to engage with Excel-based tasks".to_string(),
            ],
            improvement_recommendations: to_strings(&[
                "Focus on mastering basic Excel functions and formulas",
                "Practice fundamental data manipulation and formatting",
                "Learn essential features like sorting, filtering, and basic charts",
            ]),
            next_steps: to_strings(&[
                "Enroll in beginner Excel training courses",
                "Practice daily with guided Excel tutorials",
                "Start with simple datasets to build confidence and skills",
            ]),
            interview_summary: format!(
                "{} demonstrated basic Excel awareness with a {} score, showing foundational understanding but requiring significant skill development for professional Excel use.",
                candidate_name, percent
            ),
        }
    } else {
        Insights {
            key_strengths: to_strings(&[
                "Participated in the complete assessment process",
                "Showed willingness to attempt Excel-related questions",
            ]),
            improvement_recommendations: to_strings(&[
                "Start with fundamental Excel basics and core concepts",
                "Learn essential spreadsheet navigation and data entry",
                "Focus on understanding basic formulas and cell references",
            ]),
            next_steps: to_strings(&[
                "Begin with introductory Excel courses or tutorials",
                "Practice basic spreadsheet operations daily",
                "Consider one-on-one Excel training or mentoring",
            ]),
            interview_summary: format!(
                "{} completed the assessment with a {} score, indicating the need for comprehensive Excel training starting from fundamental concepts.",
                candidate_name, percent
            ),
        }
    }
}
