//! Score summary and assessment report types

use crate::types::{PositionLevel, SkillArea};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Proficiency band derived from a score in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl SkillLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.85 {
            SkillLevel::Expert
        } else if score >= 0.70 {
            SkillLevel::Advanced
        } else if score >= 0.50 {
            SkillLevel::Intermediate
        } else {
            SkillLevel::Beginner
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SkillLevel::Beginner => "Beginner",
            SkillLevel::Intermediate => "Intermediate",
            SkillLevel::Advanced => "Advanced",
            SkillLevel::Expert => "Expert",
        }
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final blended score for one skill area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillBreakdown {
    pub skill_area: SkillArea,
    pub score: f64,
    pub level: SkillLevel,
    pub observations: usize,
}

/// Aggregated metrics over every evaluation recorded in a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    /// Mean of the per-area final scores
    pub overall_score: f64,
    pub overall_level: SkillLevel,
    /// In first-observation order
    pub skill_breakdown: Vec<SkillBreakdown>,
    /// 1.0 means every answer scored the same
    pub consistency: f64,
    pub total_evaluations: usize,
    pub mcq_count: usize,
    pub open_ended_count: usize,
    pub mcq_average: Option<f64>,
    pub open_ended_average: Option<f64>,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
}

impl ScoreSummary {
    pub fn score_for(&self, area: SkillArea) -> Option<f64> {
        self.skill_breakdown
            .iter()
            .find(|entry| entry.skill_area == area)
            .map(|entry| entry.score)
    }

    pub fn strongest(&self) -> Option<&SkillBreakdown> {
        self.skill_breakdown
            .iter()
            .fold(None, |best: Option<&SkillBreakdown>, entry| match best {
                Some(b) if b.score >= entry.score => Some(b),
                _ => Some(entry),
            })
    }

    pub fn weakest(&self) -> Option<&SkillBreakdown> {
        self.skill_breakdown
            .iter()
            .fold(None, |worst: Option<&SkillBreakdown>, entry| match worst {
                Some(w) if w.score <= entry.score => Some(w),
                _ => Some(entry),
            })
    }
}

/// Narrative assessment of one skill area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillAssessment {
    pub skill_area: SkillArea,
    pub score: f64,
    pub level: SkillLevel,
    pub strengths: Vec<String>,
    pub areas_for_improvement: Vec<String>,
}

/// Narrative portion of the report, produced by a report compiler
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReportNarrative {
    pub skill_assessments: Vec<SkillAssessment>,
    pub key_strengths: Vec<String>,
    pub improvement_recommendations: Vec<String>,
    pub next_steps: Vec<String>,
    pub interview_summary: String,
}

/// Final report of a completed interview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentReport {
    pub session_id: String,
    pub candidate_name: String,
    pub position_level: PositionLevel,
    pub questions_asked: usize,
    pub duration_secs: f64,
    pub summary: ScoreSummary,
    pub narrative: ReportNarrative,
    pub generated_at: DateTime<Utc>,
}
