//! Adaptive interview policy
//!
//! Pure decision functions used by the session controller: difficulty
//! adaptation, the termination predicate, and next-question format and area
//! selection. None of them touch session state directly.

use crate::catalog;
use crate::scoring::SkillScores;
use sdk::errors::EngineError;
use sdk::types::{PositionLevel, QuestionFormat, SkillArea};

/// Scores at or above this raise the difficulty
pub const RAISE_THRESHOLD: f64 = 0.8;

/// Scores at or below this lower the difficulty
pub const LOWER_THRESHOLD: f64 = 0.4;

pub const DIFFICULTY_STEP: f64 = 0.15;
pub const MIN_DIFFICULTY: f64 = 0.1;
pub const MAX_DIFFICULTY: f64 = 1.0;

/// Minimum number of answers before a run may end early
pub const MIN_QUESTIONS: usize = 6;

/// Question budget and skill plan of one interview
#[derive(Debug, Clone, PartialEq)]
pub struct InterviewPlan {
    max_questions: usize,
    target_mcq_count: usize,
    skill_areas: Vec<SkillArea>,
}

impl InterviewPlan {
    /// Build a custom plan.
    ///
    /// The multiple-choice target is capped at `max_questions` so it is
    /// always reachable.
    pub fn new(
        max_questions: usize,
        target_mcq_count: usize,
        skill_areas: Vec<SkillArea>,
    ) -> Result<Self, EngineError> {
        if max_questions == 0 {
            return Err(EngineError::InvalidPlan(
                "max_questions must be at least 1".to_string(),
            ));
        }
        if skill_areas.is_empty() {
            return Err(EngineError::InvalidPlan(
                "plan must contain at least one skill area".to_string(),
            ));
        }
        for (i, area) in skill_areas.iter().enumerate() {
            if skill_areas[..i].contains(area) {
                return Err(EngineError::InvalidPlan(format!(
                    "skill area {} appears more than once",
                    area
                )));
            }
        }

        Ok(Self {
            max_questions,
            target_mcq_count: target_mcq_count.min(max_questions),
            skill_areas,
        })
    }

    /// Standard plan for a position level
    pub fn for_level(level: PositionLevel, target_mcq_count: usize) -> Self {
        let profile = catalog::profile(level);
        Self {
            max_questions: profile.max_questions,
            target_mcq_count: target_mcq_count.min(profile.max_questions),
            skill_areas: profile.plan,
        }
    }

    pub fn max_questions(&self) -> usize {
        self.max_questions
    }

    pub fn target_mcq_count(&self) -> usize {
        self.target_mcq_count
    }

    pub fn skill_areas(&self) -> &[SkillArea] {
        &self.skill_areas
    }

    pub fn first_area(&self) -> SkillArea {
        // Non-empty by construction
        self.skill_areas[0]
    }
}

/// Nudge difficulty after a scored answer.
///
/// Scores in (0.4, 0.8) leave it unchanged.
pub fn adapt_difficulty(current: f64, score: f64) -> f64 {
    if score >= RAISE_THRESHOLD {
        (current + DIFFICULTY_STEP).min(MAX_DIFFICULTY)
    } else if score <= LOWER_THRESHOLD {
        (current - DIFFICULTY_STEP).max(MIN_DIFFICULTY)
    } else {
        current
    }
}

/// Whether another question should be asked.
///
/// `cursor` is the number of answers so far and `asked` the areas of every
/// question asked. The clauses are evaluated in order and the first one that
/// applies decides.
pub fn should_continue(
    plan: &InterviewPlan,
    cursor: usize,
    mcq_count: usize,
    asked: &[SkillArea],
) -> bool {
    if cursor >= plan.max_questions {
        return false;
    }
    if mcq_count < plan.target_mcq_count {
        return true;
    }
    if plan.skill_areas.iter().any(|area| !asked.contains(area)) {
        return true;
    }
    cursor < MIN_QUESTIONS.max(plan.skill_areas.len())
}

/// Format of the first question
pub fn opening_format(plan: &InterviewPlan) -> QuestionFormat {
    // With no slack every slot has to be multiple choice to reach the target
    if plan.max_questions <= plan.target_mcq_count {
        QuestionFormat::MultipleChoice
    } else {
        QuestionFormat::OpenEnded
    }
}

/// Format of the next question
pub fn next_format(plan: &InterviewPlan, cursor: usize, mcq_count: usize) -> QuestionFormat {
    let need_mcq = mcq_count < plan.target_mcq_count
        || (cursor % 3 == 0 && mcq_count < plan.max_questions / 2);

    if need_mcq {
        QuestionFormat::MultipleChoice
    } else {
        QuestionFormat::OpenEnded
    }
}

/// Skill area of the next question.
///
/// Uncovered plan areas come first, in plan order. Once everything has been
/// asked, multiple-choice questions go to the first MCQ area of the plan and
/// everything else to the weakest area.
pub fn next_area(
    plan: &InterviewPlan,
    asked: &[SkillArea],
    format: QuestionFormat,
    scores: &SkillScores,
) -> SkillArea {
    if let Some(uncovered) = plan
        .skill_areas
        .iter()
        .find(|area| !asked.contains(area))
    {
        return *uncovered;
    }

    if format == QuestionFormat::MultipleChoice {
        if let Some(mcq_area) = plan.skill_areas.iter().find(|area| area.is_mcq_area()) {
            return *mcq_area;
        }
    }

    scores
        .lowest(&plan.skill_areas)
        .unwrap_or_else(|| plan.first_area())
}
