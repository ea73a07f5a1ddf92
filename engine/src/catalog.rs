//! Skill catalog
//!
//! Static lookup tables: the per-level interview profile (initial difficulty,
//! question budget, cumulative skill plan), the topic lists used to steer
//! question generation, and the difficulty bands.

use sdk::types::{PositionLevel, SkillArea};
use std::fmt;

/// Interview profile for one position level
#[derive(Debug, Clone, PartialEq)]
pub struct LevelProfile {
    pub level: PositionLevel,
    pub initial_difficulty: f64,
    pub max_questions: usize,
    /// Skill areas to cover, in the order they are introduced
    pub plan: Vec<SkillArea>,
}

const BASE_PLAN: [SkillArea; 4] = [
    SkillArea::FormulaBasic,
    SkillArea::DataAnalysis,
    SkillArea::ChartsVisualization,
    SkillArea::McqBasic,
];

const INTERMEDIATE_ADDITIONS: [SkillArea; 4] = [
    SkillArea::FormulaAdvanced,
    SkillArea::PivotTables,
    SkillArea::DataValidation,
    SkillArea::McqAdvanced,
];

const ADVANCED_ADDITIONS: [SkillArea; 2] = [SkillArea::MacrosVba, SkillArea::ScenarioBased];

/// Look up the profile for a position level
pub fn profile(level: PositionLevel) -> LevelProfile {
    let (initial_difficulty, max_questions) = match level {
        PositionLevel::Beginner => (0.25, 8),
        PositionLevel::Intermediate => (0.55, 10),
        PositionLevel::Advanced => (0.80, 12),
    };

    let mut plan = BASE_PLAN.to_vec();
    if matches!(level, PositionLevel::Intermediate | PositionLevel::Advanced) {
        plan.extend(INTERMEDIATE_ADDITIONS);
    }
    if level == PositionLevel::Advanced {
        plan.extend(ADVANCED_ADDITIONS);
    }

    LevelProfile {
        level,
        initial_difficulty,
        max_questions,
        plan,
    }
}

/// Parse a position level, falling back to intermediate for anything unknown.
///
/// The fallback is logged, never reported to the caller.
pub fn resolve_level(raw: &str) -> PositionLevel {
    raw.parse().unwrap_or_else(|_| {
        tracing::warn!(
            "Unrecognized position level '{}', falling back to intermediate",
            raw
        );
        PositionLevel::Intermediate
    })
}

/// Coarse difficulty band used in prompts and fallbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DifficultyBand {
    Beginner,
    Intermediate,
    Advanced,
}

impl DifficultyBand {
    pub fn from_difficulty(difficulty: f64) -> Self {
        if difficulty < 0.4 {
            DifficultyBand::Beginner
        } else if difficulty < 0.7 {
            DifficultyBand::Intermediate
        } else {
            DifficultyBand::Advanced
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyBand::Beginner => "beginner",
            DifficultyBand::Intermediate => "intermediate",
            DifficultyBand::Advanced => "advanced",
        }
    }
}

impl fmt::Display for DifficultyBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Topics to draw a question from for an area at a position level
pub fn topics(area: SkillArea, level: PositionLevel) -> &'static [&'static str] {
    use PositionLevel::*;
    use SkillArea::*;

    match (area, level) {
        (FormulaBasic, Beginner) => &[
            "SUM and AVERAGE functions",
            "simple COUNT functions",
            "basic cell references",
        ],
        (FormulaBasic, Intermediate) => &[
            "IF statements",
            "CONCATENATE",
            "basic logical functions (AND, OR)",
        ],
        (FormulaBasic, Advanced) => &[
            "nested IF statements",
            "complex logical combinations",
            "text manipulation functions",
        ],
        (FormulaAdvanced, Beginner) => &["simple VLOOKUP", "basic INDEX/MATCH"],
        (FormulaAdvanced, Intermediate) => &[
            "VLOOKUP with approximate match",
            "nested lookup functions",
        ],
        (FormulaAdvanced, Advanced) => &[
            "array formulas",
            "dynamic arrays",
            "complex nested functions",
        ],
        (DataAnalysis, Beginner) => &["sorting data", "basic filtering", "simple formatting"],
        (DataAnalysis, Intermediate) => &[
            "advanced filters",
            "conditional formatting",
            "data validation",
        ],
        (DataAnalysis, Advanced) => &[
            "complex conditional formatting",
            "advanced data validation",
            "data analysis tools",
        ],
        (PivotTables, Beginner) => &[
            "creating basic pivot tables",
            "simple field arrangements",
        ],
        (PivotTables, Intermediate) => &[
            "pivot table calculations",
            "grouping data",
            "pivot charts",
        ],
        (PivotTables, Advanced) => &[
            "calculated fields",
            "slicers and timelines",
            "advanced pivot features",
        ],
        (ChartsVisualization, Beginner) => &["basic chart creation", "chart types selection"],
        (ChartsVisualization, Intermediate) => &[
            "chart formatting",
            "multiple data series",
            "chart customization",
        ],
        (ChartsVisualization, Advanced) => &[
            "dashboard creation",
            "advanced chart types",
            "interactive visualizations",
        ],
        (DataValidation, Beginner) => &["dropdown lists", "whole number and date limits"],
        (DataValidation, Intermediate) => &[
            "list validation from ranges",
            "custom input messages",
            "error alerts",
        ],
        (DataValidation, Advanced) => &[
            "formula-based validation rules",
            "dependent dropdowns",
            "auditing invalid data",
        ],
        (MacrosVba, Beginner) => &["recording simple macros", "running macros"],
        (MacrosVba, Intermediate) => &[
            "editing recorded macros",
            "VBA loops",
            "working with ranges in VBA",
        ],
        (MacrosVba, Advanced) => &[
            "user-defined functions",
            "event-driven VBA",
            "error handling in VBA",
        ],
        (ScenarioBased, Beginner) => &["organizing a simple budget", "tracking a small inventory"],
        (ScenarioBased, Intermediate) => &[
            "monthly sales reporting",
            "reconciling two data sources",
            "what-if analysis",
        ],
        (ScenarioBased, Advanced) => &[
            "financial modelling",
            "Goal Seek and Solver",
            "end-to-end reporting automation",
        ],
        (McqBasic, Beginner) => &[
            "basic Excel functions",
            "cell references",
            "simple formulas",
        ],
        (McqBasic, Intermediate) => &[
            "intermediate functions",
            "data formatting",
            "basic analysis",
        ],
        (McqBasic, Advanced) => &[
            "advanced functions",
            "complex formulas",
            "data manipulation",
        ],
        (McqAdvanced, Beginner) => &["pivot table basics", "chart creation", "data validation"],
        (McqAdvanced, Intermediate) => &[
            "advanced pivot tables",
            "complex charts",
            "data analysis",
        ],
        (McqAdvanced, Advanced) => &["macros and VBA", "advanced analysis", "automation"],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_profiles() {
        let beginner = profile(PositionLevel::Beginner);
        assert_eq!(beginner.initial_difficulty, 0.25);
        assert_eq!(beginner.max_questions, 8);
        assert_eq!(beginner.plan.len(), 4);

        let intermediate = profile(PositionLevel::Intermediate);
        assert_eq!(intermediate.initial_difficulty, 0.55);
        assert_eq!(intermediate.max_questions, 10);
        assert_eq!(intermediate.plan.len(), 8);

        let advanced = profile(PositionLevel::Advanced);
        assert_eq!(advanced.initial_difficulty, 0.80);
        assert_eq!(advanced.max_questions, 12);
        assert_eq!(
            advanced.plan.last().copied(),
            Some(SkillArea::ScenarioBased)
        );
    }

    #[test]
    fn test_plans_are_cumulative() {
        let beginner = profile(PositionLevel::Beginner).plan;
        let intermediate = profile(PositionLevel::Intermediate).plan;
        let advanced = profile(PositionLevel::Advanced).plan;

        assert!(intermediate.starts_with(&beginner));
        assert!(advanced.starts_with(&intermediate));
        assert_eq!(beginner[0], SkillArea::FormulaBasic);
    }

    #[test]
    fn test_unknown_level_falls_back_to_intermediate() {
        assert_eq!(resolve_level("expert"), PositionLevel::Intermediate);
        assert_eq!(resolve_level(""), PositionLevel::Intermediate);
        assert_eq!(resolve_level("Advanced"), PositionLevel::Advanced);
    }

    #[test]
    fn test_difficulty_bands() {
        assert_eq!(DifficultyBand::from_difficulty(0.1), DifficultyBand::Beginner);
        assert_eq!(DifficultyBand::from_difficulty(0.39), DifficultyBand::Beginner);
        assert_eq!(DifficultyBand::from_difficulty(0.4), DifficultyBand::Intermediate);
        assert_eq!(DifficultyBand::from_difficulty(0.69), DifficultyBand::Intermediate);
        assert_eq!(DifficultyBand::from_difficulty(0.7), DifficultyBand::Advanced);
    }

    #[test]
    fn test_every_area_has_topics() {
        for area in SkillArea::ALL {
            for level in PositionLevel::ALL {
                assert!(!topics(area, level).is_empty());
            }
        }
    }
}
