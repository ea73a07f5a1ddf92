//! Score aggregation
//!
//! Turns the stream of per-answer evaluations into per-area blended scores
//! and the session-level [`ScoreSummary`]. The controller and the aggregator
//! share [`SkillScores`], so both always apply the same blending rule.

use sdk::report::{ScoreSummary, SkillBreakdown, SkillLevel};
use sdk::types::{Evaluation, SkillArea};
use std::collections::HashSet;

/// Weight of the previous blended score
pub const BLEND_PREVIOUS: f64 = 0.4;

/// Weight of the newest observation
pub const BLEND_NEW: f64 = 0.6;

/// Number of strengths and improvements kept in a summary
pub const ROLLUP_LIMIT: usize = 5;

/// Blended score of one skill area
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkillScore {
    pub area: SkillArea,
    pub score: f64,
    pub observations: usize,
}

/// Per-area blended scores in first-observation order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkillScores {
    entries: Vec<SkillScore>,
}

impl SkillScores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a new observation into an area and return the updated score.
    ///
    /// The first observation is taken as is; later ones are blended as
    /// `0.4 * previous + 0.6 * new`.
    pub fn record(&mut self, area: SkillArea, score: f64) -> f64 {
        match self.entries.iter_mut().find(|entry| entry.area == area) {
            Some(entry) => {
                entry.score = BLEND_PREVIOUS * entry.score + BLEND_NEW * score;
                entry.observations += 1;
                entry.score
            }
            None => {
                self.entries.push(SkillScore {
                    area,
                    score,
                    observations: 1,
                });
                score
            }
        }
    }

    pub fn get(&self, area: SkillArea) -> Option<f64> {
        self.entries
            .iter()
            .find(|entry| entry.area == area)
            .map(|entry| entry.score)
    }

    pub fn contains(&self, area: SkillArea) -> bool {
        self.get(area).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SkillScore> {
        self.entries.iter()
    }

    /// Areas with a score, in first-observation order
    pub fn areas(&self) -> Vec<SkillArea> {
        self.entries.iter().map(|entry| entry.area).collect()
    }

    pub fn snapshot(&self) -> Vec<(SkillArea, f64)> {
        self.entries
            .iter()
            .map(|entry| (entry.area, entry.score))
            .collect()
    }

    /// Lowest-scoring area; ties go to the area that comes first in `plan`.
    /// Scored areas outside the plan are considered after it.
    pub fn lowest(&self, plan: &[SkillArea]) -> Option<SkillArea> {
        let in_plan = plan.iter().filter_map(|area| self.get(*area).map(|s| (*area, s)));
        let outside = self
            .entries
            .iter()
            .filter(|entry| !plan.contains(&entry.area))
            .map(|entry| (entry.area, entry.score));

        in_plan
            .chain(outside)
            .fold(None, |lowest: Option<(SkillArea, f64)>, (area, score)| match lowest {
                Some((_, best)) if best <= score => lowest,
                _ => Some((area, score)),
            })
            .map(|(area, _)| area)
    }

    /// Arithmetic mean of the area scores, 0.0 when nothing was scored
    pub fn mean(&self) -> f64 {
        mean(self.entries.iter().map(|entry| entry.score))
    }
}

/// Aggregate evaluations given in submission order
pub fn aggregate<'a, I>(observations: I) -> ScoreSummary
where
    I: IntoIterator<Item = (SkillArea, &'a Evaluation)>,
{
    let mut skill_scores = SkillScores::new();
    let mut all_scores = Vec::new();
    let mut mcq_scores = Vec::new();
    let mut open_scores = Vec::new();
    let mut strengths = Vec::new();
    let mut improvements = Vec::new();

    for (area, evaluation) in observations {
        let score = evaluation.overall_score;
        skill_scores.record(area, score);
        all_scores.push(score);
        if evaluation.is_mcq {
            mcq_scores.push(score);
        } else {
            open_scores.push(score);
        }
        strengths.extend(evaluation.strengths.iter().cloned());
        improvements.extend(evaluation.areas_for_improvement.iter().cloned());
    }

    let overall_score = skill_scores.mean();

    ScoreSummary {
        overall_score,
        overall_level: SkillLevel::from_score(overall_score),
        skill_breakdown: skill_scores
            .iter()
            .map(|entry| SkillBreakdown {
                skill_area: entry.area,
                score: entry.score,
                level: SkillLevel::from_score(entry.score),
                observations: entry.observations,
            })
            .collect(),
        consistency: consistency(&all_scores),
        total_evaluations: all_scores.len(),
        mcq_count: mcq_scores.len(),
        open_ended_count: open_scores.len(),
        mcq_average: average(&mcq_scores),
        open_ended_average: average(&open_scores),
        strengths: dedupe_top(strengths, ROLLUP_LIMIT),
        improvements: dedupe_top(improvements, ROLLUP_LIMIT),
    }
}

/// `max(0, 1 - 4 * population variance)`; 1.0 for fewer than two scores
pub fn consistency(scores: &[f64]) -> f64 {
    if scores.len() < 2 {
        return 1.0;
    }
    let mean = mean(scores.iter().copied());
    let variance =
        scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / scores.len() as f64;
    (1.0 - 4.0 * variance).max(0.0)
}

/// Remove duplicates keeping the first occurrence, then keep at most `limit`
pub fn dedupe_top(items: Vec<String>, limit: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .take(limit)
        .collect()
}

fn average(scores: &[f64]) -> Option<f64> {
    if scores.is_empty() {
        None
    } else {
        Some(mean(scores.iter().copied()))
    }
}

fn mean(scores: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = scores.fold((0.0, 0usize), |(sum, count), s| (sum + s, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
