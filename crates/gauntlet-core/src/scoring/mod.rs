//! Risk scoring engine.
//!
//! A pure function over a session's decision list: no side effects, no
//! clock, no randomness. The same decisions always produce the same
//! evaluation, which keeps scoring independently testable and replay-safe.
//!
//! Per decision the engine charges a penalty of
//! `(100 - base_points) * (1 + 0.1 * level)` and normalizes the sum against
//! the worst case (`100 * (1 + 0.1 * level)` per decision), inverting so
//! that 100 means no vulnerabilities exhibited.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::Display;

use crate::config::ScoringWeights;
use crate::session::DecisionPoint;
use crate::taxonomy::{DifficultyLevel, VulnerabilityCategory};

/// Risk bucket for an overall session score. Boundaries are inclusive on
/// the lower bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RiskLevel {
    Critical,
    High,
    Moderate,
    Low,
    /// Sentinel for sessions with zero decision points.
    InsufficientData,
}

impl RiskLevel {
    /// Buckets an overall score using the configured boundaries.
    pub fn from_score(score: f64, weights: &ScoringWeights) -> Self {
        if score < weights.critical_below {
            RiskLevel::Critical
        } else if score < weights.high_below {
            RiskLevel::High
        } else if score < weights.moderate_below {
            RiskLevel::Moderate
        } else {
            RiskLevel::Low
        }
    }
}

/// Average score for one vulnerability category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: VulnerabilityCategory,
    /// Mean normalized score of this category's decisions (0-100).
    pub average_score: f64,
    pub decisions: usize,
    pub failures: usize,
}

/// Result of evaluating a completed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvaluation {
    /// Overall normalized score (0-100, 100 = no vulnerabilities
    /// exhibited), or `None` when there were no decisions to evaluate.
    pub overall_score: Option<f64>,
    pub risk_level: RiskLevel,
    /// Per-category averages, ranked worst first.
    pub category_breakdown: Vec<CategoryScore>,
    /// Categories to focus on next, lowest-scoring first.
    pub recommendations: Vec<VulnerabilityCategory>,
    pub decisions_analyzed: usize,
    pub correct_decisions: usize,
}

impl SessionEvaluation {
    /// The defined sentinel for a session with zero decision points.
    pub fn insufficient_data() -> Self {
        Self {
            overall_score: None,
            risk_level: RiskLevel::InsufficientData,
            category_breakdown: Vec::new(),
            recommendations: Vec::new(),
            decisions_analyzed: 0,
            correct_decisions: 0,
        }
    }

    /// Categories where the trainee took a suboptimal action, for profile
    /// failure-count bookkeeping.
    pub fn failed_categories(&self) -> Vec<VulnerabilityCategory> {
        self.category_breakdown
            .iter()
            .filter(|c| c.failures > 0)
            .map(|c| c.category)
            .collect()
    }
}

/// Scores a closed session's decision list.
///
/// Decisions are processed in recorded order (category trends are
/// order-sensitive even though the aggregate is not). A session with zero
/// decisions yields the [`SessionEvaluation::insufficient_data`] sentinel,
/// never a division by zero.
pub fn score_session(
    decisions: &[DecisionPoint],
    difficulty: DifficultyLevel,
    weights: &ScoringWeights,
) -> SessionEvaluation {
    if decisions.is_empty() {
        return SessionEvaluation::insufficient_data();
    }

    let difficulty_weight = difficulty.weight();
    let max_penalty = weights.max_penalty(difficulty_weight);

    let mut total_penalty = 0.0;
    let mut correct = 0;
    // BTreeMap keeps the breakdown deterministic across runs.
    let mut per_category: BTreeMap<String, (VulnerabilityCategory, Vec<f64>, usize)> =
        BTreeMap::new();

    for decision in decisions {
        let penalty = weights.penalty(decision.action, difficulty_weight);
        total_penalty += penalty;
        if decision.is_correct() {
            correct += 1;
        }

        let normalized = 100.0 - penalty / max_penalty * 100.0;
        let entry = per_category
            .entry(decision.vulnerability.to_string())
            .or_insert_with(|| (decision.vulnerability, Vec::new(), 0));
        entry.1.push(normalized);
        if !decision.is_correct() {
            entry.2 += 1;
        }
    }

    // Scores are reported to one decimal place; bucketing uses the
    // reported value.
    let overall = round1(100.0 - total_penalty / (decisions.len() as f64 * max_penalty) * 100.0);

    let mut category_breakdown: Vec<CategoryScore> = per_category
        .into_values()
        .map(|(category, scores, failures)| CategoryScore {
            category,
            average_score: round1(scores.iter().sum::<f64>() / scores.len() as f64),
            decisions: scores.len(),
            failures,
        })
        .collect();
    category_breakdown.sort_by(|a, b| {
        a.average_score
            .partial_cmp(&b.average_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let recommendations = category_breakdown.iter().map(|c| c.category).collect();

    SessionEvaluation {
        overall_score: Some(overall),
        risk_level: RiskLevel::from_score(overall, weights),
        category_breakdown,
        recommendations,
        decisions_analyzed: decisions.len(),
        correct_decisions: correct,
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::UserAction;

    fn decision(
        turn_index: usize,
        vulnerability: VulnerabilityCategory,
        action: UserAction,
        difficulty: DifficultyLevel,
    ) -> DecisionPoint {
        DecisionPoint::evaluate(
            turn_index,
            vulnerability,
            action,
            UserAction::RecognizedAndReported,
            1_000,
            difficulty,
            &ScoringWeights::default(),
        )
    }

    #[test]
    fn empty_decision_list_yields_sentinel() {
        let evaluation = score_session(
            &[],
            DifficultyLevel::Intermediate,
            &ScoringWeights::default(),
        );
        assert_eq!(evaluation.overall_score, None);
        assert_eq!(evaluation.risk_level, RiskLevel::InsufficientData);
        assert_eq!(evaluation.decisions_analyzed, 0);
    }

    #[test]
    fn worked_example_pins_normalization() {
        // Two decisions at difficulty 3: urgency/complied_immediately and
        // authority/verified_first. Penalty = 100*1.3 + 20*1.3 = 156, max
        // penalty per decision = 130, score = 100 - 156/260*100 = 40.0.
        let difficulty = DifficultyLevel::Intermediate;
        let decisions = vec![
            decision(
                0,
                VulnerabilityCategory::Urgency,
                UserAction::CompliedImmediately,
                difficulty,
            ),
            decision(
                1,
                VulnerabilityCategory::Authority,
                UserAction::VerifiedFirst,
                difficulty,
            ),
        ];

        let evaluation = score_session(&decisions, difficulty, &ScoringWeights::default());
        let score = evaluation.overall_score.unwrap();
        assert!((score - 40.0).abs() < 1e-9, "expected 40.0, got {score}");
        // 40 sits on the critical/high boundary; lower bounds are
        // inclusive, so it lands in High.
        assert_eq!(evaluation.risk_level, RiskLevel::High);
    }

    #[test]
    fn scoring_is_deterministic() {
        let difficulty = DifficultyLevel::Advanced;
        let decisions = vec![
            decision(
                0,
                VulnerabilityCategory::Fear,
                UserAction::HesitatedThenComplied,
                difficulty,
            ),
            decision(
                1,
                VulnerabilityCategory::Greed,
                UserAction::RecognizedAndReported,
                difficulty,
            ),
        ];

        let first = score_session(&decisions, difficulty, &ScoringWeights::default());
        let second = score_session(&decisions, difficulty, &ScoringWeights::default());
        assert_eq!(first, second);
    }

    #[test]
    fn perfect_session_scores_100_and_low_risk() {
        let difficulty = DifficultyLevel::Expert;
        let decisions = vec![
            decision(
                0,
                VulnerabilityCategory::Urgency,
                UserAction::RecognizedAndReported,
                difficulty,
            ),
            decision(
                1,
                VulnerabilityCategory::Authority,
                UserAction::RecognizedAndReported,
                difficulty,
            ),
        ];

        let evaluation = score_session(&decisions, difficulty, &ScoringWeights::default());
        assert_eq!(evaluation.overall_score, Some(100.0));
        assert_eq!(evaluation.risk_level, RiskLevel::Low);
        assert_eq!(evaluation.correct_decisions, 2);
        assert!(evaluation.failed_categories().is_empty());
    }

    #[test]
    fn recommendations_rank_lowest_scoring_categories_first() {
        let difficulty = DifficultyLevel::Intermediate;
        let decisions = vec![
            decision(
                0,
                VulnerabilityCategory::Urgency,
                UserAction::CompliedImmediately,
                difficulty,
            ),
            decision(
                1,
                VulnerabilityCategory::Authority,
                UserAction::VerifiedFirst,
                difficulty,
            ),
            decision(
                2,
                VulnerabilityCategory::Fear,
                UserAction::HesitatedThenComplied,
                difficulty,
            ),
        ];

        let evaluation = score_session(&decisions, difficulty, &ScoringWeights::default());
        assert_eq!(
            evaluation.recommendations,
            vec![
                VulnerabilityCategory::Urgency,
                VulnerabilityCategory::Fear,
                VulnerabilityCategory::Authority,
            ]
        );
        assert_eq!(
            evaluation.failed_categories(),
            vec![
                VulnerabilityCategory::Urgency,
                VulnerabilityCategory::Fear,
                VulnerabilityCategory::Authority,
            ]
        );
    }

    #[test]
    fn risk_bucket_lower_bounds_are_inclusive() {
        let weights = ScoringWeights::default();
        assert_eq!(RiskLevel::from_score(39.9, &weights), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_score(40.0, &weights), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(60.0, &weights), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_score(80.0, &weights), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(100.0, &weights), RiskLevel::Low);
    }
}
