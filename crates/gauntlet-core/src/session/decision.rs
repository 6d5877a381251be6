//! Decision point model.
//!
//! A decision point is the canonical record of one trainee choice at one
//! point in a scenario. It is created once, by whichever component detects
//! the decision, and is immutable thereafter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ScoringWeights;
use crate::taxonomy::{DifficultyLevel, UserAction, VulnerabilityCategory};

/// One recorded instance of the trainee facing a simulated security choice.
///
/// The `score_impact` field is always derived from
/// `(action, difficulty weight)` at construction time via
/// [`ScoringWeights::penalty`]; there is no way to set it independently, so
/// the stored value can never drift from its derivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionPoint {
    /// Index into the session's turn sequence of the trainee turn that
    /// resolved this decision. Validated by `Session::record_decision`.
    pub turn_index: usize,
    /// The vulnerability pattern this decision tested.
    pub vulnerability: VulnerabilityCategory,
    /// The trainee's classified action.
    pub action: UserAction,
    /// The action that would have been correct.
    pub correct_action: UserAction,
    /// Difficulty-weighted penalty this decision contributes to the risk
    /// score. Derived, never assigned.
    score_impact: f64,
    /// When the decision was recorded.
    pub timestamp: DateTime<Utc>,
    /// Time between the triggering stimulus and the trainee's response.
    pub response_latency_ms: i64,
}

impl DecisionPoint {
    /// Evaluates a trainee choice into an immutable decision record.
    ///
    /// The score impact is computed here and cannot be modified afterwards.
    pub fn evaluate(
        turn_index: usize,
        vulnerability: VulnerabilityCategory,
        action: UserAction,
        correct_action: UserAction,
        response_latency_ms: i64,
        difficulty: DifficultyLevel,
        weights: &ScoringWeights,
    ) -> Self {
        Self {
            turn_index,
            vulnerability,
            action,
            correct_action,
            score_impact: weights.penalty(action, difficulty.weight()),
            timestamp: Utc::now(),
            response_latency_ms,
        }
    }

    /// The derived difficulty-weighted penalty.
    pub fn score_impact(&self) -> f64 {
        self.score_impact
    }

    /// Whether the trainee took the optimal action.
    pub fn is_correct(&self) -> bool {
        self.action == self.correct_action
    }
}
