//! User profile and session summary models.
//!
//! The profile is the one piece of cross-session shared state per user.
//! All mutation goes through [`UserProfile::apply_summary`] so repository
//! `update` closures stay a single atomic read-modify-write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

use crate::config::DifficultySettings;
use crate::scoring::RiskLevel;
use crate::taxonomy::{DifficultyLevel, ThreatType, VulnerabilityCategory};

/// One completed scenario outcome in the rolling history window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub session_id: String,
    pub threat_type: ThreatType,
    /// Overall session score (0-100), absent for data-poor sessions.
    pub overall_score: Option<f64>,
    pub completed_at: DateTime<Utc>,
}

/// Read-only summary of a closed, scored session.
///
/// This is what the memory collaborator persists and what travels in the
/// `session_complete` protocol payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub user_id: String,
    pub threat_type: ThreatType,
    pub difficulty: DifficultyLevel,
    /// Scenario pattern that was played, for repetition avoidance.
    pub pattern_id: Option<String>,
    pub overall_score: Option<f64>,
    pub risk_level: RiskLevel,
    /// Categories where the trainee took a suboptimal action.
    pub failed_categories: Vec<VulnerabilityCategory>,
    pub decisions_analyzed: usize,
    pub hints_used: u32,
    pub duration_secs: i64,
    pub completed_at: DateTime<Utc>,
}

impl SessionSummary {
    fn outcome(&self) -> ScenarioOutcome {
        ScenarioOutcome {
            session_id: self.session_id.clone(),
            threat_type: self.threat_type,
            overall_score: self.overall_score,
            completed_at: self.completed_at,
        }
    }
}

/// Long-term per-user training state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Anonymized user identifier.
    pub user_id: String,
    /// Rolling history of recent scenario outcomes, newest last. Bounded
    /// by the configured window; oldest entries are evicted on insert.
    pub recent_outcomes: VecDeque<ScenarioOutcome>,
    /// Count of failed decisions per vulnerability category.
    pub failure_counts: HashMap<VulnerabilityCategory, u32>,
    /// Current adaptive difficulty, always in [1, 5] by construction.
    pub difficulty: DifficultyLevel,
    /// Recently played scenario pattern ids, newest last. Bounded by the
    /// configured recency capacity.
    pub recently_used_patterns: VecDeque<String>,
    /// Cumulative time spent training.
    pub total_training_secs: i64,
    pub sessions_completed: u64,
    pub created_at: DateTime<Utc>,
    pub last_session_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// Fresh default profile for a new user.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            recent_outcomes: VecDeque::new(),
            failure_counts: HashMap::new(),
            difficulty: DifficultyLevel::default(),
            recently_used_patterns: VecDeque::new(),
            total_training_secs: 0,
            sessions_completed: 0,
            created_at: Utc::now(),
            last_session_at: None,
        }
    }

    /// Folds a completed session into the profile.
    ///
    /// Applies, in one call: rolling-window insertion with eviction,
    /// per-category failure counting, pattern recency tracking, and the
    /// engagement totals. Difficulty is adjusted separately by the
    /// controller so callers can decide when to adapt.
    pub fn apply_summary(&mut self, summary: &SessionSummary, settings: &DifficultySettings) {
        self.recent_outcomes.push_back(summary.outcome());
        while self.recent_outcomes.len() > settings.history_window {
            self.recent_outcomes.pop_front();
        }

        for category in &summary.failed_categories {
            *self.failure_counts.entry(*category).or_insert(0) += 1;
        }

        if let Some(pattern_id) = &summary.pattern_id {
            self.recently_used_patterns.push_back(pattern_id.clone());
            while self.recently_used_patterns.len() > settings.recency_capacity {
                self.recently_used_patterns.pop_front();
            }
        }

        self.total_training_secs += summary.duration_secs.max(0);
        self.sessions_completed += 1;
        self.last_session_at = Some(summary.completed_at);
    }

    /// Failure count for a category, zero when never failed.
    pub fn failures_in(&self, category: VulnerabilityCategory) -> u32 {
        self.failure_counts.get(&category).copied().unwrap_or(0)
    }
}
