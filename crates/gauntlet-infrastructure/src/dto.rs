//! Persistence DTOs.
//!
//! Domain models convert to these documents for TOML storage and back.
//! The split keeps on-disk layout independent of domain-type details like
//! enum-keyed maps, which TOML tables cannot represent directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

use gauntlet_core::profile::{ScenarioOutcome, SessionSummary, UserProfile};
use gauntlet_core::scoring::RiskLevel;
use gauntlet_core::taxonomy::{DifficultyLevel, ThreatType, VulnerabilityCategory};

/// One rolling-window outcome as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeDocument {
    pub session_id: String,
    pub threat_type: ThreatType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_score: Option<f64>,
    pub completed_at: DateTime<Utc>,
}

impl From<&ScenarioOutcome> for OutcomeDocument {
    fn from(outcome: &ScenarioOutcome) -> Self {
        Self {
            session_id: outcome.session_id.clone(),
            threat_type: outcome.threat_type,
            overall_score: outcome.overall_score,
            completed_at: outcome.completed_at,
        }
    }
}

impl From<OutcomeDocument> for ScenarioOutcome {
    fn from(doc: OutcomeDocument) -> Self {
        Self {
            session_id: doc.session_id,
            threat_type: doc.threat_type,
            overall_score: doc.overall_score,
            completed_at: doc.completed_at,
        }
    }
}

/// Per-category failure counter as stored on disk (array of tables; TOML
/// map keys must be strings, so the enum-keyed map becomes a list).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryCountDocument {
    pub category: VulnerabilityCategory,
    pub count: u32,
}

/// A user profile as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileDocument {
    pub user_id: String,
    pub difficulty_level: u8,
    #[serde(default)]
    pub recent_outcomes: Vec<OutcomeDocument>,
    #[serde(default)]
    pub failure_counts: Vec<CategoryCountDocument>,
    #[serde(default)]
    pub recently_used_patterns: Vec<String>,
    #[serde(default)]
    pub total_training_secs: i64,
    #[serde(default)]
    pub sessions_completed: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_session_at: Option<DateTime<Utc>>,
}

impl From<&UserProfile> for ProfileDocument {
    fn from(profile: &UserProfile) -> Self {
        let mut failure_counts: Vec<CategoryCountDocument> = profile
            .failure_counts
            .iter()
            .map(|(category, count)| CategoryCountDocument {
                category: *category,
                count: *count,
            })
            .collect();
        // Stable on-disk order keeps diffs and fixtures deterministic.
        failure_counts.sort_by_key(|c| c.category.to_string());

        Self {
            user_id: profile.user_id.clone(),
            difficulty_level: profile.difficulty.level(),
            recent_outcomes: profile.recent_outcomes.iter().map(Into::into).collect(),
            failure_counts,
            recently_used_patterns: profile.recently_used_patterns.iter().cloned().collect(),
            total_training_secs: profile.total_training_secs,
            sessions_completed: profile.sessions_completed,
            created_at: profile.created_at,
            last_session_at: profile.last_session_at,
        }
    }
}

impl ProfileDocument {
    /// Converts the document back into the domain model.
    pub fn into_domain(self) -> UserProfile {
        let failure_counts: HashMap<VulnerabilityCategory, u32> = self
            .failure_counts
            .into_iter()
            .map(|c| (c.category, c.count))
            .collect();

        UserProfile {
            user_id: self.user_id,
            recent_outcomes: self
                .recent_outcomes
                .into_iter()
                .map(Into::into)
                .collect::<VecDeque<_>>(),
            failure_counts,
            difficulty: DifficultyLevel::from_level(self.difficulty_level),
            recently_used_patterns: self.recently_used_patterns.into_iter().collect(),
            total_training_secs: self.total_training_secs,
            sessions_completed: self.sessions_completed,
            created_at: self.created_at,
            last_session_at: self.last_session_at,
        }
    }
}

/// A completed-session record as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordDocument {
    pub session_id: String,
    pub user_id: String,
    pub threat_type: ThreatType,
    pub difficulty_level: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_score: Option<f64>,
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub failed_categories: Vec<VulnerabilityCategory>,
    pub decisions_analyzed: usize,
    pub hints_used: u32,
    pub duration_secs: i64,
    pub completed_at: DateTime<Utc>,
}

impl From<&SessionSummary> for RecordDocument {
    fn from(summary: &SessionSummary) -> Self {
        Self {
            session_id: summary.session_id.clone(),
            user_id: summary.user_id.clone(),
            threat_type: summary.threat_type,
            difficulty_level: summary.difficulty.level(),
            pattern_id: summary.pattern_id.clone(),
            overall_score: summary.overall_score,
            risk_level: summary.risk_level,
            failed_categories: summary.failed_categories.clone(),
            decisions_analyzed: summary.decisions_analyzed,
            hints_used: summary.hints_used,
            duration_secs: summary.duration_secs,
            completed_at: summary.completed_at,
        }
    }
}

impl RecordDocument {
    /// Converts the document back into the domain model.
    pub fn into_domain(self) -> SessionSummary {
        SessionSummary {
            session_id: self.session_id,
            user_id: self.user_id,
            threat_type: self.threat_type,
            difficulty: DifficultyLevel::from_level(self.difficulty_level),
            pattern_id: self.pattern_id,
            overall_score: self.overall_score,
            risk_level: self.risk_level,
            failed_categories: self.failed_categories,
            decisions_analyzed: self.decisions_analyzed,
            hints_used: self.hints_used,
            duration_secs: self.duration_secs,
            completed_at: self.completed_at,
        }
    }
}
