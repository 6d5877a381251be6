//! Closed taxonomies shared across the platform.
//!
//! Threat categories, social-engineering vulnerability patterns, the user
//! action taxonomy, and difficulty levels. Every classification in the
//! system resolves to one of these closed sets so dispatch stays exhaustive
//! and compile-time checkable.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Types of social-engineering threats that can be simulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ThreatType {
    Phishing,
    Vishing,
    /// Business Email Compromise
    Bec,
    Physical,
    Insider,
}

/// Social-engineering pressure patterns a scenario can probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VulnerabilityCategory {
    Urgency,
    Authority,
    Curiosity,
    Fear,
    Greed,
}

/// The closed action taxonomy a trainee response is classified into.
///
/// Ordered from best to worst security outcome. Base point values are
/// configured in [`crate::config::ScoringWeights`], not here, so deployments
/// can override the weighting without touching the taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UserAction {
    /// Identified the threat and reported it through proper channels.
    RecognizedAndReported,
    /// Verified the request through an independent channel before acting.
    VerifiedFirst,
    /// Expressed doubt but ultimately went along with the request.
    HesitatedThenComplied,
    /// Complied with the adversary's request without question.
    CompliedImmediately,
}

/// Difficulty levels for adaptive training scenarios.
///
/// The numeric level (1-5) controls scenario subtlety and feeds the
/// difficulty weight used by the scoring engine.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DifficultyLevel {
    Beginner,
    Novice,
    Intermediate,
    Advanced,
    Expert,
}

impl Default for DifficultyLevel {
    fn default() -> Self {
        DifficultyLevel::Intermediate
    }
}

impl DifficultyLevel {
    /// Numeric level in the closed range [1, 5].
    pub fn level(&self) -> u8 {
        match self {
            DifficultyLevel::Beginner => 1,
            DifficultyLevel::Novice => 2,
            DifficultyLevel::Intermediate => 3,
            DifficultyLevel::Advanced => 4,
            DifficultyLevel::Expert => 5,
        }
    }

    /// Builds a level from its numeric value, clamping to [1, 5].
    pub fn from_level(level: u8) -> Self {
        match level {
            0 | 1 => DifficultyLevel::Beginner,
            2 => DifficultyLevel::Novice,
            3 => DifficultyLevel::Intermediate,
            4 => DifficultyLevel::Advanced,
            _ => DifficultyLevel::Expert,
        }
    }

    /// One step harder, saturating at `Expert`.
    pub fn step_up(self) -> Self {
        Self::from_level(self.level().saturating_add(1))
    }

    /// One step easier, saturating at `Beginner`.
    pub fn step_down(self) -> Self {
        Self::from_level(self.level().saturating_sub(1).max(1))
    }

    /// Per-category penalty multiplier: `1 + 0.1 * level`.
    pub fn weight(&self) -> f64 {
        1.0 + 0.1 * f64::from(self.level())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_levels_round_trip_numeric_values() {
        for level in 1..=5u8 {
            assert_eq!(DifficultyLevel::from_level(level).level(), level);
        }
    }

    #[test]
    fn difficulty_steps_saturate() {
        assert_eq!(DifficultyLevel::Expert.step_up(), DifficultyLevel::Expert);
        assert_eq!(
            DifficultyLevel::Beginner.step_down(),
            DifficultyLevel::Beginner
        );
        assert_eq!(
            DifficultyLevel::Intermediate.step_up(),
            DifficultyLevel::Advanced
        );
    }

    #[test]
    fn difficulty_weight_matches_formula() {
        assert!((DifficultyLevel::Intermediate.weight() - 1.3).abs() < 1e-9);
        assert!((DifficultyLevel::Expert.weight() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn taxonomy_display_is_snake_case() {
        assert_eq!(ThreatType::Bec.to_string(), "bec");
        assert_eq!(
            UserAction::RecognizedAndReported.to_string(),
            "recognized_and_reported"
        );
        assert_eq!(VulnerabilityCategory::Urgency.to_string(), "urgency");
    }
}
