//! Platform configuration.
//!
//! All tunable constants live here with serde defaults, so a deployment can
//! override any of them from a TOML file while tests and embedded use get
//! sensible values from `Default`. The numeric scoring weights are reference
//! defaults, not empirically validated constants.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::taxonomy::UserAction;

/// Base point values per user action and risk bucket boundaries.
///
/// Penalty derivation for one decision:
/// `(100 - base_points(action)) * difficulty_weight`, where the difficulty
/// weight is `1 + 0.1 * level`. The maximum penalty a single decision can
/// contribute is therefore `100 * difficulty_weight`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// Points for recognizing and reporting the threat.
    #[serde(default = "default_recognized_points")]
    pub recognized_and_reported: f64,
    /// Points for verifying through an independent channel first.
    #[serde(default = "default_verified_points")]
    pub verified_first: f64,
    /// Points for complying after visible hesitation.
    #[serde(default = "default_hesitated_points")]
    pub hesitated_then_complied: f64,
    /// Points for immediate compliance.
    #[serde(default = "default_complied_points")]
    pub complied_immediately: f64,
    /// Scores below this bound are `critical` risk.
    #[serde(default = "default_critical_bound")]
    pub critical_below: f64,
    /// Scores below this bound (and at or above the critical bound) are `high`.
    #[serde(default = "default_high_bound")]
    pub high_below: f64,
    /// Scores below this bound (and at or above the high bound) are `moderate`.
    #[serde(default = "default_moderate_bound")]
    pub moderate_below: f64,
}

fn default_recognized_points() -> f64 {
    100.0
}
fn default_verified_points() -> f64 {
    80.0
}
fn default_hesitated_points() -> f64 {
    40.0
}
fn default_complied_points() -> f64 {
    0.0
}
fn default_critical_bound() -> f64 {
    40.0
}
fn default_high_bound() -> f64 {
    60.0
}
fn default_moderate_bound() -> f64 {
    80.0
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            recognized_and_reported: default_recognized_points(),
            verified_first: default_verified_points(),
            hesitated_then_complied: default_hesitated_points(),
            complied_immediately: default_complied_points(),
            critical_below: default_critical_bound(),
            high_below: default_high_bound(),
            moderate_below: default_moderate_bound(),
        }
    }
}

impl ScoringWeights {
    /// Base point value for an action in the closed taxonomy.
    pub fn base_points(&self, action: UserAction) -> f64 {
        match action {
            UserAction::RecognizedAndReported => self.recognized_and_reported,
            UserAction::VerifiedFirst => self.verified_first,
            UserAction::HesitatedThenComplied => self.hesitated_then_complied,
            UserAction::CompliedImmediately => self.complied_immediately,
        }
    }

    /// Difficulty-weighted penalty contributed by one decision.
    pub fn penalty(&self, action: UserAction, difficulty_weight: f64) -> f64 {
        (100.0 - self.base_points(action)) * difficulty_weight
    }

    /// Largest penalty a single decision can contribute at a given weight.
    pub fn max_penalty(&self, difficulty_weight: f64) -> f64 {
        100.0 * difficulty_weight
    }
}

/// Thresholds driving the adaptive difficulty controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultySettings {
    /// Number of recent scenario outcomes kept in the rolling window.
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    /// Overall score at or above which an outcome counts as a pass.
    #[serde(default = "default_pass_threshold")]
    pub pass_threshold: f64,
    /// Success rate above which difficulty steps up.
    #[serde(default = "default_raise_band")]
    pub raise_band: f64,
    /// Success rate below which difficulty steps down.
    #[serde(default = "default_lower_band")]
    pub lower_band: f64,
    /// Minimum number of scored outcomes before difficulty adapts at all.
    #[serde(default = "default_min_history")]
    pub min_history: usize,
    /// Per-category failure counts at or below this value are considered
    /// minor; when every category is minor the focus is chosen at random.
    #[serde(default = "default_minor_failure_threshold")]
    pub minor_failure_threshold: u32,
    /// Number of recently used scenario pattern ids excluded from selection.
    #[serde(default = "default_recency_capacity")]
    pub recency_capacity: usize,
}

fn default_history_window() -> usize {
    10
}
fn default_pass_threshold() -> f64 {
    70.0
}
fn default_raise_band() -> f64 {
    0.85
}
fn default_lower_band() -> f64 {
    0.55
}
fn default_min_history() -> usize {
    3
}
fn default_minor_failure_threshold() -> u32 {
    3
}
fn default_recency_capacity() -> usize {
    5
}

impl Default for DifficultySettings {
    fn default() -> Self {
        Self {
            history_window: default_history_window(),
            pass_threshold: default_pass_threshold(),
            raise_band: default_raise_band(),
            lower_band: default_lower_band(),
            min_history: default_min_history(),
            minor_failure_threshold: default_minor_failure_threshold(),
            recency_capacity: default_recency_capacity(),
        }
    }
}

/// Timeouts for the agent message protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolSettings {
    /// How long the orchestrator waits for `scenario_ready` before falling
    /// back to a template scenario.
    #[serde(default = "default_activation_timeout_ms")]
    pub activation_timeout_ms: u64,
    /// Default deadline for a blocking `receive` on the bus.
    #[serde(default = "default_receive_timeout_ms")]
    pub receive_timeout_ms: u64,
}

fn default_activation_timeout_ms() -> u64 {
    5_000
}
fn default_receive_timeout_ms() -> u64 {
    5_000
}

impl Default for ProtocolSettings {
    fn default() -> Self {
        Self {
            activation_timeout_ms: default_activation_timeout_ms(),
            receive_timeout_ms: default_receive_timeout_ms(),
        }
    }
}

/// Root configuration for the platform.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GauntletConfig {
    #[serde(default)]
    pub scoring: ScoringWeights,
    #[serde(default)]
    pub difficulty: DifficultySettings,
    #[serde(default)]
    pub protocol: ProtocolSettings,
}

impl GauntletConfig {
    /// Loads configuration from a TOML file.
    ///
    /// Missing keys fall back to their defaults, so a partial file is valid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: GauntletConfig = toml::from_str(&content)?;
        Ok(config)
    }
}
