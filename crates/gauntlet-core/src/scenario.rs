//! Scenario content types.
//!
//! A threat actor answers an activation request with a [`ScenarioScript`]:
//! an opening message plus an ordered sequence of narrative beats, some of
//! which probe a specific vulnerability. The orchestrator walks the script
//! turn by turn; the script itself carries no mutable state.

use serde::{Deserialize, Serialize};

use crate::taxonomy::{DifficultyLevel, ThreatType, UserAction, VulnerabilityCategory};

/// Context handed to a threat actor when activating a scenario.
///
/// Carries everything the actor needs to personalize its script; no agent
/// holds ambient per-session state outside of what travels in the call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioContext {
    /// Threat category to simulate.
    pub threat_type: ThreatType,
    /// Difficulty level controlling subtlety.
    pub difficulty: DifficultyLevel,
    /// Vulnerability pattern the scenario should emphasize.
    pub focus: VulnerabilityCategory,
    /// Pattern the difficulty controller selected, when it had a
    /// preference. Actors honor it if they can serve that pattern.
    pub preferred_pattern: Option<String>,
    /// Pattern identifiers used recently, to be avoided.
    pub recently_used_patterns: Vec<String>,
    /// Known weak categories from the trainee's history.
    pub vulnerability_areas: Vec<VulnerabilityCategory>,
}

/// A decision the scenario sets up at a given beat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionProbe {
    /// The vulnerability pattern under test.
    pub vulnerability: VulnerabilityCategory,
    /// The optimal security action for this probe.
    pub correct_action: UserAction,
}

/// One adversary message in a scenario, optionally probing a decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioBeat {
    /// What the adversary says at this point in the narrative.
    pub adversary_line: String,
    /// Present when the trainee's next response resolves a decision.
    pub probe: Option<DecisionProbe>,
}

impl ScenarioBeat {
    /// A purely narrative beat with no decision attached.
    pub fn narrative(line: impl Into<String>) -> Self {
        Self {
            adversary_line: line.into(),
            probe: None,
        }
    }

    /// A beat whose trainee response resolves a decision.
    pub fn probing(
        line: impl Into<String>,
        vulnerability: VulnerabilityCategory,
        correct_action: UserAction,
    ) -> Self {
        Self {
            adversary_line: line.into(),
            probe: Some(DecisionProbe {
                vulnerability,
                correct_action,
            }),
        }
    }
}

/// A complete scenario script produced by a threat actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioScript {
    /// Stable identifier of the scenario pattern, used for the
    /// repetition-avoidance recency buffer.
    pub pattern_id: String,
    /// Threat category this script plays out.
    pub threat_type: ThreatType,
    /// Opening adversary message shown when the scenario starts.
    pub opening: String,
    /// Ordered narrative beats after the opening.
    pub beats: Vec<ScenarioBeat>,
}

impl ScenarioScript {
    /// Number of decision probes in the script.
    pub fn probe_count(&self) -> usize {
        self.beats.iter().filter(|b| b.probe.is_some()).count()
    }
}
