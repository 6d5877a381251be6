//! Agent-to-agent message envelope.
//!
//! The one structural contract that must survive any transport: message
//! type, sender, recipient, payload, and a correlation identifier linking
//! request/response pairs. Payloads are a tagged union so dispatch is
//! exhaustive and compile-time checkable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::profile::SessionSummary;
use crate::scenario::{ScenarioContext, ScenarioScript};
use crate::session::DecisionPoint;
use crate::taxonomy::{DifficultyLevel, VulnerabilityCategory};

/// Identifier of an agent participating in the protocol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ActorId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Correlation identifier linking a request to its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Typed payload of an agent message.
///
/// Every `ActivateScenario` request is answered by exactly one
/// `ScenarioReady` or one `ActivationFailed` carrying the same correlation
/// id — never silence. The caller enforces the deadline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessagePayload {
    /// Ask a threat actor to produce a scenario script.
    ActivateScenario { context: ScenarioContext },
    /// A threat actor's script, answering an activation.
    ScenarioReady { script: ScenarioScript },
    /// Invisible-assessment notification of a recorded decision.
    TrackScenario { decision: DecisionPoint },
    /// Difficulty/focus adjustment for subsequent scenarios.
    AdaptScenario {
        difficulty: DifficultyLevel,
        focus: VulnerabilityCategory,
    },
    /// A session closed with the attached summary.
    SessionComplete { summary: SessionSummary },
    /// A threat actor could not produce a scenario.
    ActivationFailed { reason: String },
}

impl MessagePayload {
    /// Message type name, matching the wire tag.
    pub fn kind(&self) -> &'static str {
        match self {
            MessagePayload::ActivateScenario { .. } => "activate_scenario",
            MessagePayload::ScenarioReady { .. } => "scenario_ready",
            MessagePayload::TrackScenario { .. } => "track_scenario",
            MessagePayload::AdaptScenario { .. } => "adapt_scenario",
            MessagePayload::SessionComplete { .. } => "session_complete",
            MessagePayload::ActivationFailed { .. } => "activation_failed",
        }
    }
}

/// The structured envelope every agent-to-agent call uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMessage {
    pub sender: ActorId,
    pub recipient: ActorId,
    /// The training session this message concerns.
    pub session_id: String,
    /// Links request/response pairs. Fresh for requests, echoed by
    /// responses.
    pub correlation_id: CorrelationId,
    pub sent_at: DateTime<Utc>,
    pub payload: MessagePayload,
}

impl AgentMessage {
    /// Creates a request with a fresh correlation id.
    pub fn new(
        sender: ActorId,
        recipient: ActorId,
        session_id: impl Into<String>,
        payload: MessagePayload,
    ) -> Self {
        Self {
            sender,
            recipient,
            session_id: session_id.into(),
            correlation_id: CorrelationId::new(),
            sent_at: Utc::now(),
            payload,
        }
    }

    /// Builds the response to this message: sender and recipient swapped,
    /// correlation id carried over.
    pub fn response(&self, payload: MessagePayload) -> Self {
        Self {
            sender: self.recipient.clone(),
            recipient: self.sender.clone(),
            session_id: self.session_id.clone(),
            correlation_id: self.correlation_id,
            sent_at: Utc::now(),
            payload,
        }
    }
}
