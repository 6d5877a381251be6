//! Conversation turn types.
//!
//! A session's dialogue is an ordered sequence of turns, each attributed to
//! the trainee, the role-playing adversary, or the narrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a turn in the training conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    /// The user being trained.
    Trainee,
    /// The role-playing threat actor.
    Adversary,
    /// Out-of-character framing: scenario setup, debrief, hints.
    Narrator,
}

/// A single turn in a session's conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// The role of the turn's author.
    pub role: TurnRole,
    /// The content of the turn.
    pub content: String,
    /// When the turn was recorded.
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    /// Creates a turn stamped with the current time.
    pub fn now(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}
