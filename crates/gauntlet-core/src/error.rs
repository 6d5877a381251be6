//! Error types for the Gauntlet training platform.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::NarrativePhase;

/// A shared error type for the entire Gauntlet core.
///
/// Variants split into two families:
/// - Structural errors (illegal transitions, referential violations,
///   premature completion) indicate a caller bug. They are never retried
///   and abort the offending operation.
/// - Recoverable errors (protocol timeouts, provider failures) trigger
///   fallback behavior and never terminate a session.
///
/// Use [`GauntletError::is_recoverable`] to distinguish the two.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum GauntletError {
    /// A session state transition not permitted by the state table.
    #[error("Illegal transition: {from} -> {to}")]
    IllegalTransition {
        from: NarrativePhase,
        to: NarrativePhase,
    },

    /// A decision point referenced a turn index that does not exist.
    #[error("Referential violation: turn index {turn_index} out of {turn_count} turns")]
    Referential {
        turn_index: usize,
        turn_count: usize,
    },

    /// An operation was attempted while the session was in the wrong state.
    #[error("Invalid state: expected {expected}, session is {actual}")]
    InvalidState {
        expected: String,
        actual: NarrativePhase,
    },

    /// Scoring was requested before the session reached a resolvable state.
    #[error("Premature completion: session is still {phase}")]
    PrematureCompletion { phase: NarrativePhase },

    /// An agent message received no response within its deadline.
    #[error("Protocol timeout: no response from '{recipient}' within {waited_ms}ms")]
    ProtocolTimeout { recipient: String, waited_ms: u64 },

    /// A message was addressed to an agent not registered on the bus.
    #[error("Unknown recipient: '{0}' is not registered")]
    UnknownRecipient(String),

    /// Session not found by identifier.
    #[error("Session not found: '{0}'")]
    SessionNotFound(String),

    /// The model-generation collaborator refused the prompt.
    #[error("Content blocked by provider")]
    ContentBlocked,

    /// The model-generation collaborator is unreachable or failing.
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GauntletError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates an IllegalTransition error
    pub fn illegal_transition(from: NarrativePhase, to: NarrativePhase) -> Self {
        Self::IllegalTransition { from, to }
    }

    /// Creates a Referential error
    pub fn referential(turn_index: usize, turn_count: usize) -> Self {
        Self::Referential {
            turn_index,
            turn_count,
        }
    }

    /// Creates a ProtocolTimeout error
    pub fn protocol_timeout(recipient: impl Into<String>, waited_ms: u64) -> Self {
        Self::ProtocolTimeout {
            recipient: recipient.into(),
            waited_ms,
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a structural error that indicates a caller bug.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::IllegalTransition { .. }
                | Self::Referential { .. }
                | Self::InvalidState { .. }
                | Self::PrematureCompletion { .. }
        )
    }

    /// Check if this error is recoverable via fallback behavior.
    ///
    /// Recoverable errors (timeouts, provider failures) degrade the session
    /// to cached/template content; they never end it. Everything else aborts
    /// the specific operation with a clear signal.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ProtocolTimeout { .. }
                | Self::ContentBlocked
                | Self::ProviderUnavailable(_)
        )
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::ProtocolTimeout { .. })
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for GauntletError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for GauntletError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for GauntletError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for GauntletError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// Conversion from String (for error messages)
impl From<String> for GauntletError {
    fn from(err: String) -> Self {
        Self::Internal(err)
    }
}

/// A type alias for `Result<T, GauntletError>`.
pub type Result<T> = std::result::Result<T, GauntletError>;
