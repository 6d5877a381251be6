//! Session domain model.
//!
//! A session aggregates conversation turns and decision points for one
//! trainee's run through one scenario, and owns the narrative state machine
//! that the orchestrator drives.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

use super::decision::DecisionPoint;
use super::message::{ConversationTurn, TurnRole};
use crate::error::{GauntletError, Result};
use crate::taxonomy::{DifficultyLevel, ThreatType};

/// Narrative state of a running scenario.
///
/// Transitions are monotonic along
/// `intro -> engaged <-> decision_pending -> ... -> resolved -> debrief -> closed`,
/// with two exceptions: a pause moves `engaged`/`decision_pending` straight
/// to `closed`, and a resume re-enters `engaged` from `closed` as long as
/// the session has not been scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NarrativePhase {
    Intro,
    Engaged,
    DecisionPending,
    Resolved,
    Debrief,
    Closed,
}

impl NarrativePhase {
    /// Whether the state table permits `self -> next`.
    ///
    /// The resume edge (`closed -> engaged`) is additionally gated on the
    /// session's scored flag, which only `Session::transition` can see.
    fn permits(self, next: NarrativePhase) -> bool {
        use NarrativePhase::*;
        matches!(
            (self, next),
            (Intro, Engaged)
                | (Engaged, DecisionPending)
                | (DecisionPending, Engaged)
                | (Engaged, Resolved)
                | (Resolved, Debrief)
                | (Debrief, Closed)
                // pause edges
                | (Engaged, Closed)
                | (DecisionPending, Closed)
                // resume edge, gated on the scored flag by the caller
                | (Closed, Engaged)
        )
    }
}

/// One trainee's run through one scenario.
///
/// Ownership is exclusive to the orchestrator for the session's duration;
/// after closure the session is handed read-only to the memory collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier (UUID format).
    pub id: String,
    /// Anonymized trainee identifier.
    pub user_id: String,
    /// Threat category being simulated.
    pub threat_type: ThreatType,
    /// Difficulty level active for this run.
    pub difficulty: DifficultyLevel,
    /// Current narrative phase. Mutated only through `transition`.
    phase: NarrativePhase,
    /// Ordered conversation history.
    turns: Vec<ConversationTurn>,
    /// Ordered decision points, recorded in strict turn order.
    decisions: Vec<DecisionPoint>,
    /// Identifier of the currently active threat actor, if any.
    pub active_actor: Option<String>,
    /// Number of hints surfaced to the trainee.
    pub hints_used: u32,
    /// Times the trainee paused and resumed the scenario.
    pub pause_count: u32,
    /// When the scenario started.
    pub started_at: DateTime<Utc>,
    /// When the scenario ended (set on pause and on close).
    pub ended_at: Option<DateTime<Utc>>,
    /// One-way flag set once the scoring engine has consumed this session.
    /// A scored session can never be resumed.
    scored: bool,
}

impl Session {
    /// Creates a new session in the `intro` phase.
    pub fn new(
        user_id: impl Into<String>,
        threat_type: ThreatType,
        difficulty: DifficultyLevel,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            threat_type,
            difficulty,
            phase: NarrativePhase::Intro,
            turns: Vec::new(),
            decisions: Vec::new(),
            active_actor: None,
            hints_used: 0,
            pause_count: 0,
            started_at: Utc::now(),
            ended_at: None,
            scored: false,
        }
    }

    /// Current narrative phase.
    pub fn phase(&self) -> NarrativePhase {
        self.phase
    }

    /// Ordered conversation history.
    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// Ordered decision points.
    pub fn decisions(&self) -> &[DecisionPoint] {
        &self.decisions
    }

    /// Whether the scoring engine has consumed this session.
    pub fn is_scored(&self) -> bool {
        self.scored
    }

    /// Appends a conversation turn and returns its index.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if the session is closed. Paused sessions must
    /// be resumed before further turns are accepted.
    pub fn append_turn(&mut self, role: TurnRole, content: impl Into<String>) -> Result<usize> {
        if self.phase == NarrativePhase::Closed {
            return Err(GauntletError::InvalidState {
                expected: "an open session".to_string(),
                actual: self.phase,
            });
        }
        self.turns.push(ConversationTurn::now(role, content));
        Ok(self.turns.len() - 1)
    }

    /// Records an immutable decision point.
    ///
    /// # Errors
    ///
    /// Returns `Referential` if the decision references a turn index that
    /// does not exist in the turn sequence.
    pub fn record_decision(&mut self, decision: DecisionPoint) -> Result<()> {
        if decision.turn_index >= self.turns.len() {
            return Err(GauntletError::referential(
                decision.turn_index,
                self.turns.len(),
            ));
        }
        self.decisions.push(decision);
        Ok(())
    }

    /// Transitions to a new narrative phase.
    ///
    /// # Errors
    ///
    /// Returns `IllegalTransition` if the target is not reachable from the
    /// current phase per the state table, or if a resume is attempted on a
    /// session that has already been scored.
    pub fn transition(&mut self, next: NarrativePhase) -> Result<()> {
        let resume = self.phase == NarrativePhase::Closed && next == NarrativePhase::Engaged;
        if !self.phase.permits(next) || (resume && self.scored) {
            return Err(GauntletError::illegal_transition(self.phase, next));
        }
        if next == NarrativePhase::Closed {
            self.ended_at = Some(Utc::now());
        } else if resume {
            self.ended_at = None;
        }
        self.phase = next;
        Ok(())
    }

    /// Pauses the session at a turn boundary.
    ///
    /// Counts the interruption and closes the session without scoring it,
    /// so it remains resumable.
    ///
    /// # Errors
    ///
    /// Returns `IllegalTransition` unless the session is `engaged` or
    /// `decision_pending`.
    pub fn pause(&mut self) -> Result<()> {
        if !matches!(
            self.phase,
            NarrativePhase::Engaged | NarrativePhase::DecisionPending
        ) {
            return Err(GauntletError::illegal_transition(
                self.phase,
                NarrativePhase::Closed,
            ));
        }
        self.transition(NarrativePhase::Closed)?;
        self.pause_count += 1;
        Ok(())
    }

    /// Resumes a paused session, restoring the `engaged` phase.
    ///
    /// Turn history, decisions, and the hint counter are untouched by
    /// pause/resume cycles.
    ///
    /// # Errors
    ///
    /// Returns `IllegalTransition` if the session is not closed, or was
    /// already scored.
    pub fn resume(&mut self) -> Result<()> {
        if self.phase != NarrativePhase::Closed {
            return Err(GauntletError::illegal_transition(
                self.phase,
                NarrativePhase::Engaged,
            ));
        }
        self.transition(NarrativePhase::Engaged)
    }

    /// Counts a hint surfaced to the trainee.
    pub fn record_hint(&mut self) {
        self.hints_used += 1;
    }

    /// Marks the session as consumed by the scoring engine.
    ///
    /// This is one-way: once set, the resume edge of the state table is
    /// permanently disabled.
    pub fn mark_scored(&mut self) {
        self.scored = true;
    }

    /// Total session duration.
    ///
    /// `ended_at - started_at` once the session has ended, otherwise the
    /// elapsed time so far.
    pub fn duration(&self) -> Duration {
        self.ended_at.unwrap_or_else(Utc::now) - self.started_at
    }
}
