//! The orchestrator (game-master role).
//!
//! Owns every session's state machine: selects and activates scenarios,
//! walks the narrative script, classifies trainee responses into decision
//! points, and closes sessions through scoring, profile adaptation, and
//! record persistence. All required context travels in the call; no agent
//! holds implicit ambient session state.
//!
//! Failure posture: activation trouble (timeout, failure signal, missing
//! actor) degrades to a locally cached template scenario. Training
//! continuity is prioritized over narrative richness.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

use gauntlet_core::config::GauntletConfig;
use gauntlet_core::difficulty::DifficultyController;
use gauntlet_core::profile::{ProfileRepository, SessionRecordRepository, SessionSummary};
use gauntlet_core::protocol::{ActorId, AgentBus, AgentMessage, MessagePayload};
use gauntlet_core::scenario::{DecisionProbe, ScenarioContext, ScenarioScript};
use gauntlet_core::scoring::{score_session, SessionEvaluation};
use gauntlet_core::session::{DecisionPoint, NarrativePhase, Session, TurnRole};
use gauntlet_core::taxonomy::{DifficultyLevel, ThreatType};
use gauntlet_core::{GauntletError, Result};

use crate::actor::actor_id;
use crate::classifier::ActionClassifier;
use crate::library::ScenarioLibrary;

/// The orchestrator's identity on the agent bus.
pub const ORCHESTRATOR_ID: &str = "orchestrator";

/// Result of starting a scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartedScenario {
    pub session_id: String,
    pub threat_type: ThreatType,
    pub difficulty: DifficultyLevel,
    /// Opening adversary message shown to the trainee.
    pub opening: String,
    /// True when the threat actor was unavailable and a cached template
    /// scenario was used instead.
    pub used_fallback: bool,
}

/// Result of processing one trainee input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeUpdate {
    /// Content appended in response to the input.
    pub reply: String,
    pub phase: NarrativePhase,
    /// Whether this input resolved a decision point.
    pub decision_recorded: bool,
    /// Whether the scenario narrative has ended and the session can be
    /// completed.
    pub scenario_complete: bool,
}

/// Consolidated result of completing a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub summary: SessionSummary,
    pub evaluation: SessionEvaluation,
    /// Difficulty the profile was adapted to for the next scenario.
    pub next_difficulty: DifficultyLevel,
    pub debrief: String,
}

/// A probe armed by the last adversary beat, awaiting the trainee's
/// response.
struct PendingProbe {
    probe: DecisionProbe,
    /// When the stimulus was shown, for response latency.
    since: DateTime<Utc>,
}

/// Per-session runtime state, serialized behind one mutex per session.
struct SessionHandle {
    session: Session,
    script: ScenarioScript,
    /// Index of the next beat to play.
    cursor: usize,
    pending_probe: Option<PendingProbe>,
}

/// Drives training sessions end to end.
pub struct Orchestrator {
    id: ActorId,
    /// Recipient of invisible-assessment notifications, when configured.
    assessor: Option<ActorId>,
    bus: Arc<AgentBus>,
    profiles: Arc<dyn ProfileRepository>,
    records: Arc<dyn SessionRecordRepository>,
    classifier: Arc<dyn ActionClassifier>,
    library: Arc<ScenarioLibrary>,
    controller: DifficultyController,
    config: GauntletConfig,
    sessions: RwLock<HashMap<String, Arc<Mutex<SessionHandle>>>>,
    /// Randomness source for the controller's tie-break, seedable for
    /// reproducible runs.
    rng: StdMutex<StdRng>,
}

impl Orchestrator {
    /// Creates an orchestrator and registers it on the bus.
    pub async fn new(
        bus: Arc<AgentBus>,
        profiles: Arc<dyn ProfileRepository>,
        records: Arc<dyn SessionRecordRepository>,
        classifier: Arc<dyn ActionClassifier>,
        library: Arc<ScenarioLibrary>,
        config: GauntletConfig,
    ) -> Self {
        let id = ActorId::new(ORCHESTRATOR_ID);
        bus.register(&id).await;
        let controller = DifficultyController::new(config.difficulty.clone());
        Self {
            id,
            assessor: None,
            bus,
            profiles,
            records,
            classifier,
            library,
            controller,
            config,
            sessions: RwLock::new(HashMap::new()),
            rng: StdMutex::new(StdRng::from_entropy()),
        }
    }

    /// Sets the agent that receives invisible-assessment notifications.
    pub fn with_assessor(mut self, assessor: ActorId) -> Self {
        self.assessor = Some(assessor);
        self
    }

    /// Seeds the controller's randomness source for reproducible runs.
    pub fn with_rng_seed(self, seed: u64) -> Self {
        *self.rng.lock().expect("rng lock poisoned") = StdRng::seed_from_u64(seed);
        self
    }

    /// Starts a scenario for a user.
    ///
    /// Consults the trainee's profile for difficulty and the difficulty
    /// controller for the focus category and pattern choice, then activates
    /// the matching threat actor over the bus. If the actor does not answer
    /// within the activation deadline (or answers with a failure signal)
    /// the session starts from a cached template scenario instead.
    pub async fn start_scenario(
        &self,
        user_id: &str,
        requested: Option<ThreatType>,
    ) -> Result<StartedScenario> {
        let profile = self.profiles.load(user_id).await?;
        let threat_type = requested.unwrap_or(ThreatType::Phishing);
        let difficulty = profile.difficulty;

        let focus = {
            let mut rng = self.rng.lock().expect("rng lock poisoned");
            self.controller.focus_category(&profile, &mut *rng)
        };
        let available = self.library.pattern_ids(threat_type);
        let preferred = self
            .controller
            .select_pattern(&available, &profile)
            .map(str::to_string);
        let vulnerability_areas = profile
            .failure_counts
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(category, _)| *category)
            .collect();

        let mut session = Session::new(user_id, threat_type, difficulty);
        let session_id = session.id.clone();
        let context = ScenarioContext {
            threat_type,
            difficulty,
            focus,
            preferred_pattern: preferred,
            recently_used_patterns: profile.recently_used_patterns.iter().cloned().collect(),
            vulnerability_areas,
        };

        let target = actor_id(threat_type);
        let (script, used_fallback) = self
            .activate(&target, &session_id, context, threat_type)
            .await?;

        session.active_actor = if used_fallback {
            None
        } else {
            Some(target.to_string())
        };
        let opening = script.opening.clone();
        session.append_turn(TurnRole::Adversary, opening.clone())?;
        session.transition(NarrativePhase::Engaged)?;

        tracing::info!(
            session = %session_id,
            user = %user_id,
            threat = %threat_type,
            fallback = used_fallback,
            "scenario started"
        );

        let handle = Arc::new(Mutex::new(SessionHandle {
            session,
            script,
            cursor: 0,
            pending_probe: None,
        }));
        self.sessions
            .write()
            .await
            .insert(session_id.clone(), handle);

        Ok(StartedScenario {
            session_id,
            threat_type,
            difficulty,
            opening,
            used_fallback,
        })
    }

    /// Requests a scenario script from the threat actor, degrading to the
    /// template library on any recoverable failure.
    async fn activate(
        &self,
        target: &ActorId,
        session_id: &str,
        context: ScenarioContext,
        threat_type: ThreatType,
    ) -> Result<(ScenarioScript, bool)> {
        let request = AgentMessage::new(
            self.id.clone(),
            target.clone(),
            session_id,
            MessagePayload::ActivateScenario { context },
        );
        let timeout = Duration::from_millis(self.config.protocol.activation_timeout_ms);

        match self.bus.request(request, timeout).await {
            Ok(response) => match response.payload {
                MessagePayload::ScenarioReady { script } => Ok((script, false)),
                MessagePayload::ActivationFailed { reason } => {
                    tracing::warn!(actor = %target, %reason, "activation failed, using template");
                    Ok((self.fallback_script(threat_type)?, true))
                }
                other => {
                    tracing::warn!(
                        actor = %target,
                        kind = other.kind(),
                        "unexpected activation response, using template"
                    );
                    Ok((self.fallback_script(threat_type)?, true))
                }
            },
            Err(err)
                if err.is_recoverable() || matches!(err, GauntletError::UnknownRecipient(_)) =>
            {
                tracing::warn!(actor = %target, error = %err, "actor unavailable, using template");
                Ok((self.fallback_script(threat_type)?, true))
            }
            Err(err) => Err(err),
        }
    }

    fn fallback_script(&self, threat_type: ThreatType) -> Result<ScenarioScript> {
        self.library
            .fallback_script(threat_type)
            .ok_or_else(|| GauntletError::internal("scenario library has no fallback content"))
    }

    /// Processes one trainee input.
    ///
    /// Appends the turn, resolves a pending decision probe if one is armed,
    /// and advances the narrative. Inputs for the same session are
    /// serialized by the per-session lock; a paused session rejects input
    /// until resumed.
    pub async fn submit_user_input(&self, session_id: &str, text: &str) -> Result<NarrativeUpdate> {
        let handle = self.handle(session_id).await?;
        let mut guard = handle.lock().await;
        let state = &mut *guard;

        let turn_index = state.session.append_turn(TurnRole::Trainee, text)?;

        let mut decision_recorded = false;
        if let Some(pending) = state.pending_probe.take() {
            let action = self.classifier.classify(text).await;
            let latency_ms = (Utc::now() - pending.since).num_milliseconds().max(0);
            let decision = DecisionPoint::evaluate(
                turn_index,
                pending.probe.vulnerability,
                action,
                pending.probe.correct_action,
                latency_ms,
                state.session.difficulty,
                &self.config.scoring,
            );
            state.session.record_decision(decision.clone())?;
            state.session.transition(NarrativePhase::Engaged)?;
            decision_recorded = true;

            tracing::debug!(
                session = %session_id,
                vulnerability = %decision.vulnerability,
                action = %decision.action,
                "decision recorded"
            );
            self.notify_assessor(session_id, MessagePayload::TrackScenario { decision })
                .await;
        }

        let (reply, scenario_complete) = Self::advance(state)?;

        Ok(NarrativeUpdate {
            reply,
            phase: state.session.phase(),
            decision_recorded,
            scenario_complete,
        })
    }

    /// Plays the next beat, or resolves the scenario when the script is
    /// exhausted.
    fn advance(state: &mut SessionHandle) -> Result<(String, bool)> {
        if state.session.phase() == NarrativePhase::Resolved {
            let reminder =
                "The scenario has already concluded. Complete the session to receive \
                 your debrief."
                    .to_string();
            state
                .session
                .append_turn(TurnRole::Narrator, reminder.clone())?;
            return Ok((reminder, true));
        }

        if let Some(beat) = state.script.beats.get(state.cursor).cloned() {
            state.cursor += 1;
            state
                .session
                .append_turn(TurnRole::Adversary, beat.adversary_line.clone())?;
            if let Some(probe) = beat.probe {
                state.session.transition(NarrativePhase::DecisionPending)?;
                state.pending_probe = Some(PendingProbe {
                    probe,
                    since: Utc::now(),
                });
            }
            Ok((beat.adversary_line, false))
        } else {
            state.session.transition(NarrativePhase::Resolved)?;
            let closing =
                "The scenario has concluded. Complete the session to review your decisions."
                    .to_string();
            state
                .session
                .append_turn(TurnRole::Narrator, closing.clone())?;
            Ok((closing, true))
        }
    }

    /// Completes a resolved session: debrief, scoring, profile adaptation,
    /// and record persistence.
    ///
    /// # Errors
    ///
    /// Returns `PrematureCompletion` while the narrative has not resolved;
    /// the caller should feed further input and retry.
    pub async fn complete_session(&self, session_id: &str) -> Result<EvaluationReport> {
        let handle = self.handle(session_id).await?;
        let mut guard = handle.lock().await;
        let state = &mut *guard;

        match state.session.phase() {
            NarrativePhase::Resolved => {
                state.session.transition(NarrativePhase::Debrief)?;
                let debrief = Self::debrief_text(&state.session);
                state.session.append_turn(TurnRole::Narrator, debrief)?;
            }
            NarrativePhase::Debrief => {}
            phase => return Err(GauntletError::PrematureCompletion { phase }),
        }
        let debrief = Self::debrief_text(&state.session);

        state.session.transition(NarrativePhase::Closed)?;
        let evaluation = score_session(
            state.session.decisions(),
            state.session.difficulty,
            &self.config.scoring,
        );
        state.session.mark_scored();

        let active_actor = state.session.active_actor.clone();
        let summary = SessionSummary {
            session_id: state.session.id.clone(),
            user_id: state.session.user_id.clone(),
            threat_type: state.session.threat_type,
            difficulty: state.session.difficulty,
            pattern_id: Some(state.script.pattern_id.clone()),
            overall_score: evaluation.overall_score,
            risk_level: evaluation.risk_level,
            failed_categories: evaluation.failed_categories(),
            decisions_analyzed: evaluation.decisions_analyzed,
            hints_used: state.session.hints_used,
            duration_secs: state.session.duration().num_seconds(),
            completed_at: state.session.ended_at.unwrap_or_else(Utc::now),
        };

        // Atomic per-user read-modify-write: window, failure counts,
        // pattern recency, and the difficulty adaptation all land in one
        // repository update.
        let controller = self.controller.clone();
        let applied = summary.clone();
        let updated = self
            .profiles
            .update(
                &summary.user_id,
                Box::new(move |profile| {
                    profile.apply_summary(&applied, controller.settings());
                    profile.difficulty = controller.next_level(profile);
                }),
            )
            .await?;

        self.records.append(&summary).await?;
        self.notify_assessor(
            session_id,
            MessagePayload::SessionComplete {
                summary: summary.clone(),
            },
        )
        .await;

        // Tell the actor that served this session how the next one should
        // look. Best-effort, like all invisible coordination.
        if let (Some(actor), Some(focus)) = (
            active_actor,
            evaluation.recommendations.first().copied(),
        ) {
            let adapt = AgentMessage::new(
                self.id.clone(),
                ActorId::new(actor),
                session_id,
                MessagePayload::AdaptScenario {
                    difficulty: updated.difficulty,
                    focus,
                },
            );
            if let Err(err) = self.bus.send(adapt).await {
                tracing::debug!(error = %err, "adapt notification dropped");
            }
        }

        tracing::info!(
            session = %session_id,
            score = ?summary.overall_score,
            risk = %summary.risk_level,
            next_difficulty = %updated.difficulty,
            "session completed"
        );

        drop(guard);
        self.sessions.write().await.remove(session_id);

        Ok(EvaluationReport {
            summary,
            evaluation,
            next_difficulty: updated.difficulty,
            debrief,
        })
    }

    /// Pauses a session at a turn boundary.
    pub async fn pause_session(&self, session_id: &str) -> Result<()> {
        let handle = self.handle(session_id).await?;
        let mut guard = handle.lock().await;
        guard.session.pause()
    }

    /// Resumes a paused session, restoring its exact prior state. A probe
    /// that was pending at pause time is re-armed.
    pub async fn resume_session(&self, session_id: &str) -> Result<NarrativePhase> {
        let handle = self.handle(session_id).await?;
        let mut guard = handle.lock().await;
        guard.session.resume()?;
        if guard.pending_probe.is_some() {
            guard.session.transition(NarrativePhase::DecisionPending)?;
        }
        Ok(guard.session.phase())
    }

    /// Surfaces a hint for the current decision and counts it against the
    /// session.
    pub async fn use_hint(&self, session_id: &str) -> Result<String> {
        let handle = self.handle(session_id).await?;
        let mut guard = handle.lock().await;
        let hint = match &guard.pending_probe {
            Some(pending) => format!(
                "Notice how {} is being used to pressure you. What would you normally \
                 do before acting on a request like this?",
                pending.probe.vulnerability
            ),
            None => "Take your time and consider whether this request is legitimate.".to_string(),
        };
        guard.session.append_turn(TurnRole::Narrator, hint.clone())?;
        guard.session.record_hint();
        Ok(hint)
    }

    /// Read-only snapshot of a session's current state.
    pub async fn session_snapshot(&self, session_id: &str) -> Result<Session> {
        let handle = self.handle(session_id).await?;
        let guard = handle.lock().await;
        Ok(guard.session.clone())
    }

    async fn handle(&self, session_id: &str) -> Result<Arc<Mutex<SessionHandle>>> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| GauntletError::SessionNotFound(session_id.to_string()))
    }

    /// Best-effort notification; invisible assessment never disrupts the
    /// training flow.
    async fn notify_assessor(&self, session_id: &str, payload: MessagePayload) {
        let Some(assessor) = &self.assessor else {
            return;
        };
        let message = AgentMessage::new(
            self.id.clone(),
            assessor.clone(),
            session_id,
            payload,
        );
        if let Err(err) = self.bus.send(message).await {
            tracing::debug!(assessor = %assessor, error = %err, "assessor notification dropped");
        }
    }

    fn debrief_text(session: &Session) -> String {
        let total = session.decisions().len();
        let safe = session
            .decisions()
            .iter()
            .filter(|d| d.is_correct())
            .count();
        format!(
            "Training debrief: you faced {total} decision point(s) and handled {safe} \
             safely. Review which requests deserved independent verification before \
             acting, and remember that reporting a suspicious contact is always a \
             safe first step."
        )
    }
}
