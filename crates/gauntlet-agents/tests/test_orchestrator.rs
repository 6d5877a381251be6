//! End-to-end orchestrator tests: scenario activation over the bus,
//! invisible decision tracking, fallback behavior, and session completion.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use gauntlet_agents::actor::{actor_id, ScriptedActor};
use gauntlet_agents::classifier::KeywordClassifier;
use gauntlet_agents::library::ScenarioLibrary;
use gauntlet_agents::orchestrator::Orchestrator;
use gauntlet_agents::provider::StaticProvider;
use gauntlet_core::config::GauntletConfig;
use gauntlet_core::profile::{ProfileRepository, SessionRecordRepository};
use gauntlet_core::protocol::{ActorId, AgentBus, MessagePayload};
use gauntlet_core::scoring::RiskLevel;
use gauntlet_core::session::NarrativePhase;
use gauntlet_core::taxonomy::{DifficultyLevel, ThreatType};
use gauntlet_core::GauntletError;
use gauntlet_infrastructure::{InMemoryProfileRepository, InMemoryRecordRepository};

struct Harness {
    bus: Arc<AgentBus>,
    orchestrator: Orchestrator,
    profiles: Arc<InMemoryProfileRepository>,
    records: Arc<InMemoryRecordRepository>,
    cancel: CancellationToken,
}

async fn harness(config: GauntletConfig, assessor: Option<&str>) -> Harness {
    let bus = Arc::new(AgentBus::new());
    let profiles = Arc::new(InMemoryProfileRepository::new());
    let records = Arc::new(InMemoryRecordRepository::new());
    let cancel = CancellationToken::new();

    let mut orchestrator = Orchestrator::new(
        bus.clone(),
        profiles.clone(),
        records.clone(),
        Arc::new(KeywordClassifier),
        ScenarioLibrary::builtin(),
        config,
    )
    .await
    .with_rng_seed(7);

    if let Some(assessor) = assessor {
        let assessor = ActorId::from(assessor);
        bus.register(&assessor).await;
        orchestrator = orchestrator.with_assessor(assessor);
    }

    Harness {
        bus,
        orchestrator,
        profiles,
        records,
        cancel,
    }
}

async fn spawn_phishing_actor(harness: &Harness, opening: &str) {
    let actor = Arc::new(ScriptedActor::new(
        ThreatType::Phishing,
        Arc::new(StaticProvider::new(opening)),
        ScenarioLibrary::builtin(),
    ));
    actor
        .clone()
        .spawn(harness.bus.clone(), harness.cancel.clone())
        .await;
}

/// Walks the built-in phishing script to resolution with safe responses.
async fn play_to_resolution(harness: &Harness, session_id: &str) {
    // Advance into the first probing beat.
    let update = harness
        .orchestrator
        .submit_user_input(session_id, "Hello? Who is this?")
        .await
        .unwrap();
    assert_eq!(update.phase, NarrativePhase::DecisionPending);
    assert!(!update.decision_recorded);

    // Resolve the urgency probe by reporting.
    let update = harness
        .orchestrator
        .submit_user_input(
            session_id,
            "This looks like phishing. I'm reporting it to the security team.",
        )
        .await
        .unwrap();
    assert!(update.decision_recorded);
    assert_eq!(update.phase, NarrativePhase::DecisionPending);

    // Resolve the authority probe by verifying.
    let update = harness
        .orchestrator
        .submit_user_input(
            session_id,
            "I'll verify with the finance director on the official number first.",
        )
        .await
        .unwrap();
    assert!(update.decision_recorded);
    assert!(update.scenario_complete);
    assert_eq!(update.phase, NarrativePhase::Resolved);
}

#[tokio::test]
async fn full_session_through_live_actor() {
    let harness = harness(GauntletConfig::default(), Some("assessor")).await;
    spawn_phishing_actor(&harness, "Personalized opening: your invoice is overdue.").await;

    let started = harness
        .orchestrator
        .start_scenario("user-1", Some(ThreatType::Phishing))
        .await
        .unwrap();
    assert!(!started.used_fallback);
    assert_eq!(started.opening, "Personalized opening: your invoice is overdue.");
    assert_eq!(started.difficulty, DifficultyLevel::Intermediate);

    play_to_resolution(&harness, &started.session_id).await;

    let report = harness
        .orchestrator
        .complete_session(&started.session_id)
        .await
        .unwrap();

    // Recognized (100) + verified (80) average to 90: low risk.
    let score = report.evaluation.overall_score.unwrap();
    assert!((score - 90.0).abs() < 1e-9, "expected 90.0, got {score}");
    assert_eq!(report.evaluation.risk_level, RiskLevel::Low);
    assert_eq!(report.evaluation.correct_decisions, 2);
    assert!(report.summary.failed_categories.is_empty());
    // One strong session is not a trend; difficulty holds.
    assert_eq!(report.next_difficulty, DifficultyLevel::Intermediate);

    // Profile was updated atomically at completion.
    let profile = harness.profiles.load("user-1").await.unwrap();
    assert_eq!(profile.sessions_completed, 1);
    assert_eq!(
        profile.recently_used_patterns.front().map(String::as_str),
        Some("phishing-overdue-invoice")
    );

    // Session record persisted.
    let records = harness.records.list_for_user("user-1").await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].session_id, started.session_id);

    // Invisible assessment: two decisions tracked, then the completion.
    let assessor = ActorId::from("assessor");
    for expected in ["track_scenario", "track_scenario", "session_complete"] {
        let message = harness
            .bus
            .receive(&assessor, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(message.payload.kind(), expected);
        if let MessagePayload::SessionComplete { summary } = message.payload {
            assert_eq!(summary.session_id, started.session_id);
        }
    }

    harness.cancel.cancel();
}

#[tokio::test]
async fn silent_actor_falls_back_to_template_and_session_still_closes() {
    let mut config = GauntletConfig::default();
    config.protocol.activation_timeout_ms = 50;
    let harness = harness(config, None).await;

    // Mailbox exists but nothing serves it: activation must time out.
    harness
        .bus
        .register(&actor_id(ThreatType::Phishing))
        .await;

    let started = harness
        .orchestrator
        .start_scenario("user-1", Some(ThreatType::Phishing))
        .await
        .unwrap();
    assert!(started.used_fallback);

    // The template opening is served verbatim.
    let template = ScenarioLibrary::builtin()
        .script_by_pattern("phishing-overdue-invoice")
        .unwrap()
        .opening
        .clone();
    assert_eq!(started.opening, template);

    // The degraded session still plays and closes with a valid result.
    play_to_resolution(&harness, &started.session_id).await;
    let report = harness
        .orchestrator
        .complete_session(&started.session_id)
        .await
        .unwrap();
    assert!(report.evaluation.overall_score.is_some());

    let snapshot_err = harness
        .orchestrator
        .session_snapshot(&started.session_id)
        .await
        .unwrap_err();
    assert!(matches!(snapshot_err, GauntletError::SessionNotFound(_)));
}

#[tokio::test]
async fn unregistered_actor_also_falls_back() {
    let harness = harness(GauntletConfig::default(), None).await;

    let started = harness
        .orchestrator
        .start_scenario("user-1", Some(ThreatType::Vishing))
        .await
        .unwrap();
    assert!(started.used_fallback);

    let snapshot = harness
        .orchestrator
        .session_snapshot(&started.session_id)
        .await
        .unwrap();
    assert_eq!(snapshot.phase(), NarrativePhase::Engaged);
    assert!(snapshot.active_actor.is_none());
}

#[tokio::test]
async fn completing_an_unresolved_session_is_rejected() {
    let harness = harness(GauntletConfig::default(), None).await;
    spawn_phishing_actor(&harness, "opening").await;

    let started = harness
        .orchestrator
        .start_scenario("user-1", Some(ThreatType::Phishing))
        .await
        .unwrap();

    harness
        .orchestrator
        .submit_user_input(&started.session_id, "Hello?")
        .await
        .unwrap();

    let err = harness
        .orchestrator
        .complete_session(&started.session_id)
        .await
        .unwrap_err();
    assert!(matches!(err, GauntletError::PrematureCompletion { .. }));

    harness.cancel.cancel();
}

#[tokio::test]
async fn pause_blocks_input_and_resume_restores_pending_decision() {
    let harness = harness(GauntletConfig::default(), None).await;
    spawn_phishing_actor(&harness, "opening").await;

    let started = harness
        .orchestrator
        .start_scenario("user-1", Some(ThreatType::Phishing))
        .await
        .unwrap();

    let update = harness
        .orchestrator
        .submit_user_input(&started.session_id, "Hello?")
        .await
        .unwrap();
    assert_eq!(update.phase, NarrativePhase::DecisionPending);

    harness
        .orchestrator
        .pause_session(&started.session_id)
        .await
        .unwrap();

    let err = harness
        .orchestrator
        .submit_user_input(&started.session_id, "still there?")
        .await
        .unwrap_err();
    assert!(matches!(err, GauntletError::InvalidState { .. }));

    let phase = harness
        .orchestrator
        .resume_session(&started.session_id)
        .await
        .unwrap();
    assert_eq!(phase, NarrativePhase::DecisionPending);

    // The re-armed probe still resolves normally.
    let update = harness
        .orchestrator
        .submit_user_input(&started.session_id, "I'm reporting this as a scam.")
        .await
        .unwrap();
    assert!(update.decision_recorded);

    let snapshot = harness
        .orchestrator
        .session_snapshot(&started.session_id)
        .await
        .unwrap();
    assert_eq!(snapshot.pause_count, 1);
    assert_eq!(snapshot.decisions().len(), 1);

    harness.cancel.cancel();
}

#[tokio::test]
async fn hints_are_counted_and_reported() {
    let harness = harness(GauntletConfig::default(), None).await;
    spawn_phishing_actor(&harness, "opening").await;

    let started = harness
        .orchestrator
        .start_scenario("user-1", Some(ThreatType::Phishing))
        .await
        .unwrap();

    harness
        .orchestrator
        .submit_user_input(&started.session_id, "Hello?")
        .await
        .unwrap();

    let hint = harness
        .orchestrator
        .use_hint(&started.session_id)
        .await
        .unwrap();
    assert!(hint.contains("urgency"));

    let snapshot = harness
        .orchestrator
        .session_snapshot(&started.session_id)
        .await
        .unwrap();
    assert_eq!(snapshot.hints_used, 1);

    harness.cancel.cancel();
}
