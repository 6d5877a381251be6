//! Scripted threat actors.
//!
//! A threat actor serves its mailbox on the agent bus: activation requests
//! come in, scenario scripts go out. Scripts start from the template
//! library and get their opening personalized through the narrative
//! provider; when the provider is down the template text ships as-is, so an
//! activation only fails outright when the actor has no content at all.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use gauntlet_core::protocol::{ActorId, AgentBus, AgentMessage, MessagePayload};
use gauntlet_core::scenario::{ScenarioContext, ScenarioScript};
use gauntlet_core::taxonomy::ThreatType;

use crate::library::ScenarioLibrary;
use crate::personas::persona_for;
use crate::provider::{generate_with_retry, NarrativeProvider, PromptContext, RetryPolicy};

/// How often an idle actor checks for shutdown between receive deadlines.
const MAILBOX_POLL: Duration = Duration::from_millis(500);

/// Conventional actor id for a threat type.
pub fn actor_id(threat_type: ThreatType) -> ActorId {
    ActorId::new(format!("{threat_type}_actor"))
}

/// A threat actor that plays scenarios from the template library.
pub struct ScriptedActor {
    id: ActorId,
    threat_type: ThreatType,
    provider: Arc<dyn NarrativeProvider>,
    library: Arc<ScenarioLibrary>,
    retry: RetryPolicy,
}

impl ScriptedActor {
    pub fn new(
        threat_type: ThreatType,
        provider: Arc<dyn NarrativeProvider>,
        library: Arc<ScenarioLibrary>,
    ) -> Self {
        Self {
            id: actor_id(threat_type),
            threat_type,
            provider,
            library,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn id(&self) -> &ActorId {
        &self.id
    }

    pub fn threat_type(&self) -> ThreatType {
        self.threat_type
    }

    /// Registers the actor's mailbox and starts its serve loop.
    ///
    /// The loop runs until `cancel` fires. Registration completes before
    /// this returns, so callers can send immediately afterwards.
    pub async fn spawn(
        self: Arc<Self>,
        bus: Arc<AgentBus>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        bus.register(&self.id).await;
        tokio::spawn(async move {
            self.run(bus, cancel).await;
        })
    }

    async fn run(&self, bus: Arc<AgentBus>, cancel: CancellationToken) {
        tracing::info!(actor = %self.id, "threat actor online");
        loop {
            if cancel.is_cancelled() {
                break;
            }
            match bus.receive(&self.id, MAILBOX_POLL).await {
                Ok(message) => self.handle(&bus, message).await,
                Err(err) if err.is_timeout() => continue,
                Err(err) => {
                    tracing::warn!(actor = %self.id, error = %err, "mailbox unavailable");
                    break;
                }
            }
        }
        tracing::info!(actor = %self.id, "threat actor offline");
    }

    async fn handle(&self, bus: &AgentBus, message: AgentMessage) {
        match &message.payload {
            MessagePayload::ActivateScenario { context } => {
                let payload = match self.build_script(context).await {
                    Some(script) => MessagePayload::ScenarioReady { script },
                    None => MessagePayload::ActivationFailed {
                        reason: format!("no {} scenario content available", self.threat_type),
                    },
                };
                if let Err(err) = bus.respond(&message, payload).await {
                    tracing::warn!(actor = %self.id, error = %err, "failed to answer activation");
                }
            }
            MessagePayload::TrackScenario { .. }
            | MessagePayload::AdaptScenario { .. }
            | MessagePayload::SessionComplete { .. } => {
                tracing::debug!(
                    actor = %self.id,
                    kind = message.payload.kind(),
                    "acknowledged notification"
                );
            }
            other => {
                tracing::warn!(actor = %self.id, kind = other.kind(), "unexpected message");
            }
        }
    }

    /// Assembles a script for the activation context.
    ///
    /// Pattern choice honors the controller's preference, then avoids
    /// recently used patterns, then falls back to any content for the
    /// threat type. Returns `None` only when the library is empty.
    async fn build_script(&self, context: &ScenarioContext) -> Option<ScenarioScript> {
        let base = context
            .preferred_pattern
            .as_deref()
            .and_then(|p| self.library.script_by_pattern(p))
            .cloned()
            .or_else(|| {
                self.library
                    .scripts_for(self.threat_type)
                    .into_iter()
                    .find(|s| !context.recently_used_patterns.contains(&s.pattern_id))
                    .cloned()
            })
            .or_else(|| self.library.fallback_script(self.threat_type))?;

        Some(self.personalize(base, context).await)
    }

    /// Rewrites the opening through the provider; keeps template text on
    /// any provider failure.
    async fn personalize(
        &self,
        mut script: ScenarioScript,
        context: &ScenarioContext,
    ) -> ScenarioScript {
        let prompt = PromptContext {
            system: persona_for(self.threat_type).to_string(),
            history: Vec::new(),
            request: format!(
                "Rewrite this scenario opening for difficulty level {} with emphasis \
                 on {} pressure, keeping the same intent:\n{}",
                context.difficulty.level(),
                context.focus,
                script.opening
            ),
            scenario: Some(context.clone()),
        };

        match generate_with_retry(self.provider.as_ref(), &prompt, &self.retry).await {
            Ok(opening) if !opening.trim().is_empty() => {
                script.opening = opening;
                script
            }
            Ok(_) => script,
            Err(err) => {
                tracing::warn!(
                    actor = %self.id,
                    error = %err,
                    "provider unavailable, using template opening"
                );
                script
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{StaticProvider, UnavailableProvider};
    use gauntlet_core::taxonomy::{DifficultyLevel, VulnerabilityCategory};
    use std::time::Duration;

    fn context(preferred: Option<&str>, recent: &[&str]) -> ScenarioContext {
        ScenarioContext {
            threat_type: ThreatType::Phishing,
            difficulty: DifficultyLevel::Intermediate,
            focus: VulnerabilityCategory::Urgency,
            preferred_pattern: preferred.map(|s| s.to_string()),
            recently_used_patterns: recent.iter().map(|s| s.to_string()).collect(),
            vulnerability_areas: vec![],
        }
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 2,
            base_delay_ms: 1,
            multiplier: 1.0,
            max_delay_ms: 1,
        }
    }

    #[tokio::test]
    async fn preferred_pattern_is_honored() {
        let actor = ScriptedActor::new(
            ThreatType::Phishing,
            Arc::new(StaticProvider::new("custom opening")),
            ScenarioLibrary::builtin(),
        );

        let script = actor
            .build_script(&context(Some("phishing-prize-claim"), &[]))
            .await
            .unwrap();
        assert_eq!(script.pattern_id, "phishing-prize-claim");
        assert_eq!(script.opening, "custom opening");
    }

    #[tokio::test]
    async fn recently_used_patterns_are_skipped() {
        let actor = ScriptedActor::new(
            ThreatType::Phishing,
            Arc::new(StaticProvider::new("opening")),
            ScenarioLibrary::builtin(),
        );

        let script = actor
            .build_script(&context(None, &["phishing-overdue-invoice"]))
            .await
            .unwrap();
        assert_eq!(script.pattern_id, "phishing-prize-claim");
    }

    #[tokio::test]
    async fn provider_failure_keeps_template_opening() {
        let actor = ScriptedActor::new(
            ThreatType::Phishing,
            Arc::new(UnavailableProvider),
            ScenarioLibrary::builtin(),
        )
        .with_retry_policy(fast_retry());

        let script = actor.build_script(&context(None, &[])).await.unwrap();
        let template = ScenarioLibrary::builtin()
            .script_by_pattern(&script.pattern_id)
            .unwrap()
            .opening
            .clone();
        assert_eq!(script.opening, template);
    }

    #[tokio::test]
    async fn empty_library_yields_activation_failure() {
        let actor = ScriptedActor::new(
            ThreatType::Phishing,
            Arc::new(StaticProvider::new("opening")),
            Arc::new(ScenarioLibrary::new(vec![])),
        );

        assert!(actor.build_script(&context(None, &[])).await.is_none());
    }

    #[tokio::test]
    async fn spawned_actor_answers_activation_over_the_bus() {
        let bus = Arc::new(AgentBus::new());
        let cancel = CancellationToken::new();
        let actor = Arc::new(ScriptedActor::new(
            ThreatType::Vishing,
            Arc::new(StaticProvider::new("personalized call opening")),
            ScenarioLibrary::builtin(),
        ));
        let handle = actor.clone().spawn(bus.clone(), cancel.clone()).await;

        let orchestrator = ActorId::from("orchestrator");
        bus.register(&orchestrator).await;

        let request = AgentMessage::new(
            orchestrator,
            actor_id(ThreatType::Vishing),
            "session-1",
            MessagePayload::ActivateScenario {
                context: ScenarioContext {
                    threat_type: ThreatType::Vishing,
                    difficulty: DifficultyLevel::Novice,
                    focus: VulnerabilityCategory::Fear,
                    preferred_pattern: None,
                    recently_used_patterns: vec![],
                    vulnerability_areas: vec![],
                },
            },
        );

        let response = bus.request(request, Duration::from_secs(2)).await.unwrap();
        match response.payload {
            MessagePayload::ScenarioReady { script } => {
                assert_eq!(script.threat_type, ThreatType::Vishing);
                assert_eq!(script.opening, "personalized call opening");
            }
            other => panic!("unexpected payload: {}", other.kind()),
        }

        cancel.cancel();
        handle.await.unwrap();
    }
}
