//! Narrative generation boundary.
//!
//! The model call itself is an external collaborator: the core only needs
//! `generate(context) -> text`. Transient provider failures are retried a
//! bounded number of times with exponential backoff; content refusals are
//! not retried at all. After exhaustion the caller degrades to template
//! content — provider trouble never reaches the trainee as a failure.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use gauntlet_core::scenario::ScenarioContext;
use gauntlet_core::session::ConversationTurn;
use gauntlet_core::GauntletError;

/// Failure modes of the model-generation collaborator.
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// The provider refused the prompt. Deterministic; never retried.
    #[error("content blocked by provider")]
    ContentBlocked,
    /// The provider is unreachable or failing. Transient; retried with
    /// backoff.
    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

impl From<ProviderError> for GauntletError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::ContentBlocked => GauntletError::ContentBlocked,
            ProviderError::Unavailable(message) => GauntletError::ProviderUnavailable(message),
        }
    }
}

/// Prompt context handed to the provider.
///
/// Role instructions plus conversation history plus the concrete request;
/// all required context travels in the call.
#[derive(Debug, Clone)]
pub struct PromptContext {
    /// Role instructions for the generating persona.
    pub system: String,
    /// Conversation so far, oldest first.
    pub history: Vec<ConversationTurn>,
    /// What to generate now.
    pub request: String,
    /// Scenario parameters for personalization.
    pub scenario: Option<ScenarioContext>,
}

impl PromptContext {
    /// Assembles the final prompt text.
    pub fn render(&self) -> String {
        let history = self
            .history
            .iter()
            .map(|turn| format!("{:?}: {}", turn.role, turn.content))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "{}\n\n# Conversation History\n{}\n\n# Request\n{}",
            self.system, history, self.request
        )
    }
}

/// The model-generation collaborator.
#[async_trait]
pub trait NarrativeProvider: Send + Sync {
    /// Generates narrative text for the given context.
    async fn generate(&self, context: &PromptContext) -> Result<String, ProviderError>;
}

/// Bounded retry policy with exponential backoff.
///
/// Owned by the collaborator-boundary code; callers apply it via
/// [`generate_with_retry`] instead of hand-rolling retry loops.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay_ms: u64,
    /// Backoff multiplier applied per retry.
    pub multiplier: f64,
    /// Upper bound on any single delay.
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 100,
            multiplier: 2.0,
            max_delay_ms: 2_000,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (0-based).
    pub fn delay_for_attempt(&self, retry: u32) -> Duration {
        let delay = self.base_delay_ms as f64 * self.multiplier.powi(retry as i32);
        Duration::from_millis((delay as u64).min(self.max_delay_ms))
    }
}

/// Calls the provider under the retry policy.
///
/// `Unavailable` errors are retried up to `max_attempts` with backoff;
/// `ContentBlocked` is returned immediately since retrying a refusal is
/// pointless.
pub async fn generate_with_retry(
    provider: &dyn NarrativeProvider,
    context: &PromptContext,
    policy: &RetryPolicy,
) -> Result<String, ProviderError> {
    let mut last_error = ProviderError::Unavailable("no attempts made".to_string());

    for attempt in 0..policy.max_attempts.max(1) {
        match provider.generate(context).await {
            Ok(text) => return Ok(text),
            Err(ProviderError::ContentBlocked) => return Err(ProviderError::ContentBlocked),
            Err(err) => {
                tracing::warn!(attempt, error = %err, "narrative provider attempt failed");
                last_error = err;
                if attempt + 1 < policy.max_attempts {
                    tokio::time::sleep(policy.delay_for_attempt(attempt)).await;
                }
            }
        }
    }

    Err(last_error)
}

/// Provider returning a fixed response, for tests and offline use.
pub struct StaticProvider {
    response: String,
}

impl StaticProvider {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

#[async_trait]
impl NarrativeProvider for StaticProvider {
    async fn generate(&self, _context: &PromptContext) -> Result<String, ProviderError> {
        Ok(self.response.clone())
    }
}

/// Provider that always fails as unavailable, for exercising fallbacks.
pub struct UnavailableProvider;

#[async_trait]
impl NarrativeProvider for UnavailableProvider {
    async fn generate(&self, _context: &PromptContext) -> Result<String, ProviderError> {
        Err(ProviderError::Unavailable("provider offline".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyProvider {
        failures_before_success: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl NarrativeProvider for FlakyProvider {
        async fn generate(&self, _context: &PromptContext) -> Result<String, ProviderError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures_before_success {
                Err(ProviderError::Unavailable("flaky".to_string()))
            } else {
                Ok("generated".to_string())
            }
        }
    }

    struct BlockingProvider {
        calls: AtomicU32,
    }

    #[async_trait]
    impl NarrativeProvider for BlockingProvider {
        async fn generate(&self, _context: &PromptContext) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ProviderError::ContentBlocked)
        }
    }

    fn context() -> PromptContext {
        PromptContext {
            system: "You are a phishing adversary.".to_string(),
            history: vec![],
            request: "Open the scenario.".to_string(),
            scenario: None,
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay_ms: 1,
            multiplier: 2.0,
            max_delay_ms: 5,
        }
    }

    #[tokio::test]
    async fn transient_failures_are_retried_to_success() {
        let provider = FlakyProvider {
            failures_before_success: 2,
            calls: AtomicU32::new(0),
        };
        let text = generate_with_retry(&provider, &context(), &fast_policy())
            .await
            .unwrap();
        assert_eq!(text, "generated");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausted_retries_return_last_error() {
        let provider = FlakyProvider {
            failures_before_success: 10,
            calls: AtomicU32::new(0),
        };
        let err = generate_with_retry(&provider, &context(), &fast_policy())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Unavailable(_)));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn content_blocks_are_not_retried() {
        let provider = BlockingProvider {
            calls: AtomicU32::new(0),
        };
        let err = generate_with_retry(&provider, &context(), &fast_policy())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::ContentBlocked));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn backoff_is_bounded() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(10), Duration::from_millis(2_000));
    }
}
