//! Gauntlet agent layer: threat actors, the narrative-provider boundary,
//! decision classification, and the orchestrator that drives training
//! sessions end to end.

pub mod actor;
pub mod classifier;
pub mod library;
pub mod orchestrator;
pub mod personas;
pub mod provider;

pub use actor::{actor_id, ScriptedActor};
pub use classifier::{ActionClassifier, KeywordClassifier};
pub use library::ScenarioLibrary;
pub use orchestrator::{
    EvaluationReport, NarrativeUpdate, Orchestrator, StartedScenario, ORCHESTRATOR_ID,
};
pub use provider::{
    generate_with_retry, NarrativeProvider, PromptContext, ProviderError, RetryPolicy,
    StaticProvider, UnavailableProvider,
};
