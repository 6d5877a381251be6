//! Long-term user state: profiles, session summaries, and the memory
//! collaborator contracts.

mod model;
mod repository;

pub use model::{ScenarioOutcome, SessionSummary, UserProfile};
pub use repository::{ProfileRepository, SessionRecordRepository};
