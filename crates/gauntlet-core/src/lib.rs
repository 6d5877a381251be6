//! Gauntlet core: the session/decision state machine and scoring pipeline
//! behind the conversational social-engineering training platform.
//!
//! This crate holds the domain: sessions and their narrative state machine,
//! the decision-point model, the agent message protocol, the pure risk
//! scoring engine, the adaptive difficulty controller, and user profiles.
//! The LLM call, persistence engines, and front ends live behind traits and
//! are supplied by other crates.

pub mod config;
pub mod difficulty;
pub mod error;
pub mod profile;
pub mod protocol;
pub mod scenario;
pub mod scoring;
pub mod session;
pub mod taxonomy;

// Re-export common error type
pub use error::{GauntletError, Result};
