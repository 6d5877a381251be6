//! Session domain: conversation turns, decision points, and the narrative
//! state machine.

mod decision;
mod message;
mod model;

pub use decision::DecisionPoint;
pub use message::{ConversationTurn, TurnRole};
pub use model::{NarrativePhase, Session};
