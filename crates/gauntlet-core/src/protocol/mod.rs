//! Agent-to-agent message protocol: the structured envelope and the
//! in-process bus implementing it.

mod bus;
mod envelope;

pub use bus::AgentBus;
pub use envelope::{ActorId, AgentMessage, CorrelationId, MessagePayload};
