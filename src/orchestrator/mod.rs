//! Orchestrator module for the send / receive / record cycle
//!
//! Composes the input state machine, the stream accumulator and the speech,
//! transport and speaker collaborators into one conversation.

mod coordinator;
mod history;

pub use coordinator::{ChatOrchestrator, Command, TurnOutcome};
pub use history::{ChatMessage, Role};
