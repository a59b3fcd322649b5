//! concierge-core: input and streaming core for the Brand Concierge assistant
//!
//! Provides:
//! - An explicit state machine for the chat input field (typing, dictation,
//!   transcription, permission errors)
//! - A stream accumulator folding response chunks into one message with
//!   deduplicated citations
//! - An orchestrator running the send / receive / record cycle against
//!   pluggable speech, transport and speaker collaborators
//!
//! Rendering, theming, networking and the platform speech engines live
//! outside this crate.

pub mod config;
pub mod error;
pub mod events;
pub mod input;
pub mod orchestrator;
pub mod speech;
pub mod stream;
pub mod transport;

#[cfg(test)]
mod test_utils;

pub use config::ConciergeConfig;
pub use error::{SpeechError, StreamError, TransportError};
pub use events::ConciergeEvent;
pub use input::{InputData, InputErrorReason, InputEvent, InputState, InputStateMachine};
pub use orchestrator::{ChatMessage, ChatOrchestrator, Command, Role, TurnOutcome};
pub use speech::{Speaker, SpeechBridge, SpeechEvent};
pub use stream::{
    AccumulatedMessage, ChunkState, Source, StreamAccumulator, StreamChunk, StreamUpdate,
};
pub use transport::{ChatRequest, ChatTransport};
