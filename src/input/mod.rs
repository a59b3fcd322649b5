//! Input field state management
//!
//! Provides an explicit state machine with five states:
//! - Empty: nothing typed
//! - Editing: free-text typing
//! - Recording: dictation running, partial transcripts spliced into the text
//! - Transcribing: capture finished, waiting for the final transcript
//! - Error: voice input refused (permission denied)

mod machine;
mod text;

pub use machine::{InputData, InputErrorReason, InputEvent, InputState, InputStateMachine};
pub use text::{char_len, clamp_offset, splice};
