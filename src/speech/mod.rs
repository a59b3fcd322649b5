//! Speech capture and playback collaborators
//!
//! Platform speech engines live outside this crate. A bridge reports
//! everything asynchronous (partials, final transcript, permission prompts)
//! as [`SpeechEvent`]s over the channel it was configured with, so results
//! are applied on the orchestrator's task in arrival order.

use tokio::sync::mpsc;

use crate::error::SpeechError;

/// Callbacks from a speech bridge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    /// Best transcript so far for the running capture
    Partial(String),
    /// Final transcript after `end_capture`
    Transcribed(String),
    /// `end_capture` produced no transcript
    Failed(SpeechError),
    /// Answer to `request_permissions`
    PermissionResolved { granted: bool },
}

/// Speech-to-text capture
pub trait SpeechBridge: Send {
    /// Whether speech recognition can be used at all
    fn is_available(&self) -> bool;

    /// Whether the user has never been prompted for microphone access
    fn has_never_been_asked_for_permission(&self) -> bool;

    /// Prompt for permissions; answers with [`SpeechEvent::PermissionResolved`]
    fn request_permissions(&mut self);

    /// Register the channel for partial results and capture outcomes
    fn configure_for_streaming(&mut self, events: mpsc::UnboundedSender<SpeechEvent>);

    /// Start capturing audio
    fn begin_capture(&mut self) -> Result<(), SpeechError>;

    /// Stop capturing; answers with [`SpeechEvent::Transcribed`] or [`SpeechEvent::Failed`]
    fn end_capture(&mut self);
}

/// Text-to-speech output
pub trait Speaker: Send {
    /// Speak `text`; fire-and-forget
    fn speak(&mut self, text: &str);
}
