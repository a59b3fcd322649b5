//! Input field state machine
//!
//! Handles transitions between Empty, Editing, Recording, Transcribing and
//! Error based on typing, dictation and send events. Events that are not
//! valid for the current state are dropped without touching state or data.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::text::{clamp_offset, has_content, splice};

/// Why the input field is in its error state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputErrorReason {
    /// Microphone or speech recognition permission was refused
    PermissionDenied,
}

/// The five possible states of the input field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputState {
    /// Nothing typed
    #[default]
    Empty,
    /// User is typing
    Editing,
    /// Voice capture in progress, partial results are spliced into the text
    Recording,
    /// Capture ended, waiting for the final transcript
    Transcribing,
    /// Voice input could not start
    Error(InputErrorReason),
}

impl std::fmt::Display for InputState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputState::Empty => write!(f, "Empty"),
            InputState::Editing => write!(f, "Editing"),
            InputState::Recording => write!(f, "Recording"),
            InputState::Transcribing => write!(f, "Transcribing"),
            InputState::Error(reason) => write!(f, "Error({:?})", reason),
        }
    }
}

/// Text buffer and recording snapshot, always paired with an [`InputState`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputData {
    /// Current contents of the input field
    pub text: String,
    /// Whether `text` has non-whitespace content
    pub can_send: bool,
    /// Buffer contents when recording started (Recording/Transcribing only)
    pub text_at_recording_start: String,
    /// Character offset where dictated text is inserted (Recording/Transcribing only)
    pub recording_insert_start: usize,
}

impl InputData {
    fn with_text(mut self, text: String) -> Self {
        self.can_send = has_content(&text);
        self.text = text;
        self
    }
}

/// Events accepted by [`InputStateMachine::apply`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// Field went from empty to having content
    AddContent,
    /// Field contents replaced
    InputReceived(String),
    /// Field was cleared
    DeleteContent,
    /// Microphone pressed with the cursor at `location` (characters)
    StartMic { location: usize },
    /// Latest partial transcript, replacing the previous one
    StreamingPartial(String),
    /// Capture stopped, final transcript pending
    RecordingComplete,
    /// Capture abandoned before it completed
    CancelRecording,
    /// Final transcript arrived
    TranscriptionComplete(String),
    /// Final transcript could not be produced
    TranscriptionError,
    /// Capture was refused by the platform
    PermissionError,
    /// Current text submitted
    SendMessage,
    /// Back to defaults
    Reset,
}

impl InputEvent {
    /// Short name for logs, without any user text
    pub fn name(&self) -> &'static str {
        match self {
            InputEvent::AddContent => "add_content",
            InputEvent::InputReceived(_) => "input_received",
            InputEvent::DeleteContent => "delete_content",
            InputEvent::StartMic { .. } => "start_mic",
            InputEvent::StreamingPartial(_) => "streaming_partial",
            InputEvent::RecordingComplete => "recording_complete",
            InputEvent::CancelRecording => "cancel_recording",
            InputEvent::TranscriptionComplete(_) => "transcription_complete",
            InputEvent::TranscriptionError => "transcription_error",
            InputEvent::PermissionError => "permission_error",
            InputEvent::SendMessage => "send_message",
            InputEvent::Reset => "reset",
        }
    }
}

type Transition = (InputState, InputData);

/// Single owner of the input field's state and text buffer
#[derive(Debug, Default)]
pub struct InputStateMachine {
    /// Current state
    state: InputState,
    /// Data paired with the current state
    data: InputData,
    /// State to restore when a recording is rolled back
    resume_state: Option<InputState>,
}

impl InputStateMachine {
    /// Create a state machine with an empty field
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current state
    pub fn state(&self) -> InputState {
        self.state
    }

    /// Get the data paired with the current state
    pub fn data(&self) -> &InputData {
        &self.data
    }

    /// Whether the send action is currently allowed
    pub fn can_send(&self) -> bool {
        self.data.can_send
    }

    /// Whether voice capture is running or awaiting its transcript
    pub fn is_capturing(&self) -> bool {
        matches!(self.state, InputState::Recording | InputState::Transcribing)
    }

    /// Apply an event. Returns false when the event was ignored.
    pub fn apply(&mut self, event: InputEvent) -> bool {
        let Some((new_state, new_data)) = self.compute_next(&event) else {
            debug!(state = %self.state, event = event.name(), "event ignored");
            return false;
        };

        debug_assert_eq!(new_data.can_send, has_content(&new_data.text));

        if let InputEvent::StartMic { .. } = event {
            self.resume_state = match self.state {
                InputState::Empty | InputState::Editing => Some(self.state),
                _ => None,
            };
        }

        debug!(
            from = %self.state,
            to = %new_state,
            event = event.name(),
            text_len = new_data.text.len(),
            "input transition"
        );

        self.state = new_state;
        self.data = new_data;
        true
    }

    /// Translate a raw text replacement from the UI into events.
    ///
    /// Returns every event emitted, whether or not it was accepted.
    pub fn apply_text_change(&mut self, new_text: &str) -> Vec<InputEvent> {
        let was_empty = self.data.text.is_empty();

        let events = if new_text.is_empty() {
            if was_empty {
                Vec::new()
            } else {
                vec![InputEvent::DeleteContent]
            }
        } else if was_empty {
            vec![
                InputEvent::AddContent,
                InputEvent::InputReceived(new_text.to_string()),
            ]
        } else {
            vec![InputEvent::InputReceived(new_text.to_string())]
        };

        for event in &events {
            self.apply(event.clone());
        }

        events
    }

    /// Compute the next state and data, or `None` when the event is rejected
    fn compute_next(&self, event: &InputEvent) -> Option<Transition> {
        // Events accepted regardless of state
        match event {
            InputEvent::InputReceived(text) => return Some(self.receive_input(text)),
            InputEvent::SendMessage => {
                return self
                    .data
                    .can_send
                    .then(|| (InputState::Empty, InputData::default()));
            }
            InputEvent::Reset => return Some((InputState::Empty, InputData::default())),
            _ => {}
        }

        match self.state {
            InputState::Empty => self.compute_from_empty(event),
            InputState::Editing => self.compute_from_editing(event),
            InputState::Recording => self.compute_from_recording(event),
            InputState::Transcribing => self.compute_from_transcribing(event),
            InputState::Error(_) => self.compute_from_error(event),
        }
    }

    /// Compute next state when the field is empty
    fn compute_from_empty(&self, event: &InputEvent) -> Option<Transition> {
        match event {
            InputEvent::AddContent => Some((InputState::Editing, self.data.clone())),
            InputEvent::StartMic { location } => Some(self.start_recording(*location)),
            _ => None,
        }
    }

    /// Compute next state while typing
    fn compute_from_editing(&self, event: &InputEvent) -> Option<Transition> {
        match event {
            InputEvent::DeleteContent => Some((InputState::Empty, self.cleared())),
            InputEvent::StartMic { location } => Some(self.start_recording(*location)),
            _ => None,
        }
    }

    /// Compute next state while capturing audio
    fn compute_from_recording(&self, event: &InputEvent) -> Option<Transition> {
        match event {
            InputEvent::StreamingPartial(partial) => {
                Some((InputState::Recording, self.merged(partial)))
            }
            InputEvent::RecordingComplete => Some((InputState::Transcribing, self.data.clone())),
            InputEvent::CancelRecording => Some(self.rolled_back()),
            InputEvent::PermissionError => Some((
                InputState::Error(InputErrorReason::PermissionDenied),
                self.data.clone(),
            )),
            _ => None,
        }
    }

    /// Compute next state while waiting for the final transcript
    fn compute_from_transcribing(&self, event: &InputEvent) -> Option<Transition> {
        match event {
            InputEvent::TranscriptionComplete(transcript) => {
                Some((InputState::Editing, self.merged(transcript)))
            }
            InputEvent::TranscriptionError => Some(self.rolled_back()),
            _ => None,
        }
    }

    /// Compute next state after a permission failure
    fn compute_from_error(&self, event: &InputEvent) -> Option<Transition> {
        match event {
            InputEvent::StartMic { location } => Some(self.start_recording(*location)),
            _ => None,
        }
    }

    /// New text typed; leaves Empty and Error for Editing
    fn receive_input(&self, text: &str) -> Transition {
        let state = match self.state {
            InputState::Empty | InputState::Error(_) => InputState::Editing,
            other => other,
        };
        (state, self.data.clone().with_text(text.to_string()))
    }

    /// Snapshot the buffer so dictation can be merged or rolled back
    fn start_recording(&self, location: usize) -> Transition {
        let mut data = self.data.clone();
        data.text_at_recording_start = data.text.clone();
        data.recording_insert_start = clamp_offset(&data.text, location);
        (InputState::Recording, data)
    }

    /// Snapshot text with `dictated` inserted at the snapshot offset
    fn merged(&self, dictated: &str) -> InputData {
        let text = splice(
            &self.data.text_at_recording_start,
            self.data.recording_insert_start,
            dictated,
        );
        self.data.clone().with_text(text)
    }

    /// Restore the buffer as it was before recording started
    fn rolled_back(&self) -> Transition {
        let text = self.data.text_at_recording_start.clone();
        let state = self.resume_state.unwrap_or(if text.is_empty() {
            InputState::Empty
        } else {
            InputState::Editing
        });
        (state, self.data.clone().with_text(text))
    }

    fn cleared(&self) -> InputData {
        self.data.clone().with_text(String::new())
    }
}
