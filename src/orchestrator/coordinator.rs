//! End-to-end send / receive / record cycle
//!
//! Owns the input state machine and the stream accumulator, talks to the
//! speech, transport and speaker collaborators, and broadcasts
//! [`ConciergeEvent`]s for the UI. All mutation happens on the task that
//! owns the orchestrator: speech callbacks and response chunks arrive over
//! channels and are applied one at a time.

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::config::ConciergeConfig;
use crate::error::{SpeechError, StreamError};
use crate::events::ConciergeEvent;
use crate::input::{InputEvent, InputState, InputStateMachine};
use crate::speech::{Speaker, SpeechBridge, SpeechEvent};
use crate::stream::{AccumulatedMessage, StreamAccumulator, StreamChunk, StreamUpdate};
use crate::transport::{ChatRequest, ChatTransport};

use super::history::ChatMessage;

/// Actions from the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// The input field now holds this text
    TextChanged(String),
    /// Mic pressed with the cursor at `location` (characters)
    StartMic { location: usize },
    /// Mic released; transcribe what was captured
    StopMic,
    /// Abandon the running capture
    CancelMic,
    /// Submit the current text
    Send,
    /// Clear the input field
    Reset,
}

/// How a turn ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Completed(AccumulatedMessage),
    Failed(StreamError),
}

/// Response stream for the turn in flight
struct ActiveTurn {
    chunks: mpsc::Receiver<StreamChunk>,
    /// The outgoing text was dictated
    speakable: bool,
}

/// Coordinates input, dictation and streamed responses
pub struct ChatOrchestrator<B, T, K> {
    config: ConciergeConfig,
    input: InputStateMachine,
    accumulator: StreamAccumulator,
    speech: B,
    transport: T,
    speaker: K,
    speech_rx: mpsc::UnboundedReceiver<SpeechEvent>,
    /// Cursor location waiting on a permission prompt
    pending_mic: Option<usize>,
    /// Current text came from a completed transcription
    dictated: bool,
    /// Capture answers still owed by abandoned captures
    stale_answers: usize,
    active: Option<ActiveTurn>,
    history: Vec<ChatMessage>,
    event_tx: broadcast::Sender<ConciergeEvent>,
}

impl<B, T, K> ChatOrchestrator<B, T, K>
where
    B: SpeechBridge,
    T: ChatTransport,
    K: Speaker,
{
    /// Create an orchestrator and wire the speech bridge's callbacks to it
    pub fn new(config: ConciergeConfig, mut speech: B, transport: T, speaker: K) -> Self {
        let (speech_tx, speech_rx) = mpsc::unbounded_channel();
        speech.configure_for_streaming(speech_tx);

        let (event_tx, _) = broadcast::channel(config.event_capacity.max(1));

        Self {
            config,
            input: InputStateMachine::new(),
            accumulator: StreamAccumulator::new(),
            speech,
            transport,
            speaker,
            speech_rx,
            pending_mic: None,
            dictated: false,
            stale_answers: 0,
            active: None,
            history: Vec::new(),
            event_tx,
        }
    }

    /// Subscribe to UI events
    pub fn subscribe(&self) -> broadcast::Receiver<ConciergeEvent> {
        self.event_tx.subscribe()
    }

    pub fn input(&self) -> &InputStateMachine {
        &self.input
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Whether a response is streaming
    pub fn is_streaming(&self) -> bool {
        self.active.is_some()
    }

    /// Process commands, speech callbacks and response chunks until the
    /// command channel closes
    pub async fn run(&mut self, mut commands: mpsc::Receiver<Command>) {
        info!("orchestrator started");

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(event) = self.speech_rx.recv() => {
                    self.handle_speech_event(event);
                }
                chunk = next_chunk(&mut self.active) => match chunk {
                    Some(chunk) => {
                        self.handle_chunk(chunk);
                    }
                    None => {
                        self.handle_stream_closed();
                    }
                },
            }
        }

        info!("orchestrator stopped");
    }

    /// Dispatch a UI command
    pub fn handle_command(&mut self, command: Command) {
        match command {
            Command::TextChanged(text) => self.text_changed(&text),
            Command::StartMic { location } => self.start_mic(location),
            Command::StopMic => self.stop_mic(),
            Command::CancelMic => self.cancel_mic(),
            Command::Send => {
                self.send_message();
            }
            Command::Reset => {
                self.dictated = false;
                self.pending_mic = None;
                let before = self.input.state();
                if self.apply_input(InputEvent::Reset) {
                    self.abandon_capture(before);
                }
            }
        }
    }

    /// Apply a raw text replacement from the input field
    pub fn text_changed(&mut self, text: &str) {
        let before_state = self.input.state();
        let before_text = self.input.data().text.clone();

        self.input.apply_text_change(text);

        if self.input.state() != before_state || self.input.data().text != before_text {
            self.dictated = false;
            self.emit_input();
        }
    }

    /// Begin dictation at `location`, prompting for permission first if needed
    pub fn start_mic(&mut self, location: usize) {
        if self.input.is_capturing() || self.pending_mic.is_some() {
            debug!(state = %self.input.state(), "mic already active");
            return;
        }

        if !self.speech.is_available() {
            warn!("speech recognition unavailable");
            self.emit(ConciergeEvent::MicUnavailable);
            return;
        }

        if self.speech.has_never_been_asked_for_permission() {
            info!("requesting speech permissions");
            self.pending_mic = Some(location);
            self.speech.request_permissions();
            return;
        }

        self.begin_recording(location);
    }

    /// Stop dictation and wait for the final transcript
    pub fn stop_mic(&mut self) {
        if self.apply_input(InputEvent::RecordingComplete) {
            self.speech.end_capture();
        }
    }

    /// Abandon dictation and restore the text from before it started
    pub fn cancel_mic(&mut self) {
        if self.apply_input(InputEvent::CancelRecording) {
            self.abandon_capture(InputState::Recording);
        }
    }

    /// Apply a callback from the speech bridge
    pub fn handle_speech_event(&mut self, event: SpeechEvent) {
        if matches!(event, SpeechEvent::Transcribed(_) | SpeechEvent::Failed(_))
            && self.stale_answers > 0
        {
            self.stale_answers -= 1;
            debug!(remaining = self.stale_answers, "dropping answer from abandoned capture");
            return;
        }

        match event {
            SpeechEvent::Partial(partial) => {
                self.apply_input(InputEvent::StreamingPartial(partial));
            }
            SpeechEvent::Transcribed(transcript) => {
                if self.apply_input(InputEvent::TranscriptionComplete(transcript)) {
                    self.dictated = true;
                }
            }
            SpeechEvent::Failed(error) => {
                warn!(%error, state = %self.input.state(), "speech capture failed");
                let event = match (self.input.state(), &error) {
                    (InputState::Recording, SpeechError::PermissionDenied) => {
                        InputEvent::PermissionError
                    }
                    (InputState::Recording, _) => InputEvent::CancelRecording,
                    _ => InputEvent::TranscriptionError,
                };
                // a failure while transcribing is the capture's answer; while
                // recording the capture is still open and owes one
                let before = self.input.state();
                if self.apply_input(event) && before == InputState::Recording {
                    self.abandon_capture(before);
                }
            }
            SpeechEvent::PermissionResolved { granted } => {
                let Some(location) = self.pending_mic.take() else {
                    debug!(granted, "permission answer without a pending mic request");
                    return;
                };

                if granted {
                    self.begin_recording(location);
                } else {
                    info!("speech permission denied");
                    self.deny_recording(location);
                }
            }
        }
    }

    /// Submit the current text and open a response stream.
    ///
    /// Returns false when nothing was sent.
    pub fn send_message(&mut self) -> bool {
        if !self.input.can_send() {
            debug!("send ignored, nothing to send");
            return false;
        }
        if self.active.is_some() {
            debug!("send ignored, response still streaming");
            return false;
        }

        let text = self.input.data().text.clone();
        let before = self.input.state();
        let speakable = self.dictated;

        self.apply_input(InputEvent::SendMessage);
        self.dictated = false;
        self.pending_mic = None;
        self.abandon_capture(before);

        info!(text_len = text.len(), speakable, "sending message");
        self.history.push(ChatMessage::user(text.clone()));
        self.emit(ConciergeEvent::UserMessageSent { text: text.clone() });

        self.accumulator.begin();
        self.emit(ConciergeEvent::ResponseStarted);

        match self.transport.open(ChatRequest::new(text, &self.config)) {
            Ok(chunks) => {
                self.active = Some(ActiveTurn { chunks, speakable });
            }
            Err(error) => {
                warn!(%error, "failed to open response stream");
                let update = self.accumulator.apply(StreamChunk::error(Some(error.to_string())));
                self.settle(update, speakable);
            }
        }

        true
    }

    /// Feed a chunk of the response in flight.
    ///
    /// Returns the outcome when the chunk ended the turn.
    pub fn handle_chunk(&mut self, chunk: StreamChunk) -> Option<TurnOutcome> {
        let Some(speakable) = self.active.as_ref().map(|turn| turn.speakable) else {
            warn!(state = ?chunk.state, "chunk received with no turn in flight");
            return None;
        };

        let update = self.accumulator.apply(chunk);
        if !matches!(update, StreamUpdate::Progress { .. }) {
            self.active = None;
        }
        self.settle(update, speakable)
    }

    /// The chunk channel closed; ends the turn with a single error
    pub fn handle_stream_closed(&mut self) -> Option<TurnOutcome> {
        if self.active.is_none() {
            return None;
        }
        warn!("response stream closed before completing");
        self.handle_chunk(StreamChunk::error(None))
    }

    fn begin_recording(&mut self, location: usize) {
        if !self.apply_input(InputEvent::StartMic { location }) {
            return;
        }

        match self.speech.begin_capture() {
            Ok(()) => info!(location, "recording started"),
            Err(SpeechError::PermissionDenied) => {
                info!("speech permission denied");
                self.apply_input(InputEvent::PermissionError);
            }
            Err(error) => {
                warn!(%error, "failed to start recording");
                self.apply_input(InputEvent::CancelRecording);
            }
        }
    }

    /// Close a capture the field has left without its transcript.
    ///
    /// Both states owe one `end_capture` answer that must not reach a later capture.
    fn abandon_capture(&mut self, left: InputState) {
        match left {
            InputState::Recording => {
                self.speech.end_capture();
                self.stale_answers += 1;
            }
            InputState::Transcribing => self.stale_answers += 1,
            _ => {}
        }
    }

    /// Enter the permission error state through a recording attempt
    fn deny_recording(&mut self, location: usize) {
        if self.input.apply(InputEvent::StartMic { location }) {
            self.apply_input(InputEvent::PermissionError);
        }
    }

    /// Surface an accumulator update; returns the outcome once the turn ends
    fn settle(&mut self, update: StreamUpdate, speakable: bool) -> Option<TurnOutcome> {
        match update {
            StreamUpdate::Progress { delta, tick } => {
                if !delta.is_empty() {
                    self.emit(ConciergeEvent::ResponseDelta { delta, tick });
                }
                None
            }
            StreamUpdate::Completed { delta, tick, message } => {
                if !delta.is_empty() {
                    self.emit(ConciergeEvent::ResponseDelta { delta, tick });
                }

                self.history.push(ChatMessage::agent(message.clone()));
                self.emit(ConciergeEvent::ResponseCompleted {
                    message: message.clone(),
                });

                if speakable && self.config.speak_responses && !message.text.trim().is_empty() {
                    debug!(text_len = message.text.len(), "speaking response");
                    self.speaker.speak(&message.text);
                }

                Some(TurnOutcome::Completed(message))
            }
            StreamUpdate::Failed(error) => {
                self.emit(ConciergeEvent::ResponseFailed {
                    reason: error.to_string(),
                });
                Some(TurnOutcome::Failed(error))
            }
        }
    }

    /// Apply an input event and notify the UI when it was accepted
    fn apply_input(&mut self, event: InputEvent) -> bool {
        let accepted = self.input.apply(event);
        if accepted {
            self.emit_input();
        }
        accepted
    }

    fn emit_input(&self) {
        let data = self.input.data();
        self.emit(ConciergeEvent::InputChanged {
            state: self.input.state(),
            text: data.text.clone(),
            can_send: data.can_send,
        });
    }

    fn emit(&self, event: ConciergeEvent) {
        debug!(%event, "emitting event");
        let _ = self.event_tx.send(event);
    }
}

/// Next chunk of the turn in flight; pending forever when idle
async fn next_chunk(active: &mut Option<ActiveTurn>) -> Option<StreamChunk> {
    match active {
        Some(turn) => turn.chunks.recv().await,
        None => std::future::pending().await,
    }
}
