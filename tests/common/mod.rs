//! Minimal collaborators for driving the orchestrator through its public API

use std::sync::{Arc, Mutex};

use concierge_core::{
    ChatRequest, ChatTransport, Speaker, SpeechBridge, SpeechError, SpeechEvent, StreamChunk,
    TransportError,
};
use tokio::sync::mpsc;

/// Speech bridge that is available, already authorised and records nothing
#[derive(Default)]
pub struct QuietSpeech {
    pub events: Option<mpsc::UnboundedSender<SpeechEvent>>,
}

impl SpeechBridge for QuietSpeech {
    fn is_available(&self) -> bool {
        true
    }

    fn has_never_been_asked_for_permission(&self) -> bool {
        false
    }

    fn request_permissions(&mut self) {}

    fn configure_for_streaming(&mut self, events: mpsc::UnboundedSender<SpeechEvent>) {
        self.events = Some(events);
    }

    fn begin_capture(&mut self) -> Result<(), SpeechError> {
        Ok(())
    }

    fn end_capture(&mut self) {}
}

/// Transport replaying a fixed script of chunks for every request
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    pub script: Vec<StreamChunk>,
    pub opened: Arc<Mutex<Vec<ChatRequest>>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<StreamChunk>) -> Self {
        Self {
            script,
            opened: Arc::default(),
        }
    }

    pub fn open_count(&self) -> usize {
        self.opened.lock().map(|opened| opened.len()).unwrap_or(0)
    }
}

impl ChatTransport for ScriptedTransport {
    fn open(&mut self, request: ChatRequest) -> Result<mpsc::Receiver<StreamChunk>, TransportError> {
        if let Ok(mut opened) = self.opened.lock() {
            opened.push(request);
        }

        let (tx, rx) = mpsc::channel(self.script.len().max(1));
        for chunk in &self.script {
            tx.try_send(chunk.clone())
                .map_err(|e| TransportError::Rejected(e.to_string()))?;
        }
        // dropping `tx` closes the stream after the scripted chunks
        Ok(rx)
    }
}

/// Speaker that discards everything
pub struct Silent;

impl Speaker for Silent {
    fn speak(&mut self, _text: &str) {}
}
