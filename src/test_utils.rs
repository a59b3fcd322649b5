//! Mock collaborators shared by the orchestrator tests.
//!
//! Each mock is a cheap handle over shared state, so a test keeps a clone
//! to inspect calls after moving another clone into the orchestrator.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use crate::error::{SpeechError, TransportError};
use crate::speech::{Speaker, SpeechBridge, SpeechEvent};
use crate::stream::StreamChunk;
use crate::transport::{ChatRequest, ChatTransport};

/// Install a test-friendly tracing subscriber once per process
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Default)]
struct SpeechLog {
    unavailable: bool,
    never_asked: bool,
    permission_requests: usize,
    begin_count: usize,
    end_count: usize,
    begin_failure: Option<SpeechError>,
    events: Option<mpsc::UnboundedSender<SpeechEvent>>,
}

/// Speech bridge that records calls; tests push callbacks with [`MockSpeech::push`]
#[derive(Clone, Default)]
pub struct MockSpeech {
    log: Arc<Mutex<SpeechLog>>,
}

impl MockSpeech {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_available(&self, available: bool) {
        lock(&self.log).unavailable = !available;
    }

    pub fn set_never_asked(&self, never_asked: bool) {
        lock(&self.log).never_asked = never_asked;
    }

    /// Make the next `begin_capture` fail
    pub fn fail_begin(&self, error: SpeechError) {
        lock(&self.log).begin_failure = Some(error);
    }

    pub fn permission_requests(&self) -> usize {
        lock(&self.log).permission_requests
    }

    pub fn begin_count(&self) -> usize {
        lock(&self.log).begin_count
    }

    pub fn end_count(&self) -> usize {
        lock(&self.log).end_count
    }

    /// Deliver a callback as the platform engine would
    pub fn push(&self, event: SpeechEvent) -> Result<(), mpsc::error::SendError<SpeechEvent>> {
        match lock(&self.log).events.as_ref() {
            Some(tx) => tx.send(event),
            None => Err(mpsc::error::SendError(event)),
        }
    }
}

impl SpeechBridge for MockSpeech {
    fn is_available(&self) -> bool {
        !lock(&self.log).unavailable
    }

    fn has_never_been_asked_for_permission(&self) -> bool {
        lock(&self.log).never_asked
    }

    fn request_permissions(&mut self) {
        let mut log = lock(&self.log);
        log.permission_requests += 1;
        log.never_asked = false;
    }

    fn configure_for_streaming(&mut self, events: mpsc::UnboundedSender<SpeechEvent>) {
        lock(&self.log).events = Some(events);
    }

    fn begin_capture(&mut self) -> Result<(), SpeechError> {
        let mut log = lock(&self.log);
        match log.begin_failure.take() {
            Some(error) => Err(error),
            None => {
                log.begin_count += 1;
                Ok(())
            }
        }
    }

    fn end_capture(&mut self) {
        lock(&self.log).end_count += 1;
    }
}

#[derive(Default)]
struct TransportLog {
    requests: Vec<ChatRequest>,
    fail_next: bool,
    prepared: Option<mpsc::Receiver<StreamChunk>>,
    /// Senders for unprepared streams, held so those turns stay open
    held: Vec<mpsc::Sender<StreamChunk>>,
}

/// Transport that records requests and hands out test-controlled streams
#[derive(Clone, Default)]
pub struct MockTransport {
    log: Arc<Mutex<TransportLog>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Channel feeding the stream returned by the next `open`
    pub fn prepare_stream(&self) -> mpsc::Sender<StreamChunk> {
        let (tx, rx) = mpsc::channel(16);
        lock(&self.log).prepared = Some(rx);
        tx
    }

    pub fn fail_next_open(&self) {
        lock(&self.log).fail_next = true;
    }

    pub fn open_count(&self) -> usize {
        lock(&self.log).requests.len()
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        lock(&self.log).requests.clone()
    }
}

impl ChatTransport for MockTransport {
    fn open(&mut self, request: ChatRequest) -> Result<mpsc::Receiver<StreamChunk>, TransportError> {
        let mut log = lock(&self.log);
        log.requests.push(request);

        if std::mem::take(&mut log.fail_next) {
            return Err(TransportError::Connect("connection refused".to_string()));
        }

        Ok(match log.prepared.take() {
            Some(rx) => rx,
            None => {
                let (tx, rx) = mpsc::channel(16);
                log.held.push(tx);
                rx
            }
        })
    }
}

/// Speaker that records what it was asked to say
#[derive(Clone, Default)]
pub struct MockSpeaker {
    spoken: Arc<Mutex<Vec<String>>>,
}

impl MockSpeaker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spoken(&self) -> Vec<String> {
        lock(&self.spoken).clone()
    }
}

impl Speaker for MockSpeaker {
    fn speak(&mut self, text: &str) {
        lock(&self.spoken).push(text.to_string());
    }
}
