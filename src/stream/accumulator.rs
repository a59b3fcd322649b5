//! Folds streamed chunks into a single growing message.
//!
//! A server may resend the whole message so far or only the newest tokens.
//! A fragment that is longer than, and starts with, the stored text replaces
//! it and only the added suffix is reported; any other fragment is appended.
//! A fragment equal to the whole stored text counts as a resend and adds
//! nothing, even when the text was built from smaller tokens.
//!
//! An empty fragment is a keep-alive: no text, no citations, no tick.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::chunk::{ChunkState, Source, StreamChunk};
use crate::error::StreamError;

/// Response text and citations for one turn
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccumulatedMessage {
    pub text: String,
    pub sources: Vec<Source>,
}

/// Result of feeding one chunk to the accumulator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamUpdate {
    /// Text added by an in-progress chunk
    Progress { delta: String, tick: u64 },
    /// Final chunk; the message is handed off and the accumulator is idle again
    Completed {
        delta: String,
        tick: u64,
        message: AccumulatedMessage,
    },
    /// The turn failed and its partial message was dropped
    Failed(StreamError),
}

impl StreamUpdate {
    /// Text to append to the UI for this chunk
    pub fn delta(&self) -> &str {
        match self {
            StreamUpdate::Progress { delta, .. } | StreamUpdate::Completed { delta, .. } => delta,
            StreamUpdate::Failed(_) => "",
        }
    }
}

#[derive(Debug, Default)]
struct Turn {
    message: AccumulatedMessage,
    last_fragment: Option<String>,
}

impl Turn {
    /// Fold a fragment into the message and return the new text
    fn absorb(&mut self, fragment: String) -> String {
        let text = &mut self.message.text;

        if fragment.is_empty()
            || *text == fragment
            || self.last_fragment.as_deref() == Some(fragment.as_str())
        {
            return String::new();
        }

        let delta = if fragment.len() > text.len() && fragment.starts_with(text.as_str()) {
            let added = fragment[text.len()..].to_string();
            text.clone_from(&fragment);
            added
        } else {
            text.push_str(&fragment);
            fragment.clone()
        };

        self.last_fragment = Some(fragment);
        delta
    }

    /// Union sources by URL; the first citation number seen for a URL wins
    fn merge_sources(&mut self, sources: Vec<Source>) -> bool {
        let mut changed = false;
        for source in sources {
            if self.message.sources.iter().any(|known| known.url == source.url) {
                continue;
            }
            self.message.sources.push(source);
            changed = true;
        }
        changed
    }
}

/// Builds the agent's message for one turn at a time
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    turn: Option<Turn>,
    /// Bumped whenever text or sources change, across turns
    tick: u64,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new turn with an empty message
    pub fn begin(&mut self) {
        if self.turn.is_some() {
            warn!("starting a new turn before the previous one finished");
        }
        self.turn = Some(Turn::default());
    }

    /// Whether a turn is in progress
    pub fn is_active(&self) -> bool {
        self.turn.is_some()
    }

    /// Text accumulated so far in the active turn
    pub fn text(&self) -> Option<&str> {
        self.turn.as_ref().map(|turn| turn.message.text.as_str())
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Feed the next chunk of the active turn.
    ///
    /// # Panics
    ///
    /// Panics if no turn was started with [`begin`](Self::begin).
    pub fn apply(&mut self, chunk: StreamChunk) -> StreamUpdate {
        let Some(turn) = self.turn.as_mut() else {
            panic!("StreamAccumulator::apply called without an active turn");
        };

        if chunk.state == ChunkState::Error {
            let discarded = turn.message.text.len();
            self.turn = None;

            let error = match chunk.message_fragment {
                Some(detail) if !detail.is_empty() => StreamError::Failed(detail),
                _ => StreamError::Interrupted,
            };
            info!(discarded_len = discarded, %error, "turn failed");
            return StreamUpdate::Failed(error);
        }

        let keep_alive = chunk.message_fragment.as_deref() == Some("");
        let delta = chunk
            .message_fragment
            .map(|fragment| turn.absorb(fragment))
            .unwrap_or_default();
        let sources_changed = match chunk.sources {
            Some(sources) if !keep_alive => turn.merge_sources(sources),
            _ => false,
        };

        if !delta.is_empty() || sources_changed {
            self.tick += 1;
        }

        debug!(
            state = ?chunk.state,
            delta_len = delta.len(),
            sources_changed,
            tick = self.tick,
            "chunk applied"
        );

        match chunk.state {
            ChunkState::Completed => {
                let message = self.turn.take().map(|turn| turn.message).unwrap_or_default();
                info!(
                    text_len = message.text.len(),
                    sources = message.sources.len(),
                    "turn completed"
                );
                StreamUpdate::Completed {
                    delta,
                    tick: self.tick,
                    message,
                }
            }
            _ => StreamUpdate::Progress {
                delta,
                tick: self.tick,
            },
        }
    }
}
