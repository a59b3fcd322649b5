//! Streamed response wire types
//!
//! Chunks arrive as JSON objects, one per event, with camelCase fields.

use serde::{Deserialize, Serialize};

/// Progress marker carried by every chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChunkState {
    /// More chunks follow
    InProgress,
    /// Last chunk of a successful response
    Completed,
    /// The response failed; nothing from this turn is kept
    Error,
}

/// Citation metadata attached to a response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub start_index: usize,
    #[serde(default)]
    pub end_index: usize,
    pub citation_number: u32,
}

impl Source {
    pub fn new(url: impl Into<String>, title: impl Into<String>, citation_number: u32) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            start_index: 0,
            end_index: 0,
            citation_number,
        }
    }

    /// Set the span of response text this source backs
    pub fn with_span(mut self, start_index: usize, end_index: usize) -> Self {
        self.start_index = start_index;
        self.end_index = end_index;
        self
    }
}

/// One unit of a streamed response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamChunk {
    pub state: ChunkState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_fragment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<Source>>,
}

impl StreamChunk {
    pub fn in_progress(fragment: impl Into<String>) -> Self {
        Self {
            state: ChunkState::InProgress,
            message_fragment: Some(fragment.into()),
            sources: None,
        }
    }

    pub fn completed(fragment: Option<String>) -> Self {
        Self {
            state: ChunkState::Completed,
            message_fragment: fragment,
            sources: None,
        }
    }

    /// Terminal error chunk. `detail` is surfaced in the reported error.
    pub fn error(detail: Option<String>) -> Self {
        Self {
            state: ChunkState::Error,
            message_fragment: detail,
            sources: None,
        }
    }

    pub fn with_sources(mut self, sources: Vec<Source>) -> Self {
        self.sources = Some(sources);
        self
    }

    /// Parse a single JSON-encoded chunk
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Whether this chunk ends the turn
    pub fn is_terminal(&self) -> bool {
        matches!(self.state, ChunkState::Completed | ChunkState::Error)
    }
}
