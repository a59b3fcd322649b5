//! Chat transport collaborator
//!
//! Network session handling lives outside this crate. A transport opens one
//! response stream per request and pushes chunks into the returned channel;
//! dropping the sender before a terminal chunk counts as a lost connection.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::config::ConciergeConfig;
use crate::error::TransportError;
use crate::stream::StreamChunk;

/// Outgoing user message plus the resolved service settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub text: String,
    pub server_url: String,
    pub datastream_id: String,
    pub surfaces: Vec<String>,
}

impl ChatRequest {
    pub fn new(text: impl Into<String>, config: &ConciergeConfig) -> Self {
        Self {
            text: text.into(),
            server_url: config.server_url.clone(),
            datastream_id: config.datastream_id.clone(),
            surfaces: config.surfaces.clone(),
        }
    }
}

/// Opens response streams
pub trait ChatTransport: Send {
    fn open(&mut self, request: ChatRequest) -> Result<mpsc::Receiver<StreamChunk>, TransportError>;
}
