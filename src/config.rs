//! Configuration loading and management

use anyhow::{Context, Result};

/// Default Edge Network host
pub const DEFAULT_SERVER_URL: &str = "edge.adobedc.net";

/// Default capacity of the UI event channel
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Concierge configuration, resolved before the orchestrator is built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConciergeConfig {
    /// Host of the chat service
    pub server_url: String,

    /// Datastream the conversation is routed through
    pub datastream_id: String,

    /// Surfaces sent with every request
    pub surfaces: Vec<String>,

    /// Speak completed responses to dictated messages
    pub speak_responses: bool,

    /// Capacity of the UI event channel
    pub event_capacity: usize,
}

impl ConciergeConfig {
    pub fn new(server_url: impl Into<String>, datastream_id: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            datastream_id: datastream_id.into(),
            surfaces: Vec::new(),
            speak_responses: false,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }

    pub fn with_surfaces(mut self, surfaces: Vec<String>) -> Self {
        self.surfaces = surfaces;
        self
    }

    pub fn with_speak_responses(mut self, speak: bool) -> Self {
        self.speak_responses = speak;
        self
    }

    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let datastream_id = lookup("CONCIERGE_DATASTREAM_ID")
            .filter(|id| !id.trim().is_empty())
            .context("CONCIERGE_DATASTREAM_ID is not set")?;

        let server_url = lookup("CONCIERGE_SERVER_URL")
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());

        let surfaces = lookup("CONCIERGE_SURFACES")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|surface| !surface.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let speak_responses = lookup("CONCIERGE_SPEAK_RESPONSES")
            .map(|raw| parse_flag(&raw))
            .unwrap_or(false);

        let event_capacity = match lookup("CONCIERGE_EVENT_CAPACITY") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|capacity| *capacity > 0)
                .with_context(|| format!("invalid CONCIERGE_EVENT_CAPACITY: {raw}"))?,
            None => DEFAULT_EVENT_CAPACITY,
        };

        Ok(Self {
            server_url,
            datastream_id,
            surfaces,
            speak_responses,
            event_capacity,
        })
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
