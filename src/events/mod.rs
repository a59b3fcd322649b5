//! Events module for UI notifications
//!
//! The orchestrator broadcasts these so views can re-render the input field,
//! append response text as it streams and scroll on every tick.

use serde::{Deserialize, Serialize};

use crate::input::InputState;
use crate::stream::AccumulatedMessage;

/// Events emitted by the orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConciergeEvent {
    /// Input state or text changed
    InputChanged {
        state: InputState,
        text: String,
        can_send: bool,
    },

    /// Mic was pressed but speech recognition is unavailable
    MicUnavailable,

    /// A user message was accepted and the field cleared
    UserMessageSent { text: String },

    /// A response stream was opened
    ResponseStarted,

    /// New response text arrived
    ResponseDelta {
        delta: String,
        /// Monotonic update counter used to drive auto-scroll
        tick: u64,
    },

    /// The response finished
    ResponseCompleted { message: AccumulatedMessage },

    /// The response failed; no partial text is kept
    ResponseFailed { reason: String },
}

impl std::fmt::Display for ConciergeEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConciergeEvent::InputChanged { state, .. } => write!(f, "INPUT_CHANGED ({})", state),
            ConciergeEvent::MicUnavailable => write!(f, "MIC_UNAVAILABLE"),
            ConciergeEvent::UserMessageSent { .. } => write!(f, "USER_MESSAGE_SENT"),
            ConciergeEvent::ResponseStarted => write!(f, "RESPONSE_STARTED"),
            ConciergeEvent::ResponseDelta { tick, .. } => write!(f, "RESPONSE_DELTA (#{})", tick),
            ConciergeEvent::ResponseCompleted { .. } => write!(f, "RESPONSE_COMPLETED"),
            ConciergeEvent::ResponseFailed { reason } => write!(f, "RESPONSE_FAILED ({})", reason),
        }
    }
}
