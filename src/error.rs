//! Error types for the concierge core

/// Errors reported by a [`SpeechBridge`](crate::speech::SpeechBridge)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpeechError {
    #[error("speech recognition permission denied")]
    PermissionDenied,

    #[error("speech recognition is not available on this device")]
    Unavailable,

    #[error("speech recognition failed: {0}")]
    Recognition(String),
}

/// Errors raised when a [`ChatTransport`](crate::transport::ChatTransport) cannot open a stream
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("failed to connect to chat service: {0}")]
    Connect(String),

    #[error("chat service rejected the request: {0}")]
    Rejected(String),
}

/// Reported when a turn ends without a completed response
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    #[error("response stream failed: {0}")]
    Failed(String),

    #[error("response stream was interrupted")]
    Interrupted,
}
