// Error types for the voice session core

use thiserror::Error;

use crate::session::SessionStatus;

/// Normalized microphone failure, produced by the permission gate
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    #[error("no microphone found")]
    DeviceNotFound,

    #[error("microphone access denied")]
    PermissionDenied,

    #[error("microphone is being used by another application")]
    DeviceBusy,

    #[error("microphone capture is not supported on this platform")]
    Unsupported,

    #[error("failed to access microphone: {0}")]
    Unknown(String),
}

impl PermissionError {
    /// Stable kind name, used in transcript notices and API responses
    pub fn kind(&self) -> &'static str {
        match self {
            PermissionError::DeviceNotFound => "DeviceNotFound",
            PermissionError::PermissionDenied => "PermissionDenied",
            PermissionError::DeviceBusy => "DeviceBusy",
            PermissionError::Unsupported => "Unsupported",
            PermissionError::Unknown(_) => "Unknown",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    // Caught before any async work
    #[error("Configuration error: {0}")]
    Configuration(String),

    // Terminal for the current attempt, recorded in the transcript
    #[error("Microphone unavailable ({kind}): {reason}", kind = .0.kind(), reason = .0)]
    Permission(#[from] PermissionError),

    #[error("Connection error: {0}")]
    Connection(String),

    // Caller misuse, never recorded in the transcript
    #[error("Cannot {operation} while session is {status}")]
    InvalidState {
        operation: &'static str,
        status: SessionStatus,
    },

    #[error("Feedback is not currently accepted")]
    FeedbackNotAccepted,
}

impl SessionError {
    /// Wrap a collaborator failure as a connection error, keeping the context chain
    pub fn connection(err: anyhow::Error) -> Self {
        SessionError::Connection(format!("{:#}", err))
    }
}
