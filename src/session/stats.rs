use serde::Serialize;

use super::config::SessionConfig;
use super::status::{ConversationMode, SessionStatus};
use crate::transcript::TranscriptLog;

/// Read-only view of the session for presentation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub status: SessionStatus,

    /// Only set while connected
    pub mode: Option<ConversationMode>,

    /// Assigned by the service on connect
    pub conversation_id: Option<String>,

    /// Shortcut for `mode == Some(Speaking)`
    pub is_agent_speaking: bool,

    /// Whether the service currently accepts feedback
    pub can_send_feedback: bool,

    /// Number of transcript entries so far
    pub transcript_len: usize,
}

/// Mutable session state, guarded by the controller's lock
#[derive(Debug)]
pub(crate) struct SessionState {
    pub status: SessionStatus,
    pub mode: Option<ConversationMode>,
    pub conversation_id: Option<String>,
    pub config: SessionConfig,
    pub transcript: TranscriptLog,

    /// Incremented on every start
    pub attempt: u64,

    /// An `open_session` call has not returned yet. No new call may start
    /// until it has, since a late session can only be closed by its own attempt.
    pub opening: bool,
}

impl SessionState {
    pub fn new(config: SessionConfig, transcript: TranscriptLog) -> Self {
        Self {
            status: SessionStatus::Idle,
            mode: None,
            conversation_id: None,
            config,
            transcript,
            attempt: 0,
            opening: false,
        }
    }

    pub fn view(&self, can_send_feedback: bool) -> SessionView {
        SessionView {
            status: self.status,
            mode: self.mode,
            conversation_id: self.conversation_id.clone(),
            is_agent_speaking: self.mode == Some(ConversationMode::Speaking),
            can_send_feedback,
            transcript_len: self.transcript.len(),
        }
    }
}
