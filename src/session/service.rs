use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::config::TransportMode;
use super::status::ConversationMode;
use crate::transcript::Role;

/// Event pushed by the voice service while a session is open
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServiceEvent {
    /// Media and conversation are established
    Connect { conversation_id: String },

    /// The remote side tore the session down
    Disconnect,

    /// A transcribed utterance from either party
    Message { role: Role, content: String },

    /// The remote session failed
    Error { detail: String },

    /// Free-form status label from the service
    StatusChange { status: String },

    /// Whose turn it is
    ModeChange { mode: ConversationMode },

    /// The service opened or closed the feedback window
    FeedbackEligibility { can_send: bool },
}

/// Where the voice service delivers events for one session attempt
pub type EventSink = mpsc::UnboundedSender<ServiceEvent>;

/// Parameters for opening a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenSessionRequest {
    pub agent_id: String,
    pub transport: TransportMode,
}

/// Remote conversational voice service
///
/// Implementations:
/// - `NatsVoiceService`: request/reply over NATS
/// - test doubles with scripted outcomes
#[async_trait::async_trait]
pub trait VoiceService: Send + Sync {
    /// Open a session and return the conversation id assigned by the service
    ///
    /// Events for this session must be sent to `events`; the sink is dropped by
    /// the controller when the attempt is replaced.
    async fn open_session(&self, request: OpenSessionRequest, events: EventSink)
        -> Result<String>;

    /// Close the current session
    async fn close_session(&self) -> Result<()>;

    /// Forward a satisfaction signal for the current or most recent session
    async fn send_feedback(&self, positive: bool) -> Result<()>;

    /// Whether the service currently accepts feedback
    fn can_send_feedback(&self) -> bool;

    /// Service name for logging
    fn name(&self) -> &str;
}
