use serde::{Deserialize, Serialize};

use crate::session::{ServiceEvent, TransportMode};

/// Session open request sent to the voice service
#[derive(Debug, Serialize, Deserialize)]
pub struct OpenSessionMessage {
    /// Client-chosen key; events for this session arrive on `<prefix>.events.<key>`
    pub session_key: String,
    pub agent_id: String,
    pub transport: TransportMode,
}

/// Reply to an open request
#[derive(Debug, Serialize, Deserialize)]
pub struct OpenSessionReply {
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Session close request
#[derive(Debug, Serialize, Deserialize)]
pub struct CloseSessionMessage {
    pub session_key: String,
    pub conversation_id: Option<String>,
}

/// Satisfaction signal for a conversation
#[derive(Debug, Serialize, Deserialize)]
pub struct FeedbackMessage {
    pub conversation_id: Option<String>,
    pub positive: bool,
}

/// Generic acknowledgement for close and feedback requests
#[derive(Debug, Serialize, Deserialize)]
pub struct AckReply {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Event published by the voice service for one session
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionEventMessage {
    pub session_key: String,
    pub timestamp: String, // RFC3339 timestamp
    pub event: ServiceEvent,
}
