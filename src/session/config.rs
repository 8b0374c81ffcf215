use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SessionError;

/// Media transport requested from the voice service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    #[default]
    WebRtc,
    WebSocket,
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportMode::WebRtc => write!(f, "webrtc"),
            TransportMode::WebSocket => write!(f, "websocket"),
        }
    }
}

impl std::str::FromStr for TransportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "webrtc" => Ok(TransportMode::WebRtc),
            "websocket" => Ok(TransportMode::WebSocket),
            other => Err(format!("unknown transport mode: {}", other)),
        }
    }
}

/// Configuration for a voice session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Voice agent identifier issued by the service (e.g., "agent_2101kd5b...")
    #[serde(default)]
    pub agent_id: String,

    /// Transport for the media stream
    /// Default: webrtc
    #[serde(default)]
    pub transport: TransportMode,
}

impl SessionConfig {
    pub fn new(agent_id: impl Into<String>, transport: TransportMode) -> Self {
        Self {
            agent_id: agent_id.into(),
            transport,
        }
    }

    /// Reject configurations that cannot start a call
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.agent_id.trim().is_empty() {
            return Err(SessionError::Configuration(
                "agent id is required".to_string(),
            ));
        }

        if self.agent_id.chars().any(char::is_whitespace) {
            return Err(SessionError::Configuration(format!(
                "agent id must not contain whitespace: {:?}",
                self.agent_id
            )));
        }

        Ok(())
    }
}
