use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of the voice session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    AcquiringPermission,
    Connecting,
    Connected,
    Disconnecting,
    Disconnected,
    Failed,
}

impl SessionStatus {
    /// Whether the lifecycle allows moving from `self` to `next`
    pub fn can_transition_to(self, next: SessionStatus) -> bool {
        use SessionStatus::*;

        matches!(
            (self, next),
            (Idle, AcquiringPermission)
                | (AcquiringPermission, Connecting)
                | (AcquiringPermission, Failed)
                | (Connecting, Connected)
                | (Connecting, Failed)
                | (Connected, Disconnecting)
                | (Connected, Failed)
                | (Disconnecting, Disconnected)
                | (Disconnected, AcquiringPermission)
                | (Failed, AcquiringPermission)
        )
    }

    /// A new call may be started from here
    pub fn can_start(self) -> bool {
        matches!(
            self,
            SessionStatus::Idle | SessionStatus::Disconnected | SessionStatus::Failed
        )
    }

    /// There is a live or pending remote session worth closing
    pub fn can_end(self) -> bool {
        matches!(self, SessionStatus::Connecting | SessionStatus::Connected)
    }

    /// No call in progress, so settings may be edited
    pub fn accepts_configuration(self) -> bool {
        self.can_start()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Idle => "idle",
            SessionStatus::AcquiringPermission => "acquiring_permission",
            SessionStatus::Connecting => "connecting",
            SessionStatus::Connected => "connected",
            SessionStatus::Disconnecting => "disconnecting",
            SessionStatus::Disconnected => "disconnected",
            SessionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single status change, published to observers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionTransition {
    pub from: SessionStatus,
    pub to: SessionStatus,
}

/// Conversational turn reported by the voice service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationMode {
    /// The agent is talking
    Speaking,
    /// The agent is waiting for the user
    Listening,
}
