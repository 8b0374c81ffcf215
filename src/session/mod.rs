//! Voice session management
//!
//! This module provides the `SessionController` that manages:
//! - Microphone permission probing before any network activity
//! - Opening and closing the remote voice session
//! - The session lifecycle state machine
//! - Translating service events into transcript entries
//! - Gating post-session feedback

mod config;
mod feedback;
mod service;
mod session;
mod stats;
mod status;

pub use config::{SessionConfig, TransportMode};
pub use feedback::{FeedbackCapability, FeedbackCoordinator};
pub use service::{EventSink, OpenSessionRequest, ServiceEvent, VoiceService};
pub use session::SessionController;
pub use stats::SessionView;
pub use status::{ConversationMode, SessionStatus, SessionTransition};
