pub mod audio;
pub mod config;
pub mod error;
pub mod http;
pub mod nats;
pub mod session;
pub mod transcript;

pub use audio::{
    AudioCapture, AudioCaptureFactory, CaptureBackend, CaptureConstraints, CaptureHandle,
    PermissionGate, RawCaptureError,
};
pub use config::Config;
pub use error::{PermissionError, SessionError};
pub use http::{create_router, AppState};
pub use nats::NatsVoiceService;
pub use session::{
    ConversationMode, EventSink, FeedbackCapability, FeedbackCoordinator, OpenSessionRequest,
    ServiceEvent, SessionConfig, SessionController, SessionStatus, SessionTransition, SessionView,
    TransportMode, VoiceService,
};
pub use transcript::{Clock, Message, Role, SystemClock, TranscriptLog, TranscriptSnapshot};
