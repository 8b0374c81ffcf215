pub mod client;
pub mod messages;

pub use client::NatsVoiceService;
pub use messages::{
    AckReply, CloseSessionMessage, FeedbackMessage, OpenSessionMessage, OpenSessionReply,
    SessionEventMessage,
};
