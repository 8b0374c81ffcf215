use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use super::service::VoiceService;
use crate::error::SessionError;

/// Whether a satisfaction signal may be sent right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeedbackCapability {
    pub can_send: bool,
}

impl FeedbackCapability {
    /// Read the current window from the service
    pub fn current(service: &dyn VoiceService) -> Self {
        Self {
            can_send: service.can_send_feedback(),
        }
    }
}

/// Gate for post-session feedback
///
/// Holds no state of its own: eligibility is read from the service on every
/// call and each accepted call is forwarded as-is.
#[derive(Clone)]
pub struct FeedbackCoordinator {
    service: Arc<dyn VoiceService>,
}

impl FeedbackCoordinator {
    pub fn new(service: Arc<dyn VoiceService>) -> Self {
        Self { service }
    }

    pub fn capability(&self) -> FeedbackCapability {
        FeedbackCapability::current(self.service.as_ref())
    }

    pub async fn send_feedback(&self, positive: bool) -> Result<(), SessionError> {
        if !self.capability().can_send {
            return Err(SessionError::FeedbackNotAccepted);
        }

        info!("Sending {} feedback", if positive { "positive" } else { "negative" });

        self.service.send_feedback(positive).await.map_err(|e| {
            warn!("Feedback rejected by {}: {:#}", self.service.name(), e);
            SessionError::connection(e)
        })
    }
}
