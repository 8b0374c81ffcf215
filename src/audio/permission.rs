// Microphone permission probe
//
// Surfaces permission and availability problems before any network cost is
// paid. The probe never keeps the device open.

use std::sync::Arc;
use tracing::{info, warn};

use super::backend::{AudioCapture, CaptureConstraints, RawCaptureError};
use crate::error::PermissionError;

pub struct PermissionGate {
    capture: Arc<dyn AudioCapture>,
    constraints: CaptureConstraints,
}

impl PermissionGate {
    pub fn new(capture: Arc<dyn AudioCapture>) -> Self {
        Self {
            capture,
            constraints: CaptureConstraints::default(),
        }
    }

    /// Confirm a usable microphone exists and release it again
    pub async fn probe(&self) -> Result<(), PermissionError> {
        if !self.capture.is_supported() {
            warn!("Capture backend {} has no microphone support", self.capture.name());
            return Err(PermissionError::Unsupported);
        }

        match self.capture.request_microphone(&self.constraints).await {
            Ok(handle) => {
                handle.release();
                info!("Microphone access granted ({})", self.capture.name());
                Ok(())
            }
            Err(raw) => {
                let err = normalize(&raw);
                warn!("Microphone error: {} -> {}", raw, err.kind());
                Err(err)
            }
        }
    }
}

/// Map a raw platform error onto the stable permission taxonomy
pub fn normalize(raw: &RawCaptureError) -> PermissionError {
    match raw.name.as_str() {
        "NotFoundError" | "NotFound" | "DevicesNotFoundError" => PermissionError::DeviceNotFound,
        "NotAllowedError" | "PermissionDenied" | "PermissionDeniedError" | "SecurityError" => {
            PermissionError::PermissionDenied
        }
        "NotReadableError" | "NotReadable" | "TrackStartError" => PermissionError::DeviceBusy,
        "NotSupportedError" | "Unsupported" => PermissionError::Unsupported,
        _ => PermissionError::Unknown(raw.message.clone()),
    }
}
