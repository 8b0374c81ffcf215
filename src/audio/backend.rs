use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Processing hints passed with a microphone request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConstraints {
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain_control: bool,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: true,
        }
    }
}

/// Failure reported by the platform capture primitive, before normalization
///
/// `name` is the platform's error code (e.g. `NotAllowedError`), `message`
/// its human-readable description.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{name}: {message}")]
pub struct RawCaptureError {
    pub name: String,
    pub message: String,
}

impl RawCaptureError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// An open microphone input
pub trait CaptureHandle: Send {
    /// Stop all tracks and give the device back
    fn release(self: Box<Self>);
}

/// Platform microphone access
///
/// Implementations:
/// - `UnavailableCapture`: platform without any capture capability
/// - `PreauthorizedCapture`: headless deployments where the voice transport owns the device
/// - test doubles that script grant/deny outcomes
#[async_trait::async_trait]
pub trait AudioCapture: Send + Sync {
    /// Whether the platform exposes microphone capture at all
    fn is_supported(&self) -> bool;

    /// Open a microphone input with the given hints
    async fn request_microphone(
        &self,
        constraints: &CaptureConstraints,
    ) -> std::result::Result<Box<dyn CaptureHandle>, RawCaptureError>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Capture backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureBackend {
    /// No microphone access on this host
    Unavailable,
    /// Microphone access is granted out of band
    Preauthorized,
}

/// Capture backend factory
pub struct AudioCaptureFactory;

impl AudioCaptureFactory {
    pub fn create(backend: CaptureBackend) -> Result<Box<dyn AudioCapture>> {
        info!("Creating audio capture backend: {:?}", backend);

        match backend {
            CaptureBackend::Unavailable => Ok(Box::new(UnavailableCapture)),
            CaptureBackend::Preauthorized => Ok(Box::new(PreauthorizedCapture)),
        }
    }

    /// Parse a backend name from the command line or environment
    pub fn parse(name: &str) -> Result<CaptureBackend> {
        match name.to_ascii_lowercase().as_str() {
            "unavailable" | "none" => Ok(CaptureBackend::Unavailable),
            "preauthorized" => Ok(CaptureBackend::Preauthorized),
            other => bail!("Unknown capture backend: {}", other),
        }
    }
}

/// Backend for hosts with no capture capability
pub struct UnavailableCapture;

#[async_trait::async_trait]
impl AudioCapture for UnavailableCapture {
    fn is_supported(&self) -> bool {
        false
    }

    async fn request_microphone(
        &self,
        _constraints: &CaptureConstraints,
    ) -> std::result::Result<Box<dyn CaptureHandle>, RawCaptureError> {
        Err(RawCaptureError::new(
            "NotSupportedError",
            "microphone capture is not available on this host",
        ))
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}

/// Backend that always grants access without opening a device
pub struct PreauthorizedCapture;

struct NoopHandle;

impl CaptureHandle for NoopHandle {
    fn release(self: Box<Self>) {}
}

#[async_trait::async_trait]
impl AudioCapture for PreauthorizedCapture {
    fn is_supported(&self) -> bool {
        true
    }

    async fn request_microphone(
        &self,
        _constraints: &CaptureConstraints,
    ) -> std::result::Result<Box<dyn CaptureHandle>, RawCaptureError> {
        Ok(Box::new(NoopHandle))
    }

    fn name(&self) -> &str {
        "preauthorized"
    }
}
