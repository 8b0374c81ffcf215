pub mod backend;
pub mod permission;

pub use backend::{
    AudioCapture, AudioCaptureFactory, CaptureBackend, CaptureConstraints, CaptureHandle,
    PreauthorizedCapture, RawCaptureError, UnavailableCapture,
};
pub use permission::{normalize, PermissionGate};
