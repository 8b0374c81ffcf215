//! HTTP API for the presentation layer
//!
//! This module provides a REST API for driving the voice session:
//! - GET /session - Current status, mode and feedback eligibility
//! - POST /session/start - Start a call
//! - POST /session/end - End the call
//! - PUT /session/config - Change agent id / transport between calls
//! - GET /session/transcript - Accumulated transcript
//! - POST /session/feedback - Send a satisfaction signal
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
