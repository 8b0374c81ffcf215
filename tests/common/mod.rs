// Test doubles for the voice service and the capture primitive
#![allow(dead_code)]

use anyhow::{anyhow, Result};
use chrono::{DateTime, TimeZone, Utc};
use loqa_voice_agent::{
    AudioCapture, CaptureConstraints, CaptureHandle, Clock, EventSink, OpenSessionRequest,
    RawCaptureError, ServiceEvent, SessionConfig, SessionController, SessionTransition,
    TransportMode, VoiceService,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, Notify};

pub const AGENT_ID: &str = "agent_2101kd5bx850fgna9h0ab6kynh4m";

pub struct FixedClock;

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 27, 14, 30, 0).unwrap()
    }
}

// ============================================================================
// Capture
// ============================================================================

pub struct MockCapture {
    outcome: Option<RawCaptureError>,
    pub requests: AtomicUsize,
    pub released: Arc<AtomicUsize>,
}

struct MockHandle(Arc<AtomicUsize>);

impl CaptureHandle for MockHandle {
    fn release(self: Box<Self>) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

impl MockCapture {
    pub fn granting() -> Self {
        Self {
            outcome: None,
            requests: AtomicUsize::new(0),
            released: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn denying(code: &str) -> Self {
        Self {
            outcome: Some(RawCaptureError::new(code, "capture failed")),
            requests: AtomicUsize::new(0),
            released: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait::async_trait]
impl AudioCapture for MockCapture {
    fn is_supported(&self) -> bool {
        true
    }

    async fn request_microphone(
        &self,
        _constraints: &CaptureConstraints,
    ) -> std::result::Result<Box<dyn CaptureHandle>, RawCaptureError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            None => Ok(Box::new(MockHandle(Arc::clone(&self.released)))),
            Some(err) => Err(err.clone()),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ============================================================================
// Voice service
// ============================================================================

pub struct MockVoiceService {
    open_results: Mutex<VecDeque<std::result::Result<String, String>>>,
    close_result: Mutex<std::result::Result<(), String>>,
    feedback_result: Mutex<std::result::Result<(), String>>,
    open_events: Mutex<Vec<ServiceEvent>>,
    open_gate: Option<Arc<Notify>>,
    close_gate: Option<Arc<Notify>>,
    echo_disconnect: bool,
    sink: Mutex<Option<EventSink>>,

    pub requests: Mutex<Vec<OpenSessionRequest>>,
    pub open_calls: AtomicUsize,
    pub close_calls: AtomicUsize,
    pub feedback_sent: Mutex<Vec<bool>>,
    pub can_send: AtomicBool,
}

impl MockVoiceService {
    /// Every open resolves with conversation "c1" unless scripted otherwise
    pub fn new() -> Self {
        Self {
            open_results: Mutex::new(VecDeque::new()),
            close_result: Mutex::new(Ok(())),
            feedback_result: Mutex::new(Ok(())),
            open_events: Mutex::new(Vec::new()),
            open_gate: None,
            close_gate: None,
            echo_disconnect: false,
            sink: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
            open_calls: AtomicUsize::new(0),
            close_calls: AtomicUsize::new(0),
            feedback_sent: Mutex::new(Vec::new()),
            can_send: AtomicBool::new(false),
        }
    }

    pub fn with_open_result(self, result: std::result::Result<&str, &str>) -> Self {
        self.open_results.lock().unwrap().push_back(
            result
                .map(|id| id.to_string())
                .map_err(|e| e.to_string()),
        );
        self
    }

    pub fn with_close_error(self, error: &str) -> Self {
        *self.close_result.lock().unwrap() = Err(error.to_string());
        self
    }

    pub fn with_feedback_error(self, error: &str) -> Self {
        *self.feedback_result.lock().unwrap() = Err(error.to_string());
        self
    }

    /// Events pushed into the sink while the open call is in flight
    pub fn with_open_events(self, events: Vec<ServiceEvent>) -> Self {
        *self.open_events.lock().unwrap() = events;
        self
    }

    /// Hold every open call until the gate is notified
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.open_gate = Some(gate);
        self
    }

    /// Hold every close call until the gate is notified
    pub fn gated_close(mut self, gate: Arc<Notify>) -> Self {
        self.close_gate = Some(gate);
        self
    }

    /// Publish a disconnect while closing, the way real backends confirm a close
    pub fn with_disconnect_echo(mut self) -> Self {
        self.echo_disconnect = true;
        self
    }

    /// Push an event through the sink handed over at open
    pub fn emit(&self, event: ServiceEvent) {
        let sink = self.sink.lock().unwrap();
        sink.as_ref()
            .expect("no session opened")
            .send(event)
            .expect("event pump is gone");
    }

    pub fn opens(&self) -> usize {
        self.open_calls.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl VoiceService for MockVoiceService {
    async fn open_session(&self, request: OpenSessionRequest, events: EventSink) -> Result<String> {
        self.open_calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);

        for event in self.open_events.lock().unwrap().iter() {
            let _ = events.send(event.clone());
        }
        *self.sink.lock().unwrap() = Some(events);

        if let Some(gate) = &self.open_gate {
            gate.notified().await;
        }

        let next = self.open_results.lock().unwrap().pop_front();
        match next {
            None => Ok("c1".to_string()),
            Some(Ok(id)) => Ok(id),
            Some(Err(e)) => Err(anyhow!(e)),
        }
    }

    async fn close_session(&self) -> Result<()> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.close_gate {
            gate.notified().await;
        }

        if self.echo_disconnect {
            if let Some(sink) = self.sink.lock().unwrap().as_ref() {
                let _ = sink.send(ServiceEvent::Disconnect);
            }
            // Let the event pump apply the echo before close returns
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        self.close_result.lock().unwrap().clone().map_err(|e| anyhow!(e))
    }

    async fn send_feedback(&self, positive: bool) -> Result<()> {
        self.feedback_sent.lock().unwrap().push(positive);
        self.feedback_result.lock().unwrap().clone().map_err(|e| anyhow!(e))
    }

    fn can_send_feedback(&self) -> bool {
        self.can_send.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ============================================================================
// Helpers
// ============================================================================

pub fn build_controller(
    config: SessionConfig,
    capture: Arc<MockCapture>,
    service: Arc<MockVoiceService>,
) -> SessionController {
    SessionController::with_clock(config, capture, service, Arc::new(FixedClock))
}

pub fn default_config() -> SessionConfig {
    SessionConfig::new(AGENT_ID, TransportMode::WebRtc)
}

/// Everything published on the transition channel so far
pub fn drain(rx: &mut broadcast::Receiver<SessionTransition>) -> Vec<SessionTransition> {
    let mut transitions = Vec::new();
    while let Ok(transition) = rx.try_recv() {
        transitions.push(transition);
    }
    transitions
}

/// Wait until the transcript holds at least `len` entries
pub async fn wait_for_transcript(controller: &SessionController, len: usize) {
    tokio::time::timeout(Duration::from_secs(1), async {
        while controller.transcript().await.len() < len {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("transcript did not grow in time");
}

/// Let the event pump drain anything already queued
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}
