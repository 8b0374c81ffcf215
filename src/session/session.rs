use super::config::SessionConfig;
use super::feedback::{FeedbackCapability, FeedbackCoordinator};
use super::service::{OpenSessionRequest, ServiceEvent, VoiceService};
use super::stats::{SessionState, SessionView};
use super::status::{ConversationMode, SessionStatus, SessionTransition};
use crate::audio::{AudioCapture, PermissionGate};
use crate::error::SessionError;
use crate::transcript::{Clock, Role, SystemClock, TranscriptLog, TranscriptSnapshot};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

const CONNECTED_NOTICE: &str = "Connected to voice agent";
const DISCONNECTED_NOTICE: &str = "Disconnected from voice agent";

/// State shared between the controller and its event pump
struct Shared {
    /// Never held across an await
    state: Mutex<SessionState>,

    status_tx: watch::Sender<SessionStatus>,

    transitions_tx: broadcast::Sender<SessionTransition>,
}

impl Shared {
    /// Move to `to` if the lifecycle allows it and notify observers
    fn set_status(&self, state: &mut SessionState, to: SessionStatus) -> bool {
        let from = state.status;
        if !from.can_transition_to(to) {
            error!("Rejected illegal session transition {} -> {}", from, to);
            return false;
        }

        state.status = to;
        if to != SessionStatus::Connected {
            state.mode = None;
        }
        if to == SessionStatus::Disconnected {
            state.conversation_id = None;
        }

        info!("Session status: {} -> {}", from, to);

        self.status_tx.send_replace(to);
        // No subscribers is fine
        let _ = self.transitions_tx.send(SessionTransition { from, to });

        true
    }

    fn mark_connected(&self, state: &mut SessionState, conversation_id: String) {
        info!("Connected: {}", conversation_id);
        state.conversation_id = Some(conversation_id);
        if self.set_status(state, SessionStatus::Connected) {
            state.transcript.append(Role::System, CONNECTED_NOTICE);
        }
    }

    fn fail(&self, state: &mut SessionState, notice: String) {
        state.transcript.append(Role::System, notice);
        self.set_status(state, SessionStatus::Failed);
    }

    /// Apply one service event. The single entry point for remote input.
    async fn dispatch(&self, event: ServiceEvent) {
        let mut state = self.state.lock().await;
        self.apply(&mut state, event);
    }

    fn apply(&self, state: &mut SessionState, event: ServiceEvent) {
        use SessionStatus::*;

        let status = state.status;
        match event {
            ServiceEvent::Connect { conversation_id } => match status {
                Connecting => self.mark_connected(state, conversation_id),
                Connected if state.conversation_id.is_none() => {
                    state.conversation_id = Some(conversation_id);
                }
                status => debug!("Ignoring connect event while {}", status),
            },

            ServiceEvent::Disconnect => match status {
                Connected => {
                    info!("Remote side ended the session");
                    self.set_status(state, Disconnecting);
                    self.set_status(state, Disconnected);
                    state.transcript.append(Role::System, DISCONNECTED_NOTICE);
                }
                Disconnecting => {
                    // Echo of our own close, which leaves no notice
                    debug!("Service confirmed the session close");
                    self.set_status(state, Disconnected);
                }
                Connecting => {
                    warn!("Session closed before it was established");
                    self.fail(
                        state,
                        "Failed to connect: session closed before it was established".to_string(),
                    );
                }
                status => debug!("Ignoring disconnect event while {}", status),
            },

            ServiceEvent::Message { role, content } => {
                debug!("Message from {}: {}", role, content);
                state.transcript.append(role, content);
            }

            ServiceEvent::Error { detail } => match status {
                Connecting | Connected => {
                    error!("Session error: {}", detail);
                    self.fail(state, format!("Error: {}", detail));
                }
                Disconnecting => {
                    // Close is already in flight and will settle the status
                    error!("Session error while disconnecting: {}", detail);
                    state.transcript.append(Role::System, format!("Error: {}", detail));
                }
                status => warn!("Ignoring error event while {}: {}", status, detail),
            },

            ServiceEvent::StatusChange { status: label } => {
                debug!("Service status changed to: {}", label);
            }

            ServiceEvent::ModeChange { mode } => {
                if status == Connected {
                    debug!("Mode changed to: {:?}", mode);
                    state.mode = Some(mode);
                } else {
                    debug!("Ignoring mode change while {}", status);
                }
            }

            ServiceEvent::FeedbackEligibility { can_send } => {
                debug!("Feedback eligibility changed: {}", can_send);
            }
        }
    }
}

/// Controller for a single real-time voice conversation
///
/// Owns the session lifecycle and the transcript. Caller intents (`start_call`,
/// `end_call`) and service events are serialized through one lock; slow work
/// (microphone probe, session open/close) runs with the lock released.
pub struct SessionController {
    shared: Arc<Shared>,

    gate: PermissionGate,

    service: Arc<dyn VoiceService>,

    /// Drains service events for the current attempt
    event_task: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl SessionController {
    pub fn new(
        config: SessionConfig,
        capture: Arc<dyn AudioCapture>,
        service: Arc<dyn VoiceService>,
    ) -> Self {
        Self::with_clock(config, capture, service, Arc::new(SystemClock))
    }

    /// Create a controller whose transcript timestamps come from `clock`
    pub fn with_clock(
        config: SessionConfig,
        capture: Arc<dyn AudioCapture>,
        service: Arc<dyn VoiceService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (status_tx, _) = watch::channel(SessionStatus::Idle);
        let (transitions_tx, _) = broadcast::channel(64);

        let state = SessionState::new(config, TranscriptLog::new(clock));

        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                status_tx,
                transitions_tx,
            }),
            gate: PermissionGate::new(capture),
            service,
            event_task: std::sync::Mutex::new(None),
        }
    }

    /// Start a new call: probe the microphone, then open a session
    pub async fn start_call(&self) -> Result<(), SessionError> {
        let (request, attempt) = {
            let mut state = self.shared.state.lock().await;

            if !state.status.can_start() {
                return Err(SessionError::InvalidState {
                    operation: "start a call",
                    status: state.status,
                });
            }
            if state.opening {
                return Err(SessionError::InvalidState {
                    operation: "start a call before the previous session has opened",
                    status: state.status,
                });
            }
            state.config.validate()?;

            state.attempt += 1;
            state.conversation_id = None;
            self.shared
                .set_status(&mut state, SessionStatus::AcquiringPermission);

            let request = OpenSessionRequest {
                agent_id: state.config.agent_id.clone(),
                transport: state.config.transport,
            };
            (request, state.attempt)
        };

        // Events from a previous attempt must not reach this one
        self.stop_event_pump();

        info!("Starting call #{} with agent {}", attempt, request.agent_id);

        let probe = self.gate.probe().await;

        let (tx, rx) = mpsc::unbounded_channel();
        {
            let mut state = self.shared.state.lock().await;

            if let Err(err) = probe {
                let err = SessionError::from(err);
                self.shared.fail(&mut state, err.to_string());
                return Err(err);
            }

            if !self.shared.set_status(&mut state, SessionStatus::Connecting) {
                return Err(SessionError::InvalidState {
                    operation: "connect",
                    status: state.status,
                });
            }
            state.opening = true;
            self.spawn_event_pump(rx);
        }

        info!(
            "Connecting to agent {} over {}",
            request.agent_id, request.transport
        );

        match self.service.open_session(request, tx).await {
            Ok(conversation_id) => {
                let mut state = self.shared.state.lock().await;

                let status = state.status;
                match status {
                    SessionStatus::Connecting => {
                        state.opening = false;
                        self.shared.mark_connected(&mut state, conversation_id);
                        Ok(())
                    }
                    SessionStatus::Failed => {
                        // Keep new calls out until the orphan is closed
                        drop(state);
                        warn!("Call #{} opened after it failed, closing it", attempt);
                        if let Err(e) = self.service.close_session().await {
                            warn!("Failed to close abandoned session: {:#}", e);
                        }
                        self.shared.state.lock().await.opening = false;
                        Err(SessionError::Connection(
                            "session failed before it was established".to_string(),
                        ))
                    }
                    status => {
                        // The connect event got here first
                        state.opening = false;
                        debug!("Session open resolved while {}", status);
                        if status == SessionStatus::Connected && state.conversation_id.is_none() {
                            state.conversation_id = Some(conversation_id);
                        }
                        Ok(())
                    }
                }
            }
            Err(e) => {
                let reason = format!("{:#}", e);
                error!("Failed to start conversation: {}", reason);

                let mut state = self.shared.state.lock().await;
                state.opening = false;
                if state.status == SessionStatus::Connecting {
                    self.shared
                        .fail(&mut state, format!("Failed to connect: {}", reason));
                }
                Err(SessionError::Connection(reason))
            }
        }
    }

    /// End the current call
    ///
    /// A no-op unless a session is connecting or connected. While connecting,
    /// waits for the attempt to resolve and only closes if it connected. A close
    /// failure is recorded and returned, but the session still ends.
    pub async fn end_call(&self) -> Result<(), SessionError> {
        let status = self.status();
        if !status.can_end() {
            debug!("Ignoring end request while {}", status);
            return Ok(());
        }

        if status == SessionStatus::Connecting {
            debug!("End requested while connecting, waiting for the attempt to resolve");
            let mut status_rx = self.shared.status_tx.subscribe();
            if let Err(e) = status_rx
                .wait_for(|status| *status != SessionStatus::Connecting)
                .await
            {
                debug!("Status channel closed while waiting to end: {}", e);
            };
        }

        {
            let mut state = self.shared.state.lock().await;
            if state.status != SessionStatus::Connected {
                debug!("Ignoring end request while {}", state.status);
                return Ok(());
            }
            self.shared
                .set_status(&mut state, SessionStatus::Disconnecting);
        }

        info!("Ending session via {}", self.service.name());

        let closed = self.service.close_session().await;

        let mut state = self.shared.state.lock().await;
        let result = match closed {
            Ok(()) => Ok(()),
            Err(e) => {
                let reason = format!("{:#}", e);
                error!("Failed to end conversation: {}", reason);
                state
                    .transcript
                    .append(Role::System, format!("Failed to end session: {}", reason));
                Err(SessionError::Connection(reason))
            }
        };

        // The disconnect event may already have settled it
        if state.status == SessionStatus::Disconnecting {
            self.shared
                .set_status(&mut state, SessionStatus::Disconnected);
        }

        result
    }

    /// Deliver a service event directly, bypassing the per-attempt channel
    pub async fn dispatch(&self, event: ServiceEvent) {
        self.shared.dispatch(event).await;
    }

    /// Replace the agent/transport settings between calls
    pub async fn set_config(&self, config: SessionConfig) -> Result<(), SessionError> {
        let mut state = self.shared.state.lock().await;
        if !state.status.accepts_configuration() {
            return Err(SessionError::InvalidState {
                operation: "change configuration",
                status: state.status,
            });
        }

        info!("Session configuration updated (agent {})", config.agent_id);
        state.config = config;
        Ok(())
    }

    pub async fn config(&self) -> SessionConfig {
        self.shared.state.lock().await.config.clone()
    }

    pub fn status(&self) -> SessionStatus {
        *self.shared.status_tx.borrow()
    }

    pub async fn mode(&self) -> Option<ConversationMode> {
        self.shared.state.lock().await.mode
    }

    pub async fn conversation_id(&self) -> Option<String> {
        self.shared.state.lock().await.conversation_id.clone()
    }

    pub async fn view(&self) -> SessionView {
        let can_send = self.feedback_capability().can_send;
        self.shared.state.lock().await.view(can_send)
    }

    /// Current transcript, isolated from later appends
    pub async fn transcript(&self) -> TranscriptSnapshot {
        self.shared.state.lock().await.transcript.snapshot()
    }

    /// Observe the current status
    pub fn watch_status(&self) -> watch::Receiver<SessionStatus> {
        self.shared.status_tx.subscribe()
    }

    /// Observe every status transition from now on
    pub fn subscribe(&self) -> broadcast::Receiver<SessionTransition> {
        self.shared.transitions_tx.subscribe()
    }

    pub fn feedback_capability(&self) -> FeedbackCapability {
        FeedbackCapability::current(self.service.as_ref())
    }

    pub fn feedback(&self) -> FeedbackCoordinator {
        FeedbackCoordinator::new(Arc::clone(&self.service))
    }

    fn spawn_event_pump(&self, mut rx: mpsc::UnboundedReceiver<ServiceEvent>) {
        let shared = Arc::clone(&self.shared);

        let task = tokio::spawn(async move {
            debug!("Service event pump started");

            while let Some(event) = rx.recv().await {
                shared.dispatch(event).await;
            }

            debug!("Service event pump stopped");
        });

        match self.event_task.lock() {
            Ok(mut slot) => {
                if let Some(previous) = slot.replace(task) {
                    previous.abort();
                }
            }
            Err(e) => error!("Event task slot poisoned: {}", e),
        }
    }

    fn stop_event_pump(&self) {
        if let Ok(mut slot) = self.event_task.lock() {
            if let Some(task) = slot.take() {
                task.abort();
            }
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.stop_event_pump();
    }
}
