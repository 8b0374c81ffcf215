use anyhow::{bail, Context, Result};
use async_nats::Client;
use futures::stream::{Stream, StreamExt};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::messages::{
    AckReply, CloseSessionMessage, FeedbackMessage, OpenSessionMessage, OpenSessionReply,
    SessionEventMessage,
};
use crate::session::{EventSink, OpenSessionRequest, ServiceEvent, VoiceService};

/// Whether the service currently accepts feedback
///
/// Driven by `feedback_eligibility` events. Closed whenever a new session
/// starts or the event subscription ends.
#[derive(Debug, Default)]
pub(crate) struct FeedbackWindow(AtomicBool);

impl FeedbackWindow {
    fn observe(&self, event: &ServiceEvent) {
        if let ServiceEvent::FeedbackEligibility { can_send } = event {
            self.0.store(*can_send, Ordering::SeqCst);
        }
    }

    fn close(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    fn is_open(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Relay events for `session_key` into `events`
///
/// Keeps reading after the controller drops its end of the sink, so the
/// feedback window still follows the service once the session is closed.
pub(crate) async fn forward_events<S>(
    mut payloads: S,
    session_key: String,
    window: Arc<FeedbackWindow>,
    events: EventSink,
) where
    S: Stream + Unpin,
    S::Item: AsRef<[u8]>,
{
    let mut forwarding = true;

    while let Some(payload) = payloads.next().await {
        let message = match serde_json::from_slice::<SessionEventMessage>(payload.as_ref()) {
            Ok(message) => message,
            Err(e) => {
                warn!("Failed to parse session event: {}", e);
                continue;
            }
        };

        if message.session_key != session_key {
            continue;
        }

        window.observe(&message.event);

        if forwarding && events.send(message.event).is_err() {
            debug!("Controller stopped listening to {}", session_key);
            forwarding = false;
        }
    }

    window.close();
    info!("Session event forwarding stopped for {}", session_key);
}

/// The session currently held open on the service
struct ActiveSession {
    session_key: String,
    conversation_id: Option<String>,
    forward_task: JoinHandle<()>,
}

/// Voice service reached through NATS request/reply
pub struct NatsVoiceService {
    client: Client,
    subject_prefix: String,
    request_timeout: Duration,
    active: Mutex<Option<ActiveSession>>,
    /// Forwarder of the last closed session, kept until the next open
    lingering: Mutex<Option<JoinHandle<()>>>,
    /// Kept after close so feedback can target the most recent conversation
    last_conversation_id: Mutex<Option<String>>,
    feedback: Arc<FeedbackWindow>,
}

impl NatsVoiceService {
    /// Connect to NATS server
    pub async fn connect(url: &str, subject_prefix: &str, request_timeout: Duration) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self {
            client,
            subject_prefix: subject_prefix.to_string(),
            request_timeout,
            active: Mutex::new(None),
            lingering: Mutex::new(None),
            last_conversation_id: Mutex::new(None),
            feedback: Arc::new(FeedbackWindow::default()),
        })
    }

    fn subject(&self, suffix: &str) -> String {
        format!("{}.{}", self.subject_prefix, suffix)
    }

    async fn request<T: Serialize, R: DeserializeOwned>(&self, suffix: &str, body: &T) -> Result<R> {
        let subject = self.subject(suffix);
        let payload = serde_json::to_vec(body)?;

        let reply = tokio::time::timeout(
            self.request_timeout,
            self.client.request(subject.clone(), payload.into()),
        )
        .await
        .with_context(|| format!("Request to {} timed out", subject))?
        .with_context(|| format!("Request to {} failed", subject))?;

        serde_json::from_slice(&reply.payload)
            .with_context(|| format!("Invalid reply from {}", subject))
    }

    /// Forward session events from NATS into the controller's sink
    async fn spawn_forwarder(&self, session_key: &str, events: EventSink) -> Result<JoinHandle<()>> {
        let subject = self.subject(&format!("events.{}", session_key));

        info!("Subscribing to session events on {}", subject);

        let subscriber = self
            .client
            .subscribe(subject)
            .await
            .context("Failed to subscribe to session events")?;

        let payloads = subscriber.map(|msg| msg.payload).boxed();

        Ok(tokio::spawn(forward_events(
            payloads,
            session_key.to_string(),
            Arc::clone(&self.feedback),
            events,
        )))
    }
}

#[async_trait::async_trait]
impl VoiceService for NatsVoiceService {
    async fn open_session(&self, request: OpenSessionRequest, events: EventSink) -> Result<String> {
        let session_key = uuid::Uuid::new_v4().to_string();

        // The previous session's window does not carry over
        if let Some(task) = self.lingering.lock().await.take() {
            task.abort();
        }
        self.feedback.close();

        // Subscribe first so no early event is lost
        let forward_task = self.spawn_forwarder(&session_key, events).await?;

        let message = OpenSessionMessage {
            session_key: session_key.clone(),
            agent_id: request.agent_id,
            transport: request.transport,
        };

        let reply: OpenSessionReply = match self.request("session.open", &message).await {
            Ok(reply) => reply,
            Err(e) => {
                forward_task.abort();
                return Err(e);
            }
        };

        let conversation_id = match reply {
            OpenSessionReply {
                error: Some(error), ..
            } => {
                forward_task.abort();
                bail!("Voice service refused session: {}", error);
            }
            OpenSessionReply {
                conversation_id: Some(id),
                ..
            } => id,
            _ => {
                forward_task.abort();
                bail!("Voice service returned no conversation id");
            }
        };

        info!("Session {} opened as conversation {}", session_key, conversation_id);

        *self.last_conversation_id.lock().await = Some(conversation_id.clone());

        let previous = self.active.lock().await.replace(ActiveSession {
            session_key,
            conversation_id: Some(conversation_id.clone()),
            forward_task,
        });
        if let Some(previous) = previous {
            warn!("Replacing session {} that was never closed", previous.session_key);
            previous.forward_task.abort();
        }

        Ok(conversation_id)
    }

    async fn close_session(&self) -> Result<()> {
        let Some(active) = self.active.lock().await.take() else {
            warn!("No open session to close");
            return Ok(());
        };

        let message = CloseSessionMessage {
            session_key: active.session_key.clone(),
            conversation_id: active.conversation_id.clone(),
        };

        let result: Result<AckReply> = self.request("session.close", &message).await;

        // Still needed for the disconnect echo and later eligibility changes
        if let Some(previous) = self.lingering.lock().await.replace(active.forward_task) {
            previous.abort();
        }

        let ack = result?;
        if !ack.ok {
            bail!(
                "Voice service failed to close session: {}",
                ack.error.unwrap_or_else(|| "unknown error".to_string())
            );
        }

        info!("Session {} closed", active.session_key);
        Ok(())
    }

    async fn send_feedback(&self, positive: bool) -> Result<()> {
        let message = FeedbackMessage {
            conversation_id: self.last_conversation_id.lock().await.clone(),
            positive,
        };

        let ack: AckReply = self.request("feedback", &message).await?;
        if !ack.ok {
            bail!(
                "Voice service rejected feedback: {}",
                ack.error.unwrap_or_else(|| "unknown error".to_string())
            );
        }

        Ok(())
    }

    fn can_send_feedback(&self) -> bool {
        self.feedback.is_open()
    }

    fn name(&self) -> &str {
        "nats"
    }
}
