use anyhow::{Context, Result};
use clap::Parser;
use loqa_voice_agent::{
    create_router, AppState, AudioCaptureFactory, Config, NatsVoiceService, SessionController,
    TransportMode,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Voice agent session controller with an HTTP control API
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Config file, extension optional
    #[arg(short, long, default_value = "config/loqa-voice-agent")]
    config: String,

    /// Override the configured agent id
    #[arg(long)]
    agent_id: Option<String>,

    /// Override the configured transport (webrtc | websocket)
    #[arg(long)]
    transport: Option<TransportMode>,

    /// Override the configured capture backend (unavailable | preauthorized)
    #[arg(long)]
    capture: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("Loqa Voice Agent v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);

    let mut session_config = cfg.session_config();
    if let Some(agent_id) = args.agent_id {
        session_config.agent_id = agent_id;
    }
    if let Some(transport) = args.transport {
        session_config.transport = transport;
    }
    if session_config.agent_id.is_empty() {
        info!("No agent id configured yet; set one via PUT /session/config");
    }

    let capture_backend = match args.capture.as_deref() {
        Some(name) => AudioCaptureFactory::parse(name)?,
        None => cfg.audio.capture,
    };
    let capture = AudioCaptureFactory::create(capture_backend)?;

    let service = NatsVoiceService::connect(
        &cfg.nats.url,
        &cfg.nats.subject_prefix,
        Duration::from_millis(cfg.nats.request_timeout_ms),
    )
    .await?;

    let controller = SessionController::new(session_config, Arc::from(capture), Arc::new(service));
    let app = create_router(AppState::new(Arc::new(controller)));

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP API listening on {}", addr);

    axum::serve(listener, app).await.context("HTTP server failed")?;

    Ok(())
}
