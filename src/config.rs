use anyhow::{Context, Result};
use serde::Deserialize;

use crate::audio::CaptureBackend;
use crate::session::{SessionConfig, TransportMode};

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    pub nats: NatsConfig,
    #[serde(default)]
    pub audio: AudioConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Default, Deserialize)]
pub struct AgentConfig {
    /// May be left empty here and supplied later through the API
    #[serde(default)]
    pub agent_id: String,
    #[serde(default)]
    pub transport: TransportMode,
}

#[derive(Debug, Deserialize)]
pub struct NatsConfig {
    pub url: String,
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct AudioConfig {
    pub capture: CaptureBackend,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            capture: CaptureBackend::Unavailable,
        }
    }
}

fn default_subject_prefix() -> String {
    "voice".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl Config {
    /// Load from a config file (extension optional) plus `LOQA_VOICE__*` overrides,
    /// e.g. `LOQA_VOICE__AGENT__AGENT_ID=agent_123`
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("LOQA_VOICE").separator("__"))
            .build()
            .with_context(|| format!("Failed to read config {}", path))?;

        settings
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::new(self.agent.agent_id.clone(), self.agent.transport)
    }
}
