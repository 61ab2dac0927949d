use async_trait::async_trait;
use tracing::info;

/// Message handed to a bot platform.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SinkMessage {
    /// Character (or system) the line is attributed to.
    pub speaker: String,
    pub text: String,
    /// Persona active on the bot side when the line went out.
    pub persona: String,
    pub urgent: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("platform {0} is unavailable")]
    Unavailable(String),
    #[error("platform {platform} rejected the message: {reason}")]
    Rejected { platform: String, reason: String },
}

/// A bot platform client. Platforms handle their own rendering and rate
/// limits; delivery here is fire and forget.
#[async_trait]
pub trait EventSink: Send + Sync + 'static {
    fn platform(&self) -> &str;
    async fn send(&self, message: &SinkMessage) -> Result<(), SinkError>;
}

/// Writes every message to the log.
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl EventSink for LogSink {
    fn platform(&self) -> &str { "log" }

    async fn send(&self, message: &SinkMessage) -> Result<(), SinkError> {
        if message.urgent {
            info!("[{}|{}] !! {}", message.persona, message.speaker, message.text);
        } else {
            info!("[{}|{}] {}", message.persona, message.speaker, message.text);
        }
        Ok(())
    }
}
