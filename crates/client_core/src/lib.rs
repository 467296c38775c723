pub mod audio;
pub mod audio_cache;
pub mod client;
pub mod error;
pub mod pages;
pub mod record_cache;
pub mod selection;
pub mod wizard;

use anyhow::Context;
use futures::StreamExt;
use shared::protocol::ServerEvent;
use tokio::{sync::broadcast, task::JoinHandle};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{info, warn};

pub use audio::{AudioSession, PlaybackBackend, PlaybackEvent, PlaybackState, SoundControl};
pub use audio_cache::GeneratedAudioCache;
pub use client::{Session, TrackerBackend, TrackerClient};
pub use error::{ClientError, PageError, PlaybackError, WizardError};
pub use pages::PageContext;
pub use record_cache::{RecordCache, SyncStatus};
pub use selection::{SelectedInfant, SelectionStore};
pub use wizard::{AdvanceOutcome, SelectionSink, Wizard, WizardStep};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub enum ClientEvent {
    Server(ServerEvent),
    Notice {
        level: NoticeLevel,
        title: String,
        description: String,
    },
    Error(String),
}

/// Fan-out of client events to whatever is rendering them.
#[derive(Debug, Clone)]
pub struct Notifier {
    events: broadcast::Sender<ClientEvent>,
}

impl Default for Notifier {
    fn default() -> Self {
        let (events, _) = broadcast::channel(1024);
        Self { events }
    }
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub fn send(&self, event: ClientEvent) {
        let _ = self.events.send(event);
    }

    pub fn notice(&self, level: NoticeLevel, title: &str, description: impl Into<String>) {
        self.send(ClientEvent::Notice {
            level,
            title: title.to_string(),
            description: description.into(),
        });
    }

    pub fn success(&self, title: &str, description: impl Into<String>) {
        self.notice(NoticeLevel::Success, title, description);
    }

    pub fn error(&self, title: &str, description: impl Into<String>) {
        self.notice(NoticeLevel::Error, title, description);
    }
}

/// Connects the owner's websocket and forwards server events until the
/// stream closes.
pub async fn spawn_event_stream(
    client: &TrackerClient,
    notifier: Notifier,
) -> Result<JoinHandle<()>, ClientError> {
    let ws_url = client.events_url().await?;
    let (mut ws_stream, _) = connect_async(ws_url.as_str())
        .await
        .with_context(|| format!("failed to connect websocket: {}", client.server_url()))?;
    info!(server_url = client.server_url(), "events: websocket connected");

    Ok(tokio::spawn(async move {
        while let Some(msg) = ws_stream.next().await {
            match msg {
                Ok(Message::Text(text)) => match serde_json::from_str::<ServerEvent>(&text) {
                    Ok(event) => notifier.send(ClientEvent::Server(event)),
                    Err(err) => {
                        notifier.send(ClientEvent::Error(format!("invalid server event: {err}")))
                    }
                },
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(err) => {
                    warn!("events: websocket receive failed: {err}");
                    notifier.send(ClientEvent::Error(format!(
                        "websocket receive failed: {err}"
                    )));
                    break;
                }
            }
        }
        info!("events: websocket closed");
    }))
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
