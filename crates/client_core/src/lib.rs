use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{
    domain::{Identity, Message},
    error::{FaultKind, TransportFault},
    protocol::ChatRecord,
};
use thiserror::Error;
use tokio::{
    sync::{broadcast, mpsc, oneshot, Mutex},
    task::JoinHandle,
};
use tracing::{info, warn};
use url::Url;

pub mod backoff;
mod history;
pub mod live;
mod sender;
pub mod timeline;

pub use live::{LiveChannelOptions, LiveStatus};

use timeline::{run_engine, EngineCommand, Timeline};

const EVENT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Error)]
pub enum StartError {
    #[error("invalid api base `{0}`: {1}")]
    InvalidApiBase(String, url::ParseError),
    #[error("invalid socket base `{0}`: {1}")]
    InvalidSocketBase(String, url::ParseError),
    #[error("api base must use http or https, got `{0}`")]
    UnsupportedApiScheme(String),
    #[error("socket base must use ws or wss, got `{0}`")]
    UnsupportedSocketScheme(String),
}

#[derive(Debug, Clone)]
pub struct ChatClientOptions {
    /// HTTP endpoint root for the history fetch and outbound sends.
    pub api_base: String,
    /// WebSocket endpoint root for the live push channel.
    pub ws_base: String,
    pub live: LiveChannelOptions,
}

/// Events fanned out to the presentation layer. Timeline snapshots are
/// complete and ordered; consumers never patch state incrementally.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    TimelineUpdated(Vec<Message>),
    LiveStatusChanged(LiveStatus),
    Fault(TransportFault),
}

#[async_trait]
pub trait ChatHandle: Send + Sync {
    fn identity(&self) -> &Identity;
    async fn send_message(&self, text: &str) -> Result<()>;
    async fn timeline(&self) -> Result<Vec<Message>>;
    fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent>;
    async fn shutdown(&self);
}

/// Session context object owning the identity, the engine queue, and the
/// background tasks. Constructed once at startup and passed around
/// explicitly; there is no ambient global state.
pub struct ChatClient {
    http: reqwest::Client,
    api_base: String,
    identity: Identity,
    engine_tx: mpsc::UnboundedSender<EngineCommand>,
    events: broadcast::Sender<ClientEvent>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl ChatClient {
    /// Validate the configured bases, generate the session identity, and
    /// spawn the engine, history, and live-channel tasks. Must be called
    /// from within a tokio runtime.
    pub fn start(options: ChatClientOptions) -> Result<Arc<Self>> {
        let api_url = Url::parse(&options.api_base)
            .map_err(|err| StartError::InvalidApiBase(options.api_base.clone(), err))?;
        if !matches!(api_url.scheme(), "http" | "https") {
            return Err(StartError::UnsupportedApiScheme(api_url.scheme().to_string()).into());
        }
        let ws_url = Url::parse(&options.ws_base)
            .map_err(|err| StartError::InvalidSocketBase(options.ws_base.clone(), err))?;
        if !matches!(ws_url.scheme(), "ws" | "wss") {
            return Err(StartError::UnsupportedSocketScheme(ws_url.scheme().to_string()).into());
        }

        let identity = Identity::generate();
        let http = reqwest::Client::new();
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (engine_tx, engine_rx) = mpsc::unbounded_channel();

        info!(identity = %identity, api_base = %options.api_base, ws_base = %options.ws_base, "chat client starting");

        let engine_task = tokio::spawn(run_engine(
            Timeline::new(identity.clone()),
            engine_rx,
            events.clone(),
        ));

        let history_task = {
            let http = http.clone();
            let api_base = options.api_base.clone();
            let engine_tx = engine_tx.clone();
            let events = events.clone();
            tokio::spawn(async move {
                let records = match history::fetch_recent(&http, &api_base).await {
                    Ok(records) => {
                        info!(count = records.len(), "history: loaded");
                        records
                    }
                    Err(err) => {
                        warn!(error = %err, "history: fetch failed; starting with empty timeline");
                        let _ = events.send(ClientEvent::Fault(TransportFault::new(
                            FaultKind::HistoryFetch,
                            err.to_string(),
                        )));
                        Vec::new()
                    }
                };
                let _ = engine_tx.send(EngineCommand::HistoryLoaded(records));
            })
        };

        let live_task = tokio::spawn(live::run_live_channel(
            options.ws_base,
            options.live,
            engine_tx.clone(),
            events.clone(),
        ));

        Ok(Arc::new(Self {
            http,
            api_base: options.api_base,
            identity,
            engine_tx,
            events,
            tasks: Mutex::new(vec![engine_task, history_task, live_task]),
        }))
    }
}

#[async_trait]
impl ChatHandle for ChatClient {
    fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Append the message optimistically, then fire the backend request
    /// without waiting for it. A failed request is surfaced as a fault but
    /// the optimistic entry stays; there is no rollback.
    async fn send_message(&self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(anyhow!("message text must not be empty"));
        }

        self.engine_tx
            .send(EngineCommand::Local(text.to_string()))
            .map_err(|_| anyhow!("reconciliation engine is gone"))?;

        let http = self.http.clone();
        let api_base = self.api_base.clone();
        let record = ChatRecord {
            sender: self.identity.0.clone(),
            message: text.to_string(),
        };
        let events = self.events.clone();
        tokio::spawn(async move {
            if let Err(err) = sender::post_message(&http, &api_base, &record).await {
                warn!(error = %err, "send: message post failed");
                let _ = events.send(ClientEvent::Fault(TransportFault::new(
                    FaultKind::SendFailed,
                    err.to_string(),
                )));
            }
        });

        Ok(())
    }

    async fn timeline(&self) -> Result<Vec<Message>> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.engine_tx
            .send(EngineCommand::Snapshot(reply_tx))
            .map_err(|_| anyhow!("reconciliation engine is gone"))?;
        reply_rx
            .await
            .map_err(|_| anyhow!("reconciliation engine dropped the snapshot request"))
    }

    fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    /// Deliberate teardown: the live connection is released, the in-flight
    /// history request (if any) is abandoned, and nothing mutates the
    /// timeline afterwards. Not reported as an error.
    async fn shutdown(&self) {
        let mut tasks = self.tasks.lock().await;
        for task in tasks.drain(..) {
            task.abort();
        }
        info!(identity = %self.identity, "chat client shut down");
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
