//! Live push channel: a receive-only websocket with an explicit
//! connect/open/closed lifecycle and a backoff-driven reconnect policy.

use std::time::Duration;

use futures::StreamExt;
use shared::{
    error::{FaultKind, TransportFault},
    protocol::ChatRecord,
};
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{error, info, warn};

use crate::{
    backoff::ExponentialBackoff,
    timeline::EngineCommand,
    ClientEvent,
};

/// Channel lifecycle as seen by the presentation layer. `Closed` is a
/// transient gap the reconnect policy is still working on; `Degraded` means
/// the attempt budget ran out and no further reconnects will happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveStatus {
    Connecting,
    Open,
    Closed,
    Degraded,
}

#[derive(Debug, Clone)]
pub struct LiveChannelOptions {
    pub reconnect_base_delay: Duration,
    pub reconnect_max_delay: Duration,
    /// 0 means retry forever; `LiveStatus::Degraded` is then never emitted.
    pub reconnect_max_attempts: u32,
}

impl Default for LiveChannelOptions {
    fn default() -> Self {
        Self {
            reconnect_base_delay: Duration::from_millis(500),
            reconnect_max_delay: Duration::from_secs(30),
            reconnect_max_attempts: 10,
        }
    }
}

/// Run the channel until the reconnect budget is exhausted or the owning
/// client aborts the task (deliberate teardown, reported as nothing).
///
/// Messages pushed while the channel is down are not recovered; there is no
/// gap-filling protocol. The timeline is left untouched across the gap.
pub(crate) async fn run_live_channel(
    ws_url: String,
    options: LiveChannelOptions,
    engine: mpsc::UnboundedSender<EngineCommand>,
    events: broadcast::Sender<ClientEvent>,
) {
    let mut backoff = ExponentialBackoff::new(
        options.reconnect_base_delay,
        options.reconnect_max_delay,
        options.reconnect_max_attempts,
    );

    loop {
        let _ = events.send(ClientEvent::LiveStatusChanged(LiveStatus::Connecting));
        match connect_async(&ws_url).await {
            Ok((stream, _)) => {
                backoff.reset();
                info!(url = %ws_url, "live: channel open");
                let _ = events.send(ClientEvent::LiveStatusChanged(LiveStatus::Open));

                let (_, mut reader) = stream.split();
                while let Some(frame) = reader.next().await {
                    match frame {
                        Ok(Message::Text(text)) => handle_frame(&text, &engine, &events),
                        Ok(Message::Close(_)) => {
                            info!("live: server closed the channel");
                            break;
                        }
                        Ok(_) => {}
                        Err(err) => {
                            warn!(error = %err, "live: receive failed");
                            let _ = events.send(ClientEvent::Fault(TransportFault::new(
                                FaultKind::ConnectionLost,
                                err.to_string(),
                            )));
                            break;
                        }
                    }
                }
                let _ = events.send(ClientEvent::LiveStatusChanged(LiveStatus::Closed));
            }
            Err(err) => {
                warn!(url = %ws_url, error = %err, "live: connect failed");
                let _ = events.send(ClientEvent::LiveStatusChanged(LiveStatus::Closed));
            }
        }

        match backoff.next_delay() {
            Some(delay) => {
                info!(delay_ms = delay.as_millis() as u64, "live: reconnecting after backoff");
                tokio::time::sleep(delay).await;
            }
            None => {
                error!(url = %ws_url, "live: reconnect attempts exhausted");
                let _ = events.send(ClientEvent::LiveStatusChanged(LiveStatus::Degraded));
                return;
            }
        }
    }
}

/// A frame that is not a JSON array is dropped whole; the connection stays
/// open. Empty batches are ignored.
fn handle_frame(
    text: &str,
    engine: &mpsc::UnboundedSender<EngineCommand>,
    events: &broadcast::Sender<ClientEvent>,
) {
    match decode_batch(text) {
        Ok(records) => {
            if !records.is_empty() {
                let _ = engine.send(EngineCommand::LiveBatch(records));
            }
        }
        Err(err) => {
            warn!(error = %err, "live: dropping malformed batch");
            let _ = events.send(ClientEvent::Fault(TransportFault::new(
                FaultKind::MalformedPayload,
                err.to_string(),
            )));
        }
    }
}

/// Decode one push frame. The outer value must be a JSON array; elements
/// that are not `{sender, message}` objects are skipped individually so the
/// valid records around them still apply.
fn decode_batch(text: &str) -> Result<Vec<ChatRecord>, serde_json::Error> {
    let values: Vec<serde_json::Value> = serde_json::from_str(text)?;
    Ok(values
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<ChatRecord>(value) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(error = %err, "live: skipping malformed record in batch");
                None
            }
        })
        .collect())
}
