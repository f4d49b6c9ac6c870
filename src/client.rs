use anyhow::Result;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

use crate::config::Config;
use crate::transport::{Inbound, Transport};
use crate::types;

pub(crate) mod consts;
mod stats;
mod utils;

use stats::Stats;
pub use utils::parse_server_event;

/// Frames queued for the writer task.
#[derive(Debug)]
enum Outbound {
    Event(types::ClientEvent),
    Close,
}

type ClientTx = tokio::sync::mpsc::Sender<Outbound>;
type ServerRx = tokio::sync::mpsc::Receiver<Inbound>;

/// A websocket connection to the realtime endpoint.
///
/// The socket is split into a writer task that drains an ordered queue of
/// outbound frames and a reader task that parses inbound frames into
/// [`Inbound`] items. The reader also totals the token usage and logs it on
/// every `response.done`. Dropping the client lets both tasks wind down.
pub struct Client {
    c_tx: ClientTx,
    s_rx: ServerRx,
    close_requested: bool,
}

#[async_trait]
impl Transport for Client {
    async fn send(&mut self, event: types::ClientEvent) -> Result<()> {
        tracing::debug!("sending {}", event.event_type());
        self.c_tx
            .send(Outbound::Event(event))
            .await
            .map_err(|_| anyhow::anyhow!("connection writer has stopped"))
    }

    async fn recv(&mut self) -> Option<Inbound> {
        self.s_rx.recv().await
    }

    async fn close(&mut self) -> Result<()> {
        if self.close_requested {
            return Ok(());
        }
        self.close_requested = true;
        if self.c_tx.send(Outbound::Close).await.is_err() {
            tracing::debug!("close requested after the writer stopped");
        }
        Ok(())
    }
}

/// Open the websocket described by `config`.
pub async fn connect(config: &Config) -> Result<Client> {
    let request = utils::build_request(config)?;

    tracing::info!("connecting to {}", config.url());
    let (ws_stream, _) = tokio_tungstenite::connect_async(request).await?;
    tracing::info!("connection established");

    let (mut write, mut read) = ws_stream.split();

    let (c_tx, mut c_rx) = tokio::sync::mpsc::channel::<Outbound>(config.capacity());
    let (s_tx, s_rx) = tokio::sync::mpsc::channel::<Inbound>(config.capacity());

    tokio::spawn(async move {
        while let Some(outbound) = c_rx.recv().await {
            match outbound {
                Outbound::Event(event) => match serde_json::to_string(&event) {
                    Ok(text) => {
                        if let Err(e) = write.send(Message::Text(text)).await {
                            tracing::error!("failed to send message: {}", e);
                        }
                    }
                    Err(e) => {
                        tracing::error!("failed to serialize event: {}", e);
                    }
                },
                Outbound::Close => {
                    if let Err(e) = write.send(Message::Close(None)).await {
                        tracing::error!("failed to send close frame: {}", e);
                    }
                    break;
                }
            }
        }
    });

    tokio::spawn(async move {
        let mut stats = Stats::new();
        while let Some(message) = read.next().await {
            let message = match message {
                Err(e) => {
                    tracing::error!("failed to read message: {}", e);
                    let _ = s_tx.send(Inbound::TransportError(e.to_string())).await;
                    break;
                }
                Ok(message) => message,
            };
            match message {
                Message::Text(text) => {
                    if let Ok(json) = serde_json::from_str::<serde_json::Value>(&text) {
                        let event_type = json.get("type").and_then(|v| v.as_str());
                        let event_id = json.get("event_id").and_then(|v| v.as_str());
                        tracing::debug!(
                            "received message: {}, id={}",
                            event_type.unwrap_or("unknown"),
                            event_id.unwrap_or("unknown")
                        );
                    }
                    let Some(event) = utils::parse_server_event(&text) else {
                        continue;
                    };
                    if let types::ServerEvent::ResponseDone(ref done) = event {
                        record_usage(&mut stats, done);
                    }
                    if s_tx.send(Inbound::Event(event)).await.is_err() {
                        tracing::debug!("event receiver dropped, stopping reader");
                        break;
                    }
                }
                Message::Binary(bin) => {
                    tracing::warn!("unexpected binary message: {} bytes", bin.len());
                }
                Message::Close(frame) => {
                    tracing::info!("connection closed: {:?}", frame);
                    let close_event = types::ServerEvent::Close {
                        reason: frame.map(|f| format!("{} {}", u16::from(f.code), f.reason)),
                    };
                    let _ = s_tx.send(Inbound::Event(close_event)).await;
                    break;
                }
                _ => {}
            }
        }
    });

    Ok(Client {
        c_tx,
        s_rx,
        close_requested: false,
    })
}

fn record_usage(stats: &mut Stats, done: &types::events::server::ResponseDoneEvent) {
    let Some(usage) = done.response().and_then(|response| response.usage()) else {
        return;
    };
    stats.update_usage(usage.total_tokens(), usage.input_tokens(), usage.output_tokens());
    tracing::info!(
        "token usage: total={}, input={}, output={}",
        stats.total_tokens(),
        stats.input_tokens(),
        stats.output_tokens()
    );
}
