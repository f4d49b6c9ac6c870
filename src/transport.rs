use anyhow::Result;
use async_trait::async_trait;

use crate::types::{ClientEvent, ServerEvent};

/// One item pulled from the inbound side of a connection.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// A parsed server frame.
    Event(ServerEvent),
    /// The connection failed underneath the protocol (network, TLS, handshake).
    /// The stream ends after this item.
    TransportError(String),
}

/// An open, bidirectional realtime connection.
///
/// Outbound frames are delivered in the order they are sent. `recv` yields
/// inbound items one at a time and returns `None` once the connection has
/// ended.
#[async_trait]
pub trait Transport: Send {
    /// Queues one frame for sending. Does not wait for any acknowledgement.
    async fn send(&mut self, event: ClientEvent) -> Result<()>;

    /// Waits for the next inbound item.
    async fn recv(&mut self) -> Option<Inbound>;

    /// Starts the closing handshake.
    async fn close(&mut self) -> Result<()>;
}
