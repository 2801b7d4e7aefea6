//! Transport layer for Riposte.
//!
//! Defines the [`Transport`] and [`Connection`] traits that the server
//! builds on, plus the default WebSocket implementation. Everything above
//! this crate deals in whole binary messages; framing, handshakes, and
//! ping/pong housekeeping stay down here.
//!
//! # Feature Flags
//!
//! - `websocket` (default) — WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;

/// Opaque identifier for one accepted connection.
///
/// Minted by the transport when a connection is accepted; used in logs to
/// correlate everything that happens on that connection before a player
/// identity is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Wraps a raw id value.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Unwraps back to the raw value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type this transport produces.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;
}

/// One accepted connection carrying whole binary messages.
///
/// `send` and `recv` take `&self` and lock independent halves of the
/// underlying stream, so one task can sit in `recv` while another task
/// pushes outbound messages. The server relies on that for its outbound
/// pump.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends one message to the remote peer.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Receives the next message from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Closes the connection.
    async fn close(&self) -> Result<(), Self::Error>;

    /// The identifier minted when this connection was accepted.
    fn id(&self) -> ConnectionId;
}
