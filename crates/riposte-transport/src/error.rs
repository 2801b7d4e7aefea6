//! Error types for the transport layer.

/// Errors produced while binding, accepting, or moving bytes.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Binding the listener failed (port taken, permission denied).
    #[error("bind failed: {0}")]
    Bind(#[source] std::io::Error),

    /// Accepting an incoming connection failed, either at the TCP level
    /// or during the WebSocket upgrade.
    #[error("accept failed: {0}")]
    Accept(#[source] std::io::Error),

    /// Sending a message failed; the peer is usually gone.
    #[error("send failed: {0}")]
    Send(#[source] std::io::Error),

    /// Receiving a message failed mid-stream.
    #[error("receive failed: {0}")]
    Receive(#[source] std::io::Error),
}
