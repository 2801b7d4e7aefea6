//! Error types for the lobby layer.
//!
//! Deliberately short. The expected races of a lobby (accepting a
//! challenge that just vanished, accepting your own challenge) are not
//! errors at all; they surface as `None` from the operations involved.

use riposte_protocol::PlayerId;

/// Errors that can occur during lobby operations.
#[derive(Debug, thiserror::Error)]
pub enum LobbyError {
    /// The player already has an open challenge. One at a time.
    #[error("player {0} already has an open challenge")]
    Conflict(PlayerId),

    /// The identity claim presented at the lobby handshake was rejected.
    #[error("authentication failed: {0}")]
    AuthFailed(String),
}
