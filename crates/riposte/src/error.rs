//! Unified error type for the Riposte server.

use riposte_lobby::LobbyError;
use riposte_protocol::ProtocolError;
use riposte_session::SessionError;
use riposte_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// Code using the `riposte` meta-crate deals with this single type
/// instead of importing errors from each sub-crate. The `#[from]`
/// attribute gives each variant a `From` impl, so `?` converts
/// sub-crate errors on the way up.
#[derive(Debug, thiserror::Error)]
pub enum RiposteError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid frame).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A lobby-level error (challenge conflict, failed auth).
    #[error(transparent)]
    Lobby(#[from] LobbyError),

    /// A session-level error (bad token, engine fault, session gone).
    #[error(transparent)]
    Session(#[from] SessionError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::Send(std::io::Error::other("gone"));
        let riposte_err: RiposteError = err.into();
        assert!(matches!(riposte_err, RiposteError::Transport(_)));
        assert!(riposte_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let riposte_err: RiposteError = err.into();
        assert!(matches!(riposte_err, RiposteError::Protocol(_)));
    }

    #[test]
    fn test_from_lobby_error() {
        let err = LobbyError::AuthFailed("nope".into());
        let riposte_err: RiposteError = err.into();
        assert!(matches!(riposte_err, RiposteError::Lobby(_)));
    }

    #[test]
    fn test_from_session_error() {
        let err = SessionError::UnknownToken;
        let riposte_err: RiposteError = err.into();
        assert!(matches!(riposte_err, RiposteError::Session(_)));
    }
}
