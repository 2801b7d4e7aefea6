//! Error types for the session layer.

use riposte_protocol::SessionId;

/// Errors that can occur while creating, joining, or driving a session.
///
/// The engine variants matter most to callers: [`EngineCreation`] means a
/// match could not be made and the accepted challenge must stay open,
/// while [`EngineApply`] is a per-command fault that the session actor
/// absorbs without ending anything.
///
/// [`EngineCreation`]: SessionError::EngineCreation
/// [`EngineApply`]: SessionError::EngineApply
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The engine factory could not build a session (bad deck, internal
    /// engine fault). Whatever triggered the creation is rolled back.
    #[error("engine creation failed: {0}")]
    EngineCreation(String),

    /// The engine rejected or failed on one command. Scoped to that
    /// command; the session keeps running.
    #[error("engine rejected command: {0}")]
    EngineApply(String),

    /// The presented join token is not bound to any seat.
    #[error("unknown join token")]
    UnknownToken,

    /// The token resolved but the session it belongs to no longer runs.
    #[error("session {0} is gone")]
    SessionGone(SessionId),

    /// The token is already bound to a seat. With 128-bit tokens this is
    /// an RNG failure, not a coincidence, so it is surfaced loudly.
    #[error("join token already registered")]
    DuplicateToken,

    /// A session with this id is already live.
    #[error("session {0} already registered")]
    DuplicateSession(SessionId),

    /// The session's command channel is closed or gone.
    #[error("session {0} is unavailable")]
    Unavailable(SessionId),
}
