//! The session host: every live session and the directory over them.
//!
//! The host is the single entry point the server uses for session work:
//! opening a session when a match is made, and attaching a game
//! connection that shows up with a token. Like the directory it contains,
//! the host is not internally synchronized; the server owns it behind a
//! mutex.

use std::collections::HashMap;

use riposte_protocol::{JoinToken, PlayerId, SessionId, Slot};

use crate::actor::spawn_session;
use crate::{
    SeatSender, SessionDirectory, SessionError, SessionHandle,
    engine::EngineSession,
};

/// Default command channel size for session actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// The result of a successful attach: everything a connection handler
/// needs for the rest of its life.
pub struct Attached<S: EngineSession> {
    /// The session the token resolved to.
    pub session_id: SessionId,
    /// The seat the token is bound to.
    pub slot: Slot,
    /// The binding epoch, quoted back on detach.
    pub epoch: u64,
    /// Handle for routing this connection's commands.
    pub handle: SessionHandle<S>,
}

/// Holds the directory plus a handle to each running session actor.
pub struct SessionHost<S: EngineSession> {
    directory: SessionDirectory,
    live: HashMap<SessionId, SessionHandle<S>>,
}

impl<S: EngineSession> Default for SessionHost<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: EngineSession> SessionHost<S> {
    /// Creates an empty host.
    pub fn new() -> Self {
        Self {
            directory: SessionDirectory::new(),
            live: HashMap::new(),
        }
    }

    /// Registers both tokens and spawns the session actor, all or
    /// nothing: every check runs before anything is inserted, so a
    /// failure leaves no trace.
    ///
    /// `requester` is seated at [`Slot::One`], `acceptor` at
    /// [`Slot::Two`].
    ///
    /// # Errors
    /// - [`SessionError::DuplicateSession`] if the id is already live.
    /// - [`SessionError::DuplicateToken`] if either token is already
    ///   bound.
    pub fn open_session(
        &mut self,
        session_id: SessionId,
        engine: S,
        requester: (JoinToken, PlayerId),
        acceptor: (JoinToken, PlayerId),
    ) -> Result<(), SessionError> {
        if self.live.contains_key(&session_id) {
            return Err(SessionError::DuplicateSession(session_id));
        }
        let (requester_token, requester_player) = requester;
        let (acceptor_token, acceptor_player) = acceptor;
        self.directory
            .register_pair(&session_id, requester_token, acceptor_token)?;

        let handle = spawn_session(
            session_id.clone(),
            engine,
            [requester_player.clone(), acceptor_player.clone()],
            DEFAULT_CHANNEL_SIZE,
        );
        self.live.insert(session_id.clone(), handle);

        tracing::info!(
            %session_id,
            requester = %requester_player,
            acceptor = %acceptor_player,
            "session opened"
        );
        Ok(())
    }

    /// Resolves a token and binds its seat to the given sender.
    ///
    /// The first message the sender receives is the seat's snapshot.
    /// Resolving never consumes the token, so presenting it again later
    /// simply rebinds the seat (reconnect).
    ///
    /// # Errors
    /// - [`SessionError::UnknownToken`] if the token is not bound.
    /// - [`SessionError::SessionGone`] if the session no longer runs.
    pub async fn attach(
        &self,
        token: &JoinToken,
        sender: SeatSender<S>,
    ) -> Result<Attached<S>, SessionError> {
        let binding = self
            .directory
            .resolve(token)
            .ok_or(SessionError::UnknownToken)?;
        let handle = self
            .live
            .get(&binding.session_id)
            .ok_or_else(|| SessionError::SessionGone(binding.session_id.clone()))?
            .clone();

        let ticket = handle.attach(binding.slot, sender).await?;

        Ok(Attached {
            session_id: binding.session_id,
            slot: binding.slot,
            epoch: ticket.epoch,
            handle,
        })
    }

    /// Tears a session down: drops its handle and every token bound to
    /// it. The actor drains its queue and exits once attached
    /// connections let go of their handles.
    pub fn close_session(&mut self, session_id: &SessionId) {
        if self.live.remove(session_id).is_some() {
            self.directory.remove_session(session_id);
            tracing::info!(%session_id, "session closed");
        }
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// True when no sessions are live.
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}
