//! The engine seam: the two traits a game implements.
//!
//! Riposte never interprets game rules. It hands seat-attributed commands
//! to an [`EngineSession`] and fans the resulting actions back out, asking
//! the engine how each seat is allowed to see them. Hidden information
//! (an opponent's hand, face-down cards) lives entirely behind
//! [`EngineSession::project`] and [`EngineSession::snapshot`].

use riposte_protocol::{SessionId, Slot};
use serde::{Serialize, de::DeserializeOwned};

use crate::SessionError;

/// One authoritative game instance, owned by its session actor.
///
/// The actor serializes all access, so implementations are plain mutable
/// state machines: no locks, no interior mutability, no async.
///
/// # Associated types
///
/// - `Command` — what a seated player may ask for ("play card 3").
/// - `Action` — what actually happened inside the engine, with full
///   information. Never leaves the server as-is.
/// - `Notice` — one action as one seat is allowed to see it.
/// - `View` — the full state as one seat is allowed to see it.
pub trait EngineSession: Send + 'static {
    /// Inbound command type, decoded from a game connection.
    type Command: Send + Serialize + DeserializeOwned;

    /// Full-information record of something the engine did.
    type Action: Send;

    /// Per-seat projection of an action, pushed to that seat's connection.
    type Notice: Send + Serialize + DeserializeOwned;

    /// Per-seat projection of the whole state, pushed on (re)connect.
    type View: Send + Serialize + DeserializeOwned;

    /// Applies one command for the given seat and returns everything it
    /// caused, in order.
    ///
    /// # Errors
    /// [`SessionError::EngineApply`] when the command is illegal or the
    /// engine faults on it. The session actor logs the error and moves
    /// on; state must be left as if the command never arrived.
    fn apply(
        &mut self,
        slot: Slot,
        command: Self::Command,
    ) -> Result<Vec<Self::Action>, SessionError>;

    /// Reshapes one action for one viewer.
    ///
    /// `None` hides the action from that seat entirely. Returning
    /// different notices per seat is how hidden information stays hidden:
    /// the owner of a drawn card sees the card, the opponent sees only
    /// that a draw happened.
    fn project(&self, action: &Self::Action, viewer: Slot) -> Option<Self::Notice>;

    /// The full state as the viewer is allowed to see it. Sent as the
    /// first push whenever a seat binds, including rebinds.
    fn snapshot(&self, viewer: Slot) -> Self::View;
}

/// Builds engine instances when a match is made.
///
/// Shared by every accept that the server processes, hence `Sync`.
pub trait EngineFactory: Send + Sync + 'static {
    /// The engine type this factory produces.
    type Session: EngineSession;

    /// Creates a fresh engine from both players' setup payloads.
    ///
    /// `requester_deck` belongs to [`Slot::One`], `acceptor_deck` to
    /// [`Slot::Two`]. The factory also names the session: engines with
    /// their own id scheme return it here, everyone else reaches for
    /// [`SessionId::random`].
    ///
    /// # Errors
    /// [`SessionError::EngineCreation`] when no session can be built from
    /// these decks. The caller treats that as "the match never happened".
    fn create_session(
        &self,
        requester_deck: &[String],
        acceptor_deck: &[String],
    ) -> Result<(Self::Session, SessionId), SessionError>;
}
