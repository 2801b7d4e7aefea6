//! The accept protocol, from challenge to running session.
//!
//! Accepting is the one operation that spans lobby and session state,
//! and its ordering is what makes racing accepts safe. The resolver
//! checks everything first, builds the session next, and removes the
//! challenge last, so a failure at any step leaves the challenge open
//! and the loser of a race finds the board already cleared.

use riposte_protocol::{ChallengeId, JoinToken, PlayerId, SessionId};
use riposte_session::{EngineFactory, SessionError, SessionHost};

use crate::Lobby;

/// What a successful accept hands back to the acceptor's connection.
#[derive(Debug, Clone)]
pub struct AcceptedMatch {
    /// The session the factory created.
    pub session_id: SessionId,
    /// The acceptor's join token, returned on the accepting connection.
    /// The requester's token travels through the lobby bus instead.
    pub token: JoinToken,
}

/// Turns an accepted challenge into a live session.
pub struct MatchResolver<F: EngineFactory> {
    factory: F,
}

impl<F: EngineFactory> MatchResolver<F> {
    /// Wraps the factory used for every match.
    pub fn new(factory: F) -> Self {
        Self { factory }
    }

    /// Accepts `challenge_id` on behalf of `acceptor`.
    ///
    /// Returns `Ok(None)` when there is no challenge to accept: the id
    /// is unknown (already taken, withdrawn, or never real) or the
    /// acceptor is its own requester. Both are ordinary outcomes of
    /// concurrent lobbies, not faults, and both leave every piece of
    /// state untouched.
    ///
    /// The caller must hold both the lobby and the host for the whole
    /// call. Step order is load-bearing:
    ///
    /// 1. look the challenge up, checks only;
    /// 2. build the engine and register the session, both tokens minted
    ///    here;
    /// 3. only then remove the challenge and announce the accept.
    ///
    /// # Errors
    /// [`SessionError`] from the factory or the host. The challenge is
    /// still open afterwards and may be accepted again.
    pub fn accept(
        &self,
        lobby: &mut Lobby,
        host: &mut SessionHost<F::Session>,
        challenge_id: &ChallengeId,
        acceptor: &PlayerId,
        acceptor_deck: Vec<String>,
    ) -> Result<Option<AcceptedMatch>, SessionError> {
        let Some(challenge) = lobby.find(challenge_id) else {
            tracing::debug!(%challenge_id, %acceptor, "accept of unknown challenge");
            return Ok(None);
        };
        if challenge.requester == *acceptor {
            tracing::debug!(%challenge_id, %acceptor, "player tried to accept own challenge");
            return Ok(None);
        }
        let requester = challenge.requester.clone();
        let requester_deck = challenge.deck.clone();

        let (engine, session_id) =
            self.factory.create_session(&requester_deck, acceptor_deck.as_slice())?;

        let requester_token = JoinToken::random();
        let acceptor_token = JoinToken::random();
        host.open_session(
            session_id.clone(),
            engine,
            (requester_token.clone(), requester.clone()),
            (acceptor_token.clone(), acceptor.clone()),
        )?;

        // Commit point. From here the challenge is gone and both sides
        // learn about the match.
        let _ = lobby.take(challenge_id);
        lobby.announce_accepted(challenge_id.clone(), requester.clone(), requester_token);

        tracing::info!(
            %challenge_id,
            %session_id,
            %requester,
            %acceptor,
            "match made"
        );
        Ok(Some(AcceptedMatch {
            session_id,
            token: acceptor_token,
        }))
    }
}

// =========================================================================
// Tests
// =========================================================================
