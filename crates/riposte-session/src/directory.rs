//! The session directory: join tokens mapped to seats.
//!
//! When a match is made, each participant gets a token. The directory is
//! how a later game connection turns that token back into "session X,
//! seat Y". Lookups never consume: the same token resolves identically
//! any number of times, which is what makes reconnecting as simple as
//! presenting the token again.
//!
//! # Concurrency note
//!
//! Plain `HashMap`s, no locking. The directory lives inside the session
//! host, which the server keeps behind a mutex; adding interior locks
//! here would only hide the real synchronization point.

use std::collections::HashMap;

use riposte_protocol::{JoinToken, SessionId, Slot};

use crate::SessionError;

/// What a token is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatBinding {
    /// The session the token belongs to.
    pub session_id: SessionId,
    /// The seat within that session.
    pub slot: Slot,
}

/// Maps join tokens to seat bindings.
#[derive(Debug, Default)]
pub struct SessionDirectory {
    bindings: HashMap<JoinToken, SeatBinding>,
}

impl SessionDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds one token to one seat.
    ///
    /// # Errors
    /// [`SessionError::DuplicateToken`] if the token is already bound.
    /// The existing binding is untouched.
    pub fn register(
        &mut self,
        token: JoinToken,
        session_id: SessionId,
        slot: Slot,
    ) -> Result<(), SessionError> {
        if self.bindings.contains_key(&token) {
            return Err(SessionError::DuplicateToken);
        }
        tracing::debug!(%token, %session_id, %slot, "token registered");
        self.bindings.insert(token, SeatBinding { session_id, slot });
        Ok(())
    }

    /// Binds a session's token pair, requester first.
    ///
    /// Both tokens are checked before either is inserted, so a rejected
    /// pair leaves the directory exactly as it was.
    ///
    /// # Errors
    /// [`SessionError::DuplicateToken`] if the tokens collide with each
    /// other or with an existing binding.
    pub fn register_pair(
        &mut self,
        session_id: &SessionId,
        requester_token: JoinToken,
        acceptor_token: JoinToken,
    ) -> Result<(), SessionError> {
        if requester_token == acceptor_token
            || self.bindings.contains_key(&requester_token)
            || self.bindings.contains_key(&acceptor_token)
        {
            return Err(SessionError::DuplicateToken);
        }
        self.bindings.insert(
            requester_token,
            SeatBinding {
                session_id: session_id.clone(),
                slot: Slot::One,
            },
        );
        self.bindings.insert(
            acceptor_token,
            SeatBinding {
                session_id: session_id.clone(),
                slot: Slot::Two,
            },
        );
        tracing::debug!(%session_id, "token pair registered");
        Ok(())
    }

    /// Looks up what a token is bound to. Non-consuming: resolving is
    /// free of side effects no matter how often it happens.
    pub fn resolve(&self, token: &JoinToken) -> Option<SeatBinding> {
        self.bindings.get(token).cloned()
    }

    /// Drops every token bound to the given session.
    pub fn remove_session(&mut self, session_id: &SessionId) {
        self.bindings
            .retain(|_, binding| binding.session_id != *session_id);
    }

    /// Number of bound tokens.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// True when no tokens are bound.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ses(id: &str) -> SessionId {
        SessionId(id.into())
    }

    fn jt(id: &str) -> JoinToken {
        JoinToken(id.into())
    }

    #[test]
    fn test_register_then_resolve_returns_binding() {
        let mut dir = SessionDirectory::new();
        dir.register(jt("jt_a"), ses("ses_1"), Slot::One).unwrap();

        let binding = dir.resolve(&jt("jt_a")).expect("should resolve");
        assert_eq!(binding.session_id, ses("ses_1"));
        assert_eq!(binding.slot, Slot::One);
    }

    #[test]
    fn test_register_duplicate_token_rejected_and_original_kept() {
        let mut dir = SessionDirectory::new();
        dir.register(jt("jt_a"), ses("ses_1"), Slot::One).unwrap();

        let result = dir.register(jt("jt_a"), ses("ses_2"), Slot::Two);
        assert!(matches!(result, Err(SessionError::DuplicateToken)));

        // The original binding survives the rejected attempt.
        let binding = dir.resolve(&jt("jt_a")).unwrap();
        assert_eq!(binding.session_id, ses("ses_1"));
        assert_eq!(binding.slot, Slot::One);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let mut dir = SessionDirectory::new();
        dir.register(jt("jt_a"), ses("ses_1"), Slot::Two).unwrap();

        let first = dir.resolve(&jt("jt_a")).unwrap();
        let second = dir.resolve(&jt("jt_a")).unwrap();
        assert_eq!(first, second);
        assert_eq!(dir.len(), 1, "resolve must not consume");
    }

    #[test]
    fn test_resolve_unknown_token_returns_none() {
        let dir = SessionDirectory::new();
        assert!(dir.resolve(&jt("jt_nope")).is_none());
    }

    #[test]
    fn test_register_pair_maps_requester_to_slot_one() {
        let mut dir = SessionDirectory::new();
        dir.register_pair(&ses("ses_1"), jt("jt_req"), jt("jt_acc"))
            .unwrap();

        assert_eq!(dir.resolve(&jt("jt_req")).unwrap().slot, Slot::One);
        assert_eq!(dir.resolve(&jt("jt_acc")).unwrap().slot, Slot::Two);
    }

    #[test]
    fn test_register_pair_is_all_or_nothing() {
        let mut dir = SessionDirectory::new();
        dir.register(jt("jt_acc"), ses("ses_0"), Slot::One).unwrap();

        // The second token collides, so the first must not be inserted.
        let result =
            dir.register_pair(&ses("ses_1"), jt("jt_req"), jt("jt_acc"));
        assert!(matches!(result, Err(SessionError::DuplicateToken)));
        assert!(dir.resolve(&jt("jt_req")).is_none());
        assert_eq!(dir.len(), 1);
    }

    #[test]
    fn test_register_pair_rejects_equal_tokens() {
        let mut dir = SessionDirectory::new();
        let result = dir.register_pair(&ses("ses_1"), jt("jt_x"), jt("jt_x"));
        assert!(matches!(result, Err(SessionError::DuplicateToken)));
        assert!(dir.is_empty());
    }

    #[test]
    fn test_remove_session_drops_both_tokens() {
        let mut dir = SessionDirectory::new();
        dir.register_pair(&ses("ses_1"), jt("jt_req"), jt("jt_acc"))
            .unwrap();
        dir.register(jt("jt_other"), ses("ses_2"), Slot::One).unwrap();

        dir.remove_session(&ses("ses_1"));

        assert!(dir.resolve(&jt("jt_req")).is_none());
        assert!(dir.resolve(&jt("jt_acc")).is_none());
        assert!(dir.resolve(&jt("jt_other")).is_some(), "other sessions untouched");
    }
}
