//! Lobby events and their per-viewer projections.
//!
//! The lobby mutates first and publishes second, and what it publishes
//! is a [`LobbyEvent`]: the full, trusted record of what happened. No
//! subscriber ever receives a `LobbyEvent` directly. The bus narrows
//! each event to a [`LobbyNotice`] per viewer via [`LobbyEvent::scoped_for`],
//! and that narrowing is where the lobby's one secret is kept: when a
//! challenge is accepted, only its requester learns a join token exists.

use riposte_protocol::{ChallengeId, ChallengeSummary, JoinToken, PlayerId};

use crate::Challenge;

/// Something that happened to the set of open challenges.
///
/// Carries full data, including fields no subscriber may see wholesale.
#[derive(Debug, Clone)]
pub enum LobbyEvent {
    /// A challenge was opened.
    Opened(Challenge),
    /// A challenge left the board without producing a match.
    Closed(ChallengeId),
    /// A challenge was accepted and a session now exists for it.
    Accepted {
        challenge_id: ChallengeId,
        /// The player whose challenge was taken. Only they receive the
        /// token below.
        requester: PlayerId,
        requester_token: JoinToken,
    },
}

/// What one subscriber actually receives.
#[derive(Debug, Clone, PartialEq)]
pub enum LobbyNotice {
    /// A new challenge is on the board, summarized for this viewer.
    Opened(ChallengeSummary),
    /// A challenge is gone. Sent both for genuine withdrawals and, to
    /// everyone but the requester, for accepts.
    Closed(ChallengeId),
    /// This viewer's own challenge was accepted; the token seats them.
    MatchReady { token: JoinToken },
}

impl LobbyEvent {
    /// Projects this event down to what `viewer` is allowed to see.
    ///
    /// An `Accepted` splits into two shapes. The requester gets
    /// [`LobbyNotice::MatchReady`] carrying their join token; every
    /// other viewer gets a plain [`LobbyNotice::Closed`], byte for byte
    /// the same notice a withdrawal produces. Observers cannot tell an
    /// accepted challenge from a withdrawn one.
    pub fn scoped_for(&self, viewer: &PlayerId) -> LobbyNotice {
        match self {
            LobbyEvent::Opened(challenge) => {
                LobbyNotice::Opened(challenge.summary_for(viewer))
            }
            LobbyEvent::Closed(challenge_id) => {
                LobbyNotice::Closed(challenge_id.clone())
            }
            LobbyEvent::Accepted {
                challenge_id,
                requester,
                requester_token,
            } => {
                if requester == viewer {
                    LobbyNotice::MatchReady {
                        token: requester_token.clone(),
                    }
                } else {
                    LobbyNotice::Closed(challenge_id.clone())
                }
            }
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_challenge(requester: &str) -> Challenge {
        Challenge {
            id: ChallengeId::random(),
            requester: PlayerId::from(requester),
            label: "casual".into(),
            deck: vec!["drake".into()],
            created_at_ms: 1_700_000_000_000,
        }
    }

    #[test]
    fn test_opened_scopes_own_flag_per_viewer() {
        let challenge = sample_challenge("ada");
        let event = LobbyEvent::Opened(challenge.clone());

        let for_ada = event.scoped_for(&PlayerId::from("ada"));
        let for_bo = event.scoped_for(&PlayerId::from("bo"));

        let LobbyNotice::Opened(summary) = for_ada else {
            panic!("requester should see an opened summary");
        };
        assert!(summary.own);
        assert_eq!(summary.challenge_id, challenge.id);

        let LobbyNotice::Opened(summary) = for_bo else {
            panic!("observer should see an opened summary");
        };
        assert!(!summary.own);
    }

    #[test]
    fn test_closed_is_identical_for_everyone() {
        let id = ChallengeId::random();
        let event = LobbyEvent::Closed(id.clone());

        assert_eq!(
            event.scoped_for(&PlayerId::from("ada")),
            LobbyNotice::Closed(id.clone())
        );
        assert_eq!(
            event.scoped_for(&PlayerId::from("bo")),
            LobbyNotice::Closed(id)
        );
    }

    #[test]
    fn test_accepted_gives_token_only_to_requester() {
        let id = ChallengeId::random();
        let token = JoinToken::random();
        let event = LobbyEvent::Accepted {
            challenge_id: id.clone(),
            requester: PlayerId::from("ada"),
            requester_token: token.clone(),
        };

        let for_ada = event.scoped_for(&PlayerId::from("ada"));
        assert_eq!(for_ada, LobbyNotice::MatchReady { token });

        // Everyone else sees a withdrawal-shaped close, nothing more.
        let for_bo = event.scoped_for(&PlayerId::from("bo"));
        assert_eq!(for_bo, LobbyNotice::Closed(id.clone()));

        let for_cy = event.scoped_for(&PlayerId::from("cy"));
        assert_eq!(for_cy, LobbyNotice::Closed(id));
    }

    #[test]
    fn test_accepted_observer_notice_matches_withdrawal_notice() {
        let id = ChallengeId::random();
        let accepted = LobbyEvent::Accepted {
            challenge_id: id.clone(),
            requester: PlayerId::from("ada"),
            requester_token: JoinToken::random(),
        };
        let withdrawn = LobbyEvent::Closed(id);

        let viewer = PlayerId::from("bo");
        assert_eq!(accepted.scoped_for(&viewer), withdrawn.scoped_for(&viewer));
    }
}
