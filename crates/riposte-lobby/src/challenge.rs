//! Open challenges and the registry that holds them.
//!
//! A challenge is an offer to play: "here I am, here is my deck, someone
//! take me on". The registry enforces the single structural rule of the
//! lobby: a player has at most one challenge open at a time. That rule
//! is not checked, it is the data layout; challenges are keyed by their
//! requester.

use std::collections::HashMap;

use riposte_protocol::{ChallengeId, ChallengeSummary, PlayerId};

use crate::LobbyError;

/// The full server-side record of an open challenge.
///
/// Contains strictly more than anyone browsing the lobby gets to see.
/// `deck` is revealed only to the engine factory when the challenge is
/// accepted; `requester` never crosses the wire at all (subscribers
/// learn "own or not own" per viewer, nothing more).
#[derive(Debug, Clone)]
pub struct Challenge {
    /// Unguessable id, minted at open.
    pub id: ChallengeId,
    /// Who opened it. Seated at slot one when the match is made.
    pub requester: PlayerId,
    /// Free-form text shown in listings.
    pub label: String,
    /// The requester's hidden setup payload.
    pub deck: Vec<String>,
    /// Wall-clock open time, milliseconds since the Unix epoch.
    pub created_at_ms: u64,
}

impl Challenge {
    /// The public projection of this challenge as one viewer sees it.
    pub fn summary_for(&self, viewer: &PlayerId) -> ChallengeSummary {
        ChallengeSummary {
            challenge_id: self.id.clone(),
            label: self.label.clone(),
            created_at_ms: self.created_at_ms,
            own: self.requester == *viewer,
        }
    }
}

/// All currently open challenges, keyed by requester.
#[derive(Debug, Default)]
pub struct ChallengeRegistry {
    open: HashMap<PlayerId, Challenge>,
}

impl ChallengeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a challenge for `requester`.
    ///
    /// # Errors
    /// [`LobbyError::Conflict`] if the requester already has one open;
    /// the existing challenge is untouched.
    pub fn open(
        &mut self,
        requester: PlayerId,
        label: String,
        deck: Vec<String>,
    ) -> Result<Challenge, LobbyError> {
        if self.open.contains_key(&requester) {
            return Err(LobbyError::Conflict(requester));
        }

        let challenge = Challenge {
            id: ChallengeId::random(),
            requester: requester.clone(),
            label,
            deck,
            created_at_ms: now_ms(),
        };
        tracing::info!(
            challenge_id = %challenge.id,
            %requester,
            "challenge opened"
        );
        self.open.insert(requester, challenge.clone());
        Ok(challenge)
    }

    /// Withdraws the requester's challenge, if any. Idempotent: closing
    /// nothing returns `None` and is not an error.
    pub fn close(&mut self, requester: &PlayerId) -> Option<Challenge> {
        let closed = self.open.remove(requester)?;
        tracing::info!(
            challenge_id = %closed.id,
            %requester,
            "challenge closed"
        );
        Some(closed)
    }

    /// Removes and returns a challenge by id. This is the consuming
    /// lookup an accept uses: of two racing accepts, exactly one gets
    /// `Some`.
    pub fn take(&mut self, challenge_id: &ChallengeId) -> Option<Challenge> {
        let requester = self
            .open
            .iter()
            .find(|(_, c)| c.id == *challenge_id)
            .map(|(requester, _)| requester.clone())?;
        self.open.remove(&requester)
    }

    /// Looks up a challenge by id without removing it.
    pub fn find(&self, challenge_id: &ChallengeId) -> Option<&Challenge> {
        self.open.values().find(|c| c.id == *challenge_id)
    }

    /// All open challenges, ordered by `(created_at_ms, id)` so repeated
    /// listings are stable even under equal timestamps.
    pub fn list(&self) -> Vec<&Challenge> {
        let mut challenges: Vec<&Challenge> = self.open.values().collect();
        challenges.sort_by(|a, b| {
            (a.created_at_ms, &a.id).cmp(&(b.created_at_ms, &b.id))
        });
        challenges
    }

    /// True when the requester currently has an open challenge.
    pub fn has_open_challenge(&self, requester: &PlayerId) -> bool {
        self.open.contains_key(requester)
    }

    /// Number of open challenges.
    pub fn len(&self) -> usize {
        self.open.len()
    }

    /// True when no challenges are open.
    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }
}

/// Wall clock in milliseconds since the Unix epoch.
fn now_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// =========================================================================
// Tests
// =========================================================================
