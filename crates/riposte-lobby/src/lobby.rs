//! The lobby facade: one mutable surface over registry and bus.
//!
//! Everything that changes the set of open challenges goes through this
//! type, which keeps one ordering promise: mutate the registry first,
//! publish to the bus second. A subscriber reacting to a notice by
//! calling back in always observes the post-event state.

use tokio::sync::mpsc::UnboundedSender;

use riposte_protocol::{ChallengeId, ChallengeSummary, JoinToken, PlayerId};

use crate::{
    Challenge, ChallengeRegistry, EventBus, LobbyError, LobbyEvent, LobbyNotice,
    SubscriptionId,
};

/// Open challenges plus the subscribers watching them.
#[derive(Default)]
pub struct Lobby {
    registry: ChallengeRegistry,
    bus: EventBus,
}

impl Lobby {
    /// Creates an empty lobby.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a challenge and announces it to every subscriber.
    ///
    /// # Errors
    /// [`LobbyError::Conflict`] if the requester already has one open.
    /// Nothing is published on conflict.
    pub fn open(
        &mut self,
        requester: PlayerId,
        label: String,
        deck: Vec<String>,
    ) -> Result<ChallengeId, LobbyError> {
        let challenge = self.registry.open(requester, label, deck)?;
        let id = challenge.id.clone();
        self.bus.publish(&LobbyEvent::Opened(challenge));
        Ok(id)
    }

    /// Withdraws the requester's challenge. Publishes a close only when
    /// something was actually removed; closing nothing is silent.
    pub fn close(&mut self, requester: &PlayerId) -> Option<ChallengeId> {
        let closed = self.registry.close(requester)?;
        self.bus.publish(&LobbyEvent::Closed(closed.id.clone()));
        Some(closed.id)
    }

    /// All open challenges summarized for `viewer`, in listing order.
    pub fn list_for(&self, viewer: &PlayerId) -> Vec<ChallengeSummary> {
        self.registry
            .list()
            .into_iter()
            .map(|c| c.summary_for(viewer))
            .collect()
    }

    /// Looks up a challenge by id without removing it.
    pub fn find(&self, challenge_id: &ChallengeId) -> Option<&Challenge> {
        self.registry.find(challenge_id)
    }

    /// True when the requester currently has an open challenge.
    pub fn has_open_challenge(&self, requester: &PlayerId) -> bool {
        self.registry.has_open_challenge(requester)
    }

    /// Registers `sender` to receive notices scoped for `viewer`.
    pub fn subscribe(
        &mut self,
        viewer: PlayerId,
        sender: UnboundedSender<LobbyNotice>,
    ) -> SubscriptionId {
        self.bus.subscribe(viewer, sender)
    }

    /// Removes a subscription. Unknown ids are ignored.
    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.bus.unsubscribe(id);
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.bus.subscriber_count()
    }

    /// Consuming lookup for an accept. No event is published here; the
    /// resolver announces the accept itself once the session exists.
    pub(crate) fn take(&mut self, challenge_id: &ChallengeId) -> Option<Challenge> {
        self.registry.take(challenge_id)
    }

    /// Publishes the accept of an already-removed challenge. The
    /// requester's notice carries their join token; everyone else sees
    /// an ordinary close.
    pub(crate) fn announce_accepted(
        &self,
        challenge_id: ChallengeId,
        requester: PlayerId,
        requester_token: JoinToken,
    ) {
        self.bus.publish(&LobbyEvent::Accepted {
            challenge_id,
            requester,
            requester_token,
        });
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn pid(name: &str) -> PlayerId {
        PlayerId::from(name)
    }

    fn deck() -> Vec<String> {
        vec!["drake".into()]
    }

    #[test]
    fn test_open_publishes_to_subscribers() {
        let mut lobby = Lobby::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        lobby.subscribe(pid("bo"), tx);

        let id = lobby.open(pid("ada"), "casual".into(), deck()).unwrap();

        let LobbyNotice::Opened(summary) = rx.try_recv().unwrap() else {
            panic!("expected an opened notice");
        };
        assert_eq!(summary.challenge_id, id);
        assert!(!summary.own);
    }

    #[test]
    fn test_open_conflict_publishes_nothing() {
        let mut lobby = Lobby::new();
        lobby.open(pid("ada"), "casual".into(), deck()).unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        lobby.subscribe(pid("bo"), tx);

        assert!(lobby.open(pid("ada"), "again".into(), deck()).is_err());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_close_publishes_only_when_something_closed() {
        let mut lobby = Lobby::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        lobby.subscribe(pid("bo"), tx);

        assert!(lobby.close(&pid("ada")).is_none());
        assert!(rx.try_recv().is_err(), "no close notice for a no-op");

        let id = lobby.open(pid("ada"), "casual".into(), deck()).unwrap();
        rx.try_recv().unwrap();

        assert_eq!(lobby.close(&pid("ada")), Some(id.clone()));
        assert_eq!(rx.try_recv().unwrap(), LobbyNotice::Closed(id));
    }

    #[test]
    fn test_list_for_flags_own_challenges() {
        let mut lobby = Lobby::new();
        lobby.open(pid("ada"), "a".into(), deck()).unwrap();
        lobby.open(pid("bo"), "b".into(), deck()).unwrap();

        let ada_view = lobby.list_for(&pid("ada"));
        assert_eq!(ada_view.len(), 2);
        assert_eq!(ada_view.iter().filter(|s| s.own).count(), 1);

        let cy_view = lobby.list_for(&pid("cy"));
        assert!(cy_view.iter().all(|s| !s.own));
    }

    #[test]
    fn test_take_does_not_publish() {
        let mut lobby = Lobby::new();
        let id = lobby.open(pid("ada"), "casual".into(), deck()).unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        lobby.subscribe(pid("bo"), tx);

        let taken = lobby.take(&id).expect("challenge present");
        assert_eq!(taken.id, id);
        assert!(rx.try_recv().is_err(), "take alone announces nothing");
    }
}
