//! Fanout of lobby events to connected players.
//!
//! The bus is a plain list of subscribers, each a viewer identity plus
//! an unbounded sender. Publishing walks the list in subscription order
//! and hands every subscriber the event narrowed to their viewpoint.
//! Dead receivers are logged and skipped, never pruned here; the
//! connection that owns a subscription unsubscribes it on the way out.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc::UnboundedSender;

use riposte_protocol::PlayerId;

use crate::{LobbyEvent, LobbyNotice};

static NEXT_SUBSCRIPTION_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one subscription for later removal.
///
/// A player connected twice holds two distinct ids; unsubscribing one
/// leaves the other delivering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

struct Subscriber {
    id: SubscriptionId,
    viewer: PlayerId,
    sender: UnboundedSender<LobbyNotice>,
}

/// Delivers scoped lobby notices to every subscriber.
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<Subscriber>,
}

impl EventBus {
    /// Creates a bus with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `sender` to receive notices scoped for `viewer`.
    pub fn subscribe(
        &mut self,
        viewer: PlayerId,
        sender: UnboundedSender<LobbyNotice>,
    ) -> SubscriptionId {
        let id = SubscriptionId(NEXT_SUBSCRIPTION_ID.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(subscription = %id, %viewer, "lobby subscriber added");
        self.subscribers.push(Subscriber { id, viewer, sender });
        id
    }

    /// Removes a subscription. Unknown ids are ignored, so a connection
    /// can unsubscribe on teardown without caring whether it already did.
    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscribers.retain(|s| s.id != id);
    }

    /// Scopes `event` for each subscriber and sends the result, in
    /// subscription order. A closed receiver is skipped with a log line;
    /// delivery to the rest continues.
    pub fn publish(&self, event: &LobbyEvent) {
        for subscriber in &self.subscribers {
            let notice = event.scoped_for(&subscriber.viewer);
            if subscriber.sender.send(notice).is_err() {
                tracing::warn!(
                    subscription = %subscriber.id,
                    viewer = %subscriber.viewer,
                    "lobby subscriber receiver dropped, skipping"
                );
            }
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

// =========================================================================
// Tests
// =========================================================================
