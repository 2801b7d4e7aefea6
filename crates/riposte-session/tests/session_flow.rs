//! Integration tests for the session layer using a mock engine.
//!
//! The mock is a tiny hidden-information game: each seat stashes values
//! into a private pile. The stashing seat sees the value, the other seat
//! only learns that a stash happened. That asymmetry is what the
//! projection tests lean on.

use std::time::Duration;

use riposte_protocol::{JoinToken, PlayerId, SessionId, Slot};
use riposte_session::{
    EngineSession, SessionError, SessionHost, SessionOutbound,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

// =========================================================================
// Mock engine: private piles with per-seat projection.
// =========================================================================

struct VaultGame {
    piles: [Vec<u32>; 2],
}

impl VaultGame {
    fn new() -> Self {
        Self {
            piles: [Vec::new(), Vec::new()],
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
enum VaultCommand {
    Stash { value: u32 },
    Reveal,
    Jam,
}

enum VaultAction {
    Stashed { by: Slot, value: u32 },
    Revealed { by: Slot, total: u32 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
enum VaultNotice {
    YouStashed { value: u32 },
    TheyStashed,
    Revealed { seat: u8, total: u32 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct VaultView {
    seat: u8,
    own_pile: Vec<u32>,
    their_count: usize,
}

impl EngineSession for VaultGame {
    type Command = VaultCommand;
    type Action = VaultAction;
    type Notice = VaultNotice;
    type View = VaultView;

    fn apply(
        &mut self,
        slot: Slot,
        command: VaultCommand,
    ) -> Result<Vec<VaultAction>, SessionError> {
        match command {
            VaultCommand::Stash { value } => {
                self.piles[slot.index()].push(value);
                Ok(vec![VaultAction::Stashed { by: slot, value }])
            }
            VaultCommand::Reveal => {
                let total = self.piles[slot.index()].iter().sum();
                Ok(vec![VaultAction::Revealed { by: slot, total }])
            }
            VaultCommand::Jam => {
                Err(SessionError::EngineApply("vault jammed".into()))
            }
        }
    }

    fn project(&self, action: &VaultAction, viewer: Slot) -> Option<VaultNotice> {
        match action {
            VaultAction::Stashed { by, value } => {
                if *by == viewer {
                    Some(VaultNotice::YouStashed { value: *value })
                } else {
                    Some(VaultNotice::TheyStashed)
                }
            }
            VaultAction::Revealed { by, total } => Some(VaultNotice::Revealed {
                seat: by.as_number(),
                total: *total,
            }),
        }
    }

    fn snapshot(&self, viewer: Slot) -> VaultView {
        VaultView {
            seat: viewer.as_number(),
            own_pile: self.piles[viewer.index()].clone(),
            their_count: self.piles[viewer.other().index()].len(),
        }
    }
}

// =========================================================================
// Helpers
// =========================================================================

fn pid(name: &str) -> PlayerId {
    PlayerId::from(name)
}

fn jt(tag: &str) -> JoinToken {
    JoinToken(format!("jt_{tag}"))
}

fn ses(tag: &str) -> SessionId {
    SessionId(format!("ses_{tag}"))
}

/// Opens one session seating ada (requester) and bo (acceptor).
fn open_default(host: &mut SessionHost<VaultGame>) {
    host.open_session(
        ses("1"),
        VaultGame::new(),
        (jt("ada"), pid("ada")),
        (jt("bo"), pid("bo")),
    )
    .expect("open should succeed");
}

fn seat_channel() -> (
    mpsc::UnboundedSender<SessionOutbound<VaultGame>>,
    mpsc::UnboundedReceiver<SessionOutbound<VaultGame>>,
) {
    mpsc::unbounded_channel()
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

fn expect_snapshot(
    rx: &mut mpsc::UnboundedReceiver<SessionOutbound<VaultGame>>,
) -> VaultView {
    match rx.try_recv() {
        Ok(SessionOutbound::Snapshot(view)) => view,
        Ok(SessionOutbound::Action(_)) => panic!("expected snapshot, got action"),
        Err(_) => panic!("expected snapshot, got nothing"),
    }
}

fn expect_action(
    rx: &mut mpsc::UnboundedReceiver<SessionOutbound<VaultGame>>,
) -> VaultNotice {
    match rx.try_recv() {
        Ok(SessionOutbound::Action(notice)) => notice,
        Ok(SessionOutbound::Snapshot(_)) => panic!("expected action, got snapshot"),
        Err(_) => panic!("expected action, got nothing"),
    }
}

// =========================================================================
// Host bookkeeping
// =========================================================================

#[tokio::test]
async fn test_open_session_duplicate_id_rejected() {
    let mut host = SessionHost::new();
    open_default(&mut host);

    let result = host.open_session(
        ses("1"),
        VaultGame::new(),
        (jt("x"), pid("x")),
        (jt("y"), pid("y")),
    );

    assert!(matches!(result, Err(SessionError::DuplicateSession(_))));
    assert_eq!(host.len(), 1);
}

#[tokio::test]
async fn test_open_session_duplicate_token_leaves_no_trace() {
    let mut host = SessionHost::new();
    open_default(&mut host);

    // jt("bo") is already bound; the whole second open must fail.
    let result = host.open_session(
        ses("2"),
        VaultGame::new(),
        (jt("cy"), pid("cy")),
        (jt("bo"), pid("dee")),
    );

    assert!(matches!(result, Err(SessionError::DuplicateToken)));
    assert_eq!(host.len(), 1);

    // The non-colliding token from the failed pair must not resolve.
    let (tx, _rx) = seat_channel();
    let attach = host.attach(&jt("cy"), tx).await;
    assert!(matches!(attach, Err(SessionError::UnknownToken)));
}

#[tokio::test]
async fn test_attach_unknown_token_rejected() {
    let host: SessionHost<VaultGame> = SessionHost::new();
    let (tx, _rx) = seat_channel();

    let result = host.attach(&jt("ghost"), tx).await;
    assert!(matches!(result, Err(SessionError::UnknownToken)));
}

#[tokio::test]
async fn test_attach_after_close_reports_session_gone() {
    let mut host = SessionHost::new();
    open_default(&mut host);
    host.close_session(&ses("1"));

    // close_session drops the tokens too, so the binding is gone.
    let (tx, _rx) = seat_channel();
    let result = host.attach(&jt("ada"), tx).await;
    assert!(matches!(result, Err(SessionError::UnknownToken)));
    assert!(host.is_empty());
}

// =========================================================================
// Attach and snapshot ordering
// =========================================================================

#[tokio::test]
async fn test_attach_pushes_snapshot_first() {
    let mut host = SessionHost::new();
    open_default(&mut host);

    let (tx, mut rx) = seat_channel();
    let attached = host.attach(&jt("ada"), tx).await.expect("attach");
    assert_eq!(attached.slot, Slot::One);

    settle().await;
    let view = expect_snapshot(&mut rx);
    assert_eq!(view.seat, 1);
    assert!(view.own_pile.is_empty());
}

#[tokio::test]
async fn test_snapshot_reflects_state_and_hides_opponent_pile() {
    let mut host = SessionHost::new();
    open_default(&mut host);

    // Seat one stashes before seat two ever connects.
    let (tx1, mut rx1) = seat_channel();
    let one = host.attach(&jt("ada"), tx1).await.expect("attach one");
    one.handle
        .apply(one.slot, VaultCommand::Stash { value: 7 })
        .await
        .expect("apply");
    settle().await;
    let _ = expect_snapshot(&mut rx1);

    // Seat two's snapshot shows a count, never the values.
    let (tx2, mut rx2) = seat_channel();
    let two = host.attach(&jt("bo"), tx2).await.expect("attach two");
    assert_eq!(two.slot, Slot::Two);

    settle().await;
    let view = expect_snapshot(&mut rx2);
    assert_eq!(view.seat, 2);
    assert!(view.own_pile.is_empty());
    assert_eq!(view.their_count, 1);
}

// =========================================================================
// Command routing and projection
// =========================================================================

#[tokio::test]
async fn test_apply_projects_differently_per_seat() {
    let mut host = SessionHost::new();
    open_default(&mut host);

    let (tx1, mut rx1) = seat_channel();
    let (tx2, mut rx2) = seat_channel();
    let one = host.attach(&jt("ada"), tx1).await.expect("attach one");
    let _two = host.attach(&jt("bo"), tx2).await.expect("attach two");
    settle().await;
    let _ = expect_snapshot(&mut rx1);
    let _ = expect_snapshot(&mut rx2);

    one.handle
        .apply(one.slot, VaultCommand::Stash { value: 4 })
        .await
        .expect("apply");
    settle().await;

    assert_eq!(expect_action(&mut rx1), VaultNotice::YouStashed { value: 4 });
    assert_eq!(expect_action(&mut rx2), VaultNotice::TheyStashed);
}

#[tokio::test]
async fn test_engine_fault_is_isolated_to_the_command() {
    let mut host = SessionHost::new();
    open_default(&mut host);

    let (tx1, mut rx1) = seat_channel();
    let one = host.attach(&jt("ada"), tx1).await.expect("attach");
    settle().await;
    let _ = expect_snapshot(&mut rx1);

    // The jam errors inside the engine; nothing is delivered and the
    // session must keep serving.
    one.handle
        .apply(one.slot, VaultCommand::Jam)
        .await
        .expect("queueing the command itself succeeds");
    settle().await;
    assert!(rx1.try_recv().is_err(), "fault must not produce notices");

    one.handle
        .apply(one.slot, VaultCommand::Stash { value: 9 })
        .await
        .expect("apply after fault");
    settle().await;
    assert_eq!(expect_action(&mut rx1), VaultNotice::YouStashed { value: 9 });
}

// =========================================================================
// Rebind, stale detach, reconnect
// =========================================================================

#[tokio::test]
async fn test_reattach_supersedes_previous_sender() {
    let mut host = SessionHost::new();
    open_default(&mut host);

    let (tx_old, mut rx_old) = seat_channel();
    let old = host.attach(&jt("ada"), tx_old).await.expect("first attach");
    settle().await;
    let _ = expect_snapshot(&mut rx_old);

    // Same token again: the seat rebinds to the new sender.
    let (tx_new, mut rx_new) = seat_channel();
    let new = host.attach(&jt("ada"), tx_new).await.expect("second attach");
    assert_eq!(new.slot, old.slot);
    assert!(new.epoch > old.epoch);

    settle().await;
    let _ = expect_snapshot(&mut rx_new);

    new.handle
        .apply(new.slot, VaultCommand::Stash { value: 2 })
        .await
        .expect("apply");
    settle().await;

    assert_eq!(expect_action(&mut rx_new), VaultNotice::YouStashed { value: 2 });
    assert!(
        rx_old.try_recv().is_err(),
        "superseded sender must receive nothing further"
    );
}

#[tokio::test]
async fn test_stale_detach_does_not_unbind_successor() {
    let mut host = SessionHost::new();
    open_default(&mut host);

    let (tx_old, mut rx_old) = seat_channel();
    let old = host.attach(&jt("ada"), tx_old).await.expect("first attach");
    settle().await;
    let _ = expect_snapshot(&mut rx_old);

    let (tx_new, mut rx_new) = seat_channel();
    let new = host.attach(&jt("ada"), tx_new).await.expect("second attach");
    settle().await;
    let _ = expect_snapshot(&mut rx_new);

    // The superseded connection's cleanup arrives late, quoting its old
    // epoch. It must be a no-op.
    old.handle
        .detach(old.slot, old.epoch)
        .await
        .expect("detach send");
    settle().await;

    new.handle
        .apply(new.slot, VaultCommand::Stash { value: 5 })
        .await
        .expect("apply");
    settle().await;
    assert_eq!(expect_action(&mut rx_new), VaultNotice::YouStashed { value: 5 });
}

#[tokio::test]
async fn test_reconnect_with_same_token_gets_fresh_snapshot() {
    let mut host = SessionHost::new();
    open_default(&mut host);

    let (tx, mut rx) = seat_channel();
    let first = host.attach(&jt("ada"), tx).await.expect("attach");
    first
        .handle
        .apply(first.slot, VaultCommand::Stash { value: 3 })
        .await
        .expect("apply");
    settle().await;
    let _ = expect_snapshot(&mut rx);
    let _ = expect_action(&mut rx);

    // Connection drops; its seat is detached with the current epoch.
    drop(rx);
    first
        .handle
        .detach(first.slot, first.epoch)
        .await
        .expect("detach send");
    settle().await;

    // Presenting the same token again rebinds the seat and replays the
    // full per-seat state.
    let (tx2, mut rx2) = seat_channel();
    let second = host.attach(&jt("ada"), tx2).await.expect("reattach");
    assert_eq!(second.slot, first.slot);

    settle().await;
    let view = expect_snapshot(&mut rx2);
    assert_eq!(view.own_pile, vec![3]);
}

#[tokio::test]
async fn test_detach_leaves_peer_feed_intact() {
    let mut host = SessionHost::new();
    open_default(&mut host);

    let (tx1, mut rx1) = seat_channel();
    let (tx2, mut rx2) = seat_channel();
    let one = host.attach(&jt("ada"), tx1).await.expect("attach one");
    let two = host.attach(&jt("bo"), tx2).await.expect("attach two");
    settle().await;
    let _ = expect_snapshot(&mut rx1);
    let _ = expect_snapshot(&mut rx2);

    // Seat one's connection goes away; the session keeps running.
    one.handle
        .detach(one.slot, one.epoch)
        .await
        .expect("detach send");
    settle().await;

    two.handle
        .apply(two.slot, VaultCommand::Stash { value: 8 })
        .await
        .expect("apply");
    settle().await;

    assert_eq!(expect_action(&mut rx2), VaultNotice::YouStashed { value: 8 });
    assert!(rx1.try_recv().is_err(), "detached seat receives nothing");
}

#[tokio::test]
async fn test_reveal_is_projected_to_both_seats_alike() {
    let mut host = SessionHost::new();
    open_default(&mut host);

    let (tx1, mut rx1) = seat_channel();
    let (tx2, mut rx2) = seat_channel();
    let one = host.attach(&jt("ada"), tx1).await.expect("attach one");
    let _two = host.attach(&jt("bo"), tx2).await.expect("attach two");
    settle().await;
    let _ = expect_snapshot(&mut rx1);
    let _ = expect_snapshot(&mut rx2);

    one.handle
        .apply(one.slot, VaultCommand::Stash { value: 6 })
        .await
        .expect("apply");
    one.handle
        .apply(one.slot, VaultCommand::Reveal)
        .await
        .expect("apply");
    settle().await;

    let _ = expect_action(&mut rx1); // YouStashed
    let _ = expect_action(&mut rx2); // TheyStashed
    let revealed_to_one = expect_action(&mut rx1);
    let revealed_to_two = expect_action(&mut rx2);
    assert_eq!(revealed_to_one, VaultNotice::Revealed { seat: 1, total: 6 });
    assert_eq!(revealed_to_two, revealed_to_one, "reveals are public");
}
