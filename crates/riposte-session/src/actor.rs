//! Session actor: an isolated Tokio task that owns one engine instance.
//!
//! All engine access funnels through the actor's command channel, which
//! is the whole concurrency story for a session: a command is applied in
//! full, its output delivered, before the next command is looked at. A
//! seat rebind can therefore never interleave with a half-applied
//! command.
//!
//! Each seat holds at most one outbound sender. Attaching to an occupied
//! seat replaces the previous sender (last writer wins) and bumps the
//! seat's epoch; the epoch is what keeps the superseded connection's
//! late cleanup from unbinding its successor.

use riposte_protocol::{PlayerId, SessionId, Slot};
use tokio::sync::{mpsc, oneshot};

use crate::{EngineSession, SessionError};

/// An outbound message from a session actor to one seat's connection.
pub enum SessionOutbound<S: EngineSession> {
    /// Full per-seat state, always the first message after an attach.
    Snapshot(S::View),
    /// One projected engine output.
    Action(S::Notice),
}

/// Channel sender delivering outbound messages to one seat.
pub type SeatSender<S> = mpsc::UnboundedSender<SessionOutbound<S>>;

/// Proof of a completed attach. The epoch identifies this particular
/// binding of the seat; a detach quoting an older epoch is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachTicket {
    /// The seat epoch minted by this attach.
    pub epoch: u64,
}

/// Commands sent to a session actor through its channel.
pub(crate) enum SessionCommand<S: EngineSession> {
    /// Bind a seat to a fresh outbound sender, superseding any previous
    /// one, and push a snapshot.
    Attach {
        slot: Slot,
        sender: SeatSender<S>,
        reply: oneshot::Sender<AttachTicket>,
    },

    /// Unbind a seat, but only if `epoch` still names the current
    /// binding.
    Detach { slot: Slot, epoch: u64 },

    /// Apply one seat-attributed command to the engine.
    Apply { slot: Slot, command: S::Command },
}

/// Handle to a running session actor.
///
/// Cheap to clone; the session host keeps one and every attached
/// connection keeps one. The actor exits once all handles are gone.
pub struct SessionHandle<S: EngineSession> {
    session_id: SessionId,
    sender: mpsc::Sender<SessionCommand<S>>,
}

// Manual impl: a derive would demand S: Clone, which engines need not be.
impl<S: EngineSession> Clone for SessionHandle<S> {
    fn clone(&self) -> Self {
        Self {
            session_id: self.session_id.clone(),
            sender: self.sender.clone(),
        }
    }
}

impl<S: EngineSession> SessionHandle<S> {
    /// Binds a seat to the given sender and returns the attach ticket.
    ///
    /// # Errors
    /// [`SessionError::Unavailable`] if the actor is gone.
    pub async fn attach(
        &self,
        slot: Slot,
        sender: SeatSender<S>,
    ) -> Result<AttachTicket, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::Attach {
                slot,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| SessionError::Unavailable(self.session_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| SessionError::Unavailable(self.session_id.clone()))
    }

    /// Unbinds a seat if `epoch` still names its current binding.
    ///
    /// # Errors
    /// [`SessionError::Unavailable`] if the actor is gone, which callers
    /// running cleanup are free to ignore.
    pub async fn detach(&self, slot: Slot, epoch: u64) -> Result<(), SessionError> {
        self.sender
            .send(SessionCommand::Detach { slot, epoch })
            .await
            .map_err(|_| SessionError::Unavailable(self.session_id.clone()))
    }

    /// Queues one command for the engine (fire-and-forget).
    ///
    /// # Errors
    /// [`SessionError::Unavailable`] if the actor is gone.
    pub async fn apply(
        &self,
        slot: Slot,
        command: S::Command,
    ) -> Result<(), SessionError> {
        self.sender
            .send(SessionCommand::Apply { slot, command })
            .await
            .map_err(|_| SessionError::Unavailable(self.session_id.clone()))
    }
}

/// Per-seat state inside the actor.
struct SeatState<S: EngineSession> {
    player: PlayerId,
    outbound: Option<SeatSender<S>>,
    epoch: u64,
}

/// The session actor. Runs inside a Tokio task until every handle drops.
struct SessionActor<S: EngineSession> {
    session_id: SessionId,
    engine: S,
    seats: [SeatState<S>; 2],
    receiver: mpsc::Receiver<SessionCommand<S>>,
}

impl<S: EngineSession> SessionActor<S> {
    async fn run(mut self) {
        tracing::info!(session_id = %self.session_id, "session actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                SessionCommand::Attach {
                    slot,
                    sender,
                    reply,
                } => {
                    let ticket = self.handle_attach(slot, sender);
                    let _ = reply.send(ticket);
                }
                SessionCommand::Detach { slot, epoch } => {
                    self.handle_detach(slot, epoch);
                }
                SessionCommand::Apply { slot, command } => {
                    self.handle_apply(slot, command);
                }
            }
        }

        tracing::info!(session_id = %self.session_id, "session actor stopped");
    }

    fn handle_attach(&mut self, slot: Slot, sender: SeatSender<S>) -> AttachTicket {
        let epoch = {
            let seat = &mut self.seats[slot.index()];
            seat.epoch += 1;
            let superseded = seat.outbound.replace(sender).is_some();
            if superseded {
                tracing::info!(
                    session_id = %self.session_id,
                    player = %seat.player,
                    %slot,
                    epoch = seat.epoch,
                    "seat rebound, previous connection superseded"
                );
            } else {
                tracing::info!(
                    session_id = %self.session_id,
                    player = %seat.player,
                    %slot,
                    epoch = seat.epoch,
                    "seat bound"
                );
            }
            seat.epoch
        };

        // Snapshot first, before any action can reach the new sender.
        let view = self.engine.snapshot(slot);
        if let Some(tx) = &self.seats[slot.index()].outbound {
            if tx.send(SessionOutbound::Snapshot(view)).is_err() {
                tracing::warn!(
                    session_id = %self.session_id,
                    %slot,
                    "new sender dropped before snapshot delivery"
                );
            }
        }

        AttachTicket { epoch }
    }

    fn handle_detach(&mut self, slot: Slot, epoch: u64) {
        let seat = &mut self.seats[slot.index()];
        if seat.epoch != epoch {
            // A superseded connection cleaning up after its replacement
            // already bound the seat.
            tracing::debug!(
                session_id = %self.session_id,
                %slot,
                stale = epoch,
                current = seat.epoch,
                "stale detach ignored"
            );
            return;
        }
        if seat.outbound.take().is_some() {
            tracing::info!(
                session_id = %self.session_id,
                player = %seat.player,
                %slot,
                "seat unbound"
            );
        }
    }

    fn handle_apply(&mut self, slot: Slot, command: S::Command) {
        let actions = match self.engine.apply(slot, command) {
            Ok(actions) => actions,
            Err(e) => {
                // Scoped to this command; the session plays on.
                tracing::warn!(
                    session_id = %self.session_id,
                    %slot,
                    error = %e,
                    "engine rejected command"
                );
                return;
            }
        };

        for action in &actions {
            for viewer in Slot::BOTH {
                let seat = &self.seats[viewer.index()];
                let Some(tx) = &seat.outbound else { continue };
                let Some(notice) = self.engine.project(action, viewer) else {
                    continue;
                };
                if tx.send(SessionOutbound::Action(notice)).is_err() {
                    tracing::debug!(
                        session_id = %self.session_id,
                        viewer = %viewer,
                        "dropping notice for vanished receiver"
                    );
                }
            }
        }
    }
}

/// Spawns a session actor task and returns a handle to it.
///
/// `players` seats the pair: index 0 takes [`Slot::One`], index 1 takes
/// [`Slot::Two`]. Both seats start unbound.
pub(crate) fn spawn_session<S: EngineSession>(
    session_id: SessionId,
    engine: S,
    players: [PlayerId; 2],
    channel_size: usize,
) -> SessionHandle<S> {
    let (tx, rx) = mpsc::channel(channel_size);

    let [requester, acceptor] = players;
    let actor = SessionActor {
        session_id: session_id.clone(),
        engine,
        seats: [
            SeatState {
                player: requester,
                outbound: None,
                epoch: 0,
            },
            SeatState {
                player: acceptor,
                outbound: None,
                epoch: 0,
            },
        ],
        receiver: rx,
    };

    tokio::spawn(actor.run());

    SessionHandle {
        session_id,
        sender: tx,
    }
}
