//! Per-connection handler: hello dispatch, lobby service, game bridging.
//!
//! Every accepted connection gets its own Tokio task running
//! [`handle_connection`]. The first frame decides what the connection
//! is for:
//!
//!   - `LobbyHello` → authenticate, subscribe, then serve the challenge
//!     board until the connection closes or a match is made.
//!   - `GameHello` → resolve the join token, bind the seat, then relay
//!     between the socket and the session actor until one side ends.
//!
//! A lobby connection that produced a match is closed by the server
//! right after the token frame: the client's next move is a game
//! connection presenting that token.

use std::sync::Arc;
use std::time::Duration;

use riposte_lobby::{Authenticator, LobbyNotice};
use riposte_protocol::{
    ChallengeId, ClientFrame, Codec, GamePush, JoinToken, LobbyPush, PROTOCOL_VERSION,
    PlayerId, ProtocolError,
};
use riposte_session::{EngineFactory, EngineSession, SessionHandle, SessionOutbound};
use riposte_transport::{Connection, WebSocketConnection};

use crate::RiposteError;
use crate::server::ServerState;

/// How long a fresh connection has to present its hello frame.
const HELLO_TIMEOUT: Duration = Duration::from_secs(5);

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<F, A, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<F, A, C>>,
) -> Result<(), RiposteError>
where
    F: EngineFactory,
    A: Authenticator,
    C: Codec,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let data = match tokio::time::timeout(HELLO_TIMEOUT, conn.recv()).await {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => return Ok(()),
        Ok(Err(e)) => return Err(RiposteError::Transport(e)),
        Err(_) => {
            return Err(RiposteError::Protocol(ProtocolError::InvalidMessage(
                "hello timed out".into(),
            )));
        }
    };
    let frame: ClientFrame = state.codec.decode(&data)?;

    match frame {
        ClientFrame::LobbyHello { version, player } => {
            if version != PROTOCOL_VERSION {
                let push = LobbyPush::Rejected {
                    reason: format!(
                        "unsupported protocol version {version}, server speaks {PROTOCOL_VERSION}"
                    ),
                };
                send_lobby_push(&conn, &state.codec, &push).await?;
                let _ = conn.close().await;
                return Err(RiposteError::Protocol(ProtocolError::InvalidMessage(
                    "protocol version mismatch".into(),
                )));
            }

            let player = match state.auth.authenticate(&player).await {
                Ok(player) => player,
                Err(e) => {
                    tracing::info!(%conn_id, error = %e, "lobby hello rejected");
                    let push = LobbyPush::Rejected {
                        reason: "authentication failed".into(),
                    };
                    send_lobby_push(&conn, &state.codec, &push).await?;
                    let _ = conn.close().await;
                    return Err(RiposteError::Lobby(e));
                }
            };

            tracing::info!(%conn_id, %player, "lobby connection authenticated");
            serve_lobby(conn, state, player).await
        }

        ClientFrame::GameHello { version, token } => {
            if version != PROTOCOL_VERSION {
                send_game_denied::<F::Session, C>(
                    &conn,
                    &state.codec,
                    "unsupported protocol version",
                )
                .await?;
                let _ = conn.close().await;
                return Err(RiposteError::Protocol(ProtocolError::InvalidMessage(
                    "protocol version mismatch".into(),
                )));
            }

            serve_game(conn, state, token).await
        }

        _ => {
            let push = LobbyPush::Rejected {
                reason: "first frame must be LobbyHello or GameHello".into(),
            };
            send_lobby_push(&conn, &state.codec, &push).await?;
            let _ = conn.close().await;
            Err(RiposteError::Protocol(ProtocolError::InvalidMessage(
                "first frame must be a hello".into(),
            )))
        }
    }
}

// =========================================================================
// Lobby connections
// =========================================================================

/// Drop guard for a lobby connection: unsubscribes from the bus and
/// withdraws the challenge this connection opened, if it is still on
/// the board. Since `Drop` is synchronous, the async lock work runs in
/// a fire-and-forget task.
struct LobbyGuard<F: EngineFactory, A: Authenticator, C: Codec> {
    player: PlayerId,
    subscription: riposte_lobby::SubscriptionId,
    /// The challenge this connection opened, if any. Checked against
    /// the board at drop time: an accepted or already-withdrawn
    /// challenge is gone and must not shadow a newer one the player
    /// opened from a fresh connection.
    opened: Option<ChallengeId>,
    state: Arc<ServerState<F, A, C>>,
}

impl<F: EngineFactory, A: Authenticator, C: Codec> Drop for LobbyGuard<F, A, C> {
    fn drop(&mut self) {
        let player = self.player.clone();
        let subscription = self.subscription;
        let opened = self.opened.take();
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let mut lobby = state.lobby.lock().await;
            lobby.unsubscribe(subscription);
            if let Some(challenge_id) = opened {
                // Ids are never reused, so a hit here can only be the
                // challenge this connection opened.
                if lobby.find(&challenge_id).is_some() {
                    tracing::info!(%player, %challenge_id, "withdrawing challenge on disconnect");
                    lobby.close(&player);
                }
            }
        });
    }
}

/// Serves an authenticated lobby connection until it closes.
async fn serve_lobby<F, A, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<F, A, C>>,
    player: PlayerId,
) -> Result<(), RiposteError>
where
    F: EngineFactory,
    A: Authenticator,
    C: Codec,
{
    let (notice_tx, mut notice_rx) = tokio::sync::mpsc::unbounded_channel();

    // Subscribe and read the board under one lock, so no challenge can
    // slip between the initial list and the first notice.
    let (subscription, board) = {
        let mut lobby = state.lobby.lock().await;
        let subscription = lobby.subscribe(player.clone(), notice_tx);
        (subscription, lobby.list_for(&player))
    };
    let mut guard = LobbyGuard {
        player: player.clone(),
        subscription,
        opened: None,
        state: Arc::clone(&state),
    };

    let push = LobbyPush::Challenges { challenges: board };
    send_lobby_push(&conn, &state.codec, &push).await?;

    loop {
        tokio::select! {
            notice = notice_rx.recv() => {
                let Some(notice) = notice else {
                    tracing::debug!(%player, "lobby notice channel ended");
                    break;
                };
                let push = notice_to_push(notice);
                let match_made = matches!(push, LobbyPush::MatchReady { .. });
                send_lobby_push(&conn, &state.codec, &push).await?;
                if match_made {
                    // Their challenge was taken; the token frame is the
                    // last thing this connection carries.
                    tracing::info!(%player, "match ready, closing lobby connection");
                    let _ = conn.close().await;
                    break;
                }
            }

            incoming = conn.recv() => {
                let data = match incoming {
                    Ok(Some(data)) => data,
                    Ok(None) => {
                        tracing::info!(%player, "lobby connection closed");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%player, error = %e, "lobby recv error");
                        break;
                    }
                };

                let frame: ClientFrame = match state.codec.decode(&data) {
                    Ok(frame) => frame,
                    Err(e) => {
                        tracing::debug!(%player, error = %e, "undecodable lobby frame");
                        let push = LobbyPush::Rejected {
                            reason: format!("unreadable frame: {e}"),
                        };
                        send_lobby_push(&conn, &state.codec, &push).await?;
                        continue;
                    }
                };

                if handle_lobby_frame(&conn, &state, &player, frame, &mut guard).await? {
                    break;
                }
            }
        }
    }

    // guard drops here: unsubscribe, withdraw-on-disconnect.
    Ok(())
}

/// Handles one lobby frame. Returns `true` when the connection should
/// close.
async fn handle_lobby_frame<F, A, C>(
    conn: &WebSocketConnection,
    state: &Arc<ServerState<F, A, C>>,
    player: &PlayerId,
    frame: ClientFrame,
    guard: &mut LobbyGuard<F, A, C>,
) -> Result<bool, RiposteError>
where
    F: EngineFactory,
    A: Authenticator,
    C: Codec,
{
    match frame {
        ClientFrame::Open { label, deck } => {
            let result = {
                let mut lobby = state.lobby.lock().await;
                lobby.open(player.clone(), label, deck)
            };
            match result {
                Ok(challenge_id) => {
                    // The ChallengeOpened push arrives through this
                    // player's own subscription, like everyone else's.
                    guard.opened = Some(challenge_id);
                }
                Err(e) => {
                    let push = LobbyPush::Rejected {
                        reason: e.to_string(),
                    };
                    send_lobby_push(conn, &state.codec, &push).await?;
                }
            }
        }

        ClientFrame::Close => {
            state.lobby.lock().await.close(player);
            guard.opened = None;
        }

        ClientFrame::List => {
            let board = state.lobby.lock().await.list_for(player);
            let push = LobbyPush::Challenges { challenges: board };
            send_lobby_push(conn, &state.codec, &push).await?;
        }

        ClientFrame::Accept { challenge_id, deck } => {
            // Lock order: lobby first, then sessions, both held across
            // the whole accept so racing accepts serialize.
            let result = {
                let mut lobby = state.lobby.lock().await;
                let mut sessions = state.sessions.lock().await;
                state
                    .resolver
                    .accept(&mut lobby, &mut sessions, &challenge_id, player, deck)
            };
            match result {
                Ok(Some(accepted)) => {
                    let push = LobbyPush::MatchReady {
                        token: accepted.token,
                    };
                    send_lobby_push(conn, &state.codec, &push).await?;
                    tracing::info!(
                        %player,
                        session_id = %accepted.session_id,
                        "acceptor seated, closing lobby connection"
                    );
                    let _ = conn.close().await;
                    return Ok(true);
                }
                Ok(None) => {
                    let push = LobbyPush::Rejected {
                        reason: "challenge unavailable".into(),
                    };
                    send_lobby_push(conn, &state.codec, &push).await?;
                }
                Err(e) => {
                    tracing::warn!(%player, %challenge_id, error = %e, "accept failed");
                    let push = LobbyPush::Rejected {
                        reason: e.to_string(),
                    };
                    send_lobby_push(conn, &state.codec, &push).await?;
                }
            }
        }

        ClientFrame::LobbyHello { .. } | ClientFrame::GameHello { .. } => {
            let push = LobbyPush::Rejected {
                reason: "connection already established".into(),
            };
            send_lobby_push(conn, &state.codec, &push).await?;
        }
    }

    Ok(false)
}

/// Maps a scoped bus notice onto its wire frame.
fn notice_to_push(notice: LobbyNotice) -> LobbyPush {
    match notice {
        LobbyNotice::Opened(challenge) => LobbyPush::ChallengeOpened { challenge },
        LobbyNotice::Closed(challenge_id) => LobbyPush::ChallengeClosed { challenge_id },
        LobbyNotice::MatchReady { token } => LobbyPush::MatchReady { token },
    }
}

// =========================================================================
// Game connections
// =========================================================================

/// Drop guard for a game connection: detaches the seat, quoting the
/// epoch from attach so a newer binding is left alone.
struct SeatGuard<S: EngineSession> {
    slot: riposte_protocol::Slot,
    epoch: u64,
    handle: SessionHandle<S>,
}

impl<S: EngineSession> Drop for SeatGuard<S> {
    fn drop(&mut self) {
        let slot = self.slot;
        let epoch = self.epoch;
        let handle = self.handle.clone();
        tokio::spawn(async move {
            let _ = handle.detach(slot, epoch).await;
        });
    }
}

/// Serves a game connection: bind the seat, pump engine output to the
/// socket, forward inbound commands to the engine.
///
/// A rebind with the same token elsewhere stops this connection's
/// outbound pump (the actor swaps the seat sender); inbound frames from
/// it still reach the engine until the socket closes, at which point
/// the stale-epoch detach is ignored by the actor.
async fn serve_game<F, A, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<F, A, C>>,
    token: JoinToken,
) -> Result<(), RiposteError>
where
    F: EngineFactory,
    A: Authenticator,
    C: Codec,
{
    let conn_id = conn.id();

    let (seat_tx, mut seat_rx) = tokio::sync::mpsc::unbounded_channel();
    let attach_result = {
        let sessions = state.sessions.lock().await;
        sessions.attach(&token, seat_tx).await
    };
    let attached = match attach_result {
        Ok(attached) => attached,
        Err(e) => {
            tracing::info!(%conn_id, %token, error = %e, "game attach rejected");
            send_game_denied::<F::Session, C>(&conn, &state.codec, &e.to_string()).await?;
            let _ = conn.close().await;
            return Ok(());
        }
    };
    tracing::info!(
        %conn_id,
        session_id = %attached.session_id,
        slot = %attached.slot,
        "game connection bound"
    );

    let conn = Arc::new(conn);
    let _guard = SeatGuard {
        slot: attached.slot,
        epoch: attached.epoch,
        handle: attached.handle.clone(),
    };

    // Outbound pump. The snapshot queued by the attach is already in
    // the channel, so it is always the first frame out. The pump ends
    // when the seat is rebound elsewhere or the session actor exits.
    let pump_conn = Arc::clone(&conn);
    let pump_state = Arc::clone(&state);
    tokio::spawn(async move {
        while let Some(outbound) = seat_rx.recv().await {
            let push = match outbound {
                SessionOutbound::Snapshot(view) => GamePush::Snapshot { state: view },
                SessionOutbound::Action(notice) => GamePush::Action { action: notice },
            };
            let bytes = match pump_state.codec.encode(&push) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to encode game push");
                    continue;
                }
            };
            if pump_conn.send(&bytes).await.is_err() {
                break;
            }
        }
    });

    // Inbound loop. Undecodable commands are answered and skipped;
    // engine rejections are the actor's business and never close the
    // socket from here.
    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(
                    session_id = %attached.session_id,
                    slot = %attached.slot,
                    "game connection closed"
                );
                break;
            }
            Err(e) => {
                tracing::debug!(
                    session_id = %attached.session_id,
                    error = %e,
                    "game recv error"
                );
                break;
            }
        };

        let command: <F::Session as EngineSession>::Command =
            match state.codec.decode(&data) {
                Ok(command) => command,
                Err(e) => {
                    tracing::debug!(
                        session_id = %attached.session_id,
                        slot = %attached.slot,
                        error = %e,
                        "undecodable game command"
                    );
                    send_game_denied::<F::Session, C>(
                        &conn,
                        &state.codec,
                        &format!("unreadable command: {e}"),
                    )
                    .await?;
                    continue;
                }
            };

        if attached.handle.apply(attached.slot, command).await.is_err() {
            tracing::info!(
                session_id = %attached.session_id,
                "session ended, dropping connection"
            );
            break;
        }
    }

    // _guard drops here: epoch-checked detach.
    Ok(())
}

// =========================================================================
// Push helpers
// =========================================================================

/// Encodes and sends one lobby push.
async fn send_lobby_push(
    conn: &WebSocketConnection,
    codec: &impl Codec,
    push: &LobbyPush,
) -> Result<(), RiposteError> {
    let bytes = codec.encode(push)?;
    conn.send(&bytes).await.map_err(RiposteError::Transport)?;
    Ok(())
}

/// Encodes and sends one game `Denied` push.
async fn send_game_denied<S, C>(
    conn: &WebSocketConnection,
    codec: &C,
    reason: &str,
) -> Result<(), RiposteError>
where
    S: EngineSession,
    C: Codec,
{
    let push: GamePush<S::View, S::Notice> = GamePush::Denied {
        reason: reason.to_string(),
    };
    let bytes = codec.encode(&push)?;
    conn.send(&bytes).await.map_err(RiposteError::Transport)?;
    Ok(())
}
