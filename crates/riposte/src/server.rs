//! `RiposteServer` builder and accept loop.
//!
//! This is the entry point for running a Riposte server. It ties the
//! layers together: transport connections come in, the handler sorts
//! them into lobby and game connections, and the lobby hands matched
//! players over to sessions.

use std::sync::Arc;

use riposte_lobby::{Authenticator, Lobby, MatchResolver};
use riposte_protocol::{Codec, JsonCodec};
use riposte_session::{EngineFactory, SessionHost};
use riposte_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::RiposteError;
use crate::handler::handle_connection;

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The two
/// mutexes have a fixed order: any task that needs both takes `lobby`
/// first, then `sessions`, never the reverse.
pub(crate) struct ServerState<F: EngineFactory, A: Authenticator, C: Codec> {
    pub(crate) lobby: Mutex<Lobby>,
    pub(crate) sessions: Mutex<SessionHost<F::Session>>,
    pub(crate) resolver: MatchResolver<F>,
    pub(crate) auth: A,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a Riposte server.
///
/// # Example
///
/// ```rust,ignore
/// use riposte::prelude::*;
///
/// let server = RiposteServerBuilder::new()
///     .bind("0.0.0.0:8080")
///     .build(MyCardGameFactory::default(), AcceptAll)
///     .await?;
/// server.run().await
/// ```
pub struct RiposteServerBuilder {
    bind_addr: String,
}

impl RiposteServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Builds and starts the server with the given engine factory and
    /// authenticator.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport` as defaults.
    pub async fn build<F: EngineFactory>(
        self,
        factory: F,
        auth: impl Authenticator,
    ) -> Result<RiposteServer<F, impl Authenticator, JsonCodec>, RiposteError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            lobby: Mutex::new(Lobby::new()),
            sessions: Mutex::new(SessionHost::new()),
            resolver: MatchResolver::new(factory),
            auth,
            codec: JsonCodec,
        });

        Ok(RiposteServer { transport, state })
    }
}

impl Default for RiposteServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Riposte server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct RiposteServer<F: EngineFactory, A: Authenticator, C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<F, A, C>>,
}

impl<F, A, C> RiposteServer<F, A, C>
where
    F: EngineFactory,
    A: Authenticator,
    C: Codec,
{
    /// Creates a new builder.
    pub fn builder() -> RiposteServerBuilder {
        RiposteServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each.
    /// Lobby or game is decided by the connection's first frame. Runs
    /// until the process is terminated.
    pub async fn run(mut self) -> Result<(), RiposteError> {
        tracing::info!("Riposte server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection::<F, A, C>(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
