//! # Riposte
//!
//! Challenge-based matchmaking and session bridging for two-player card
//! games.
//!
//! Riposte runs the part of a game server that is the same for every
//! card game: players open challenges in a shared lobby, accept each
//! other, and get bridged onto a running engine session with one seat
//! each. The rules themselves live behind the [`EngineSession`] and
//! [`EngineFactory`](riposte_session::EngineFactory) traits; Riposte
//! never inspects a command or a card.
//!
//! [`EngineSession`]: riposte_session::EngineSession
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use riposte::prelude::*;
//!
//! // Implement EngineSession and EngineFactory for your game, then:
//! // let server = RiposteServerBuilder::new()
//! //     .bind("0.0.0.0:8080")
//! //     .build(MyGameFactory::default(), AcceptAll)
//! //     .await?;
//! // server.run().await
//! ```

mod error;
mod handler;
mod server;

pub use error::RiposteError;
pub use server::{RiposteServer, RiposteServerBuilder};

/// Everything a game backend built on Riposte typically imports.
pub mod prelude {
    pub use crate::error::RiposteError;
    pub use crate::server::{RiposteServer, RiposteServerBuilder};
    pub use riposte_lobby::{
        AcceptAll, Authenticator, Lobby, LobbyError, LobbyNotice, MatchResolver,
    };
    pub use riposte_protocol::{
        ChallengeId, ChallengeSummary, ClientFrame, Codec, GamePush, JoinToken,
        JsonCodec, LobbyPush, PROTOCOL_VERSION, PlayerId, ProtocolError, SessionId,
        Slot,
    };
    pub use riposte_session::{
        EngineFactory, EngineSession, SessionError, SessionHost,
    };
    pub use riposte_transport::{
        Connection, Transport, TransportError, WebSocketTransport,
    };
}
