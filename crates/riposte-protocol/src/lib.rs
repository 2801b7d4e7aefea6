//! Wire protocol for Riposte.
//!
//! This crate defines the language clients and the server speak:
//!
//! - **Identifiers** ([`PlayerId`], [`ChallengeId`], [`SessionId`],
//!   [`JoinToken`]) and the two-seat [`Slot`] type.
//! - **Frames** ([`ClientFrame`], [`LobbyPush`], [`GamePush`]) that
//!   travel over a connection.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) converting frames to and
//!   from bytes.
//! - **Errors** ([`ProtocolError`]) for anything that goes wrong on the
//!   way.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and everything
//! stateful above it. It knows nothing about connections, challenges, or
//! sessions; it only defines shapes and how to serialize them.
//!
//! ```text
//! Transport (bytes) → Protocol (frames) → Lobby / Session (state)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ChallengeId, ChallengeSummary, ClientFrame, GamePush, JoinToken, LobbyPush,
    PROTOCOL_VERSION, PlayerId, SessionId, Slot,
};
