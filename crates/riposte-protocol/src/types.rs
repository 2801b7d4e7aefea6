//! Core types for Riposte's wire format.
//!
//! Everything in this module either travels on the wire or identifies
//! something that does. The types split into three groups:
//!
//! - **Identifiers** ([`PlayerId`], [`ChallengeId`], [`SessionId`],
//!   [`JoinToken`]): newtype wrappers around strings, some of them minted
//!   from random bits.
//! - **Seats** ([`Slot`]): which of the two sides of a session a player
//!   occupies. Never serialized by the framework; games pick their own
//!   wire representation for it.
//! - **Frames** ([`ClientFrame`], [`LobbyPush`], [`GamePush`]): the
//!   messages clients and server exchange, as internally tagged enums.

use rand::Rng;
use serde::{Deserialize, Serialize};

use std::fmt;

/// Protocol version checked during the hello exchange. Clients speaking a
/// different version are rejected before anything else happens.
pub const PROTOCOL_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The number of random bytes behind a minted identifier.
///
/// 16 bytes is 128 bits of entropy, hex-encoded to 32 characters. That is
/// what makes challenge ids and join tokens unguessable rather than merely
/// unique.
const ID_ENTROPY_BYTES: usize = 16;

/// Draws `ID_ENTROPY_BYTES` from the thread RNG and hex-encodes them.
fn random_hex() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; ID_ENTROPY_BYTES] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// A stable identifier for an authenticated player.
///
/// This is a newtype wrapper: a named struct around a plain `String`.
/// The wrapper exists so a function asking for a `PlayerId` cannot be
/// handed a `ChallengeId` by accident, even though both are strings
/// underneath.
///
/// `#[serde(transparent)]` makes serde treat the wrapper as invisible:
/// `PlayerId("ada".into())` serializes as `"ada"`, not `{"0":"ada"}`.
///
/// Player ids are assigned by the authenticator seam in the lobby crate,
/// not minted here; whatever identity scheme the host application uses
/// (account ids, OAuth subjects, display names in a demo) lands in this
/// type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// Borrows the underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        PlayerId(value.to_owned())
    }
}

/// The identifier of an open challenge.
///
/// Minted with [`ChallengeId::random`]: the `ch_` prefix plus 32 hex
/// characters of fresh randomness. The id doubles as a capability of
/// sorts (you can only accept a challenge whose id you have seen), so it
/// draws from the same entropy pool as join tokens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChallengeId(pub String);

impl ChallengeId {
    /// Mints a fresh, unguessable challenge id.
    pub fn random() -> Self {
        ChallengeId(format!("ch_{}", random_hex()))
    }
}

impl fmt::Display for ChallengeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The identifier of a live game session.
///
/// Engine factories decide where session ids come from (an engine may have
/// its own id scheme); [`SessionId::random`] is the default mint for
/// factories that don't care.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Mints a fresh session id.
    pub fn random() -> Self {
        SessionId(format!("ses_{}", random_hex()))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A per-seat credential for joining a session.
///
/// Possession of the token IS the authorization: whoever presents it on a
/// game connection is bound to the seat it was minted for. Tokens are the
/// `jt_` prefix plus 32 hex characters (128 random bits) and are never
/// reused across seats or sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JoinToken(pub String);

impl JoinToken {
    /// Mints a fresh, unguessable join token.
    pub fn random() -> Self {
        JoinToken(format!("jt_{}", random_hex()))
    }
}

impl fmt::Display for JoinToken {
    /// Tokens are credentials, so logs only ever see a stub.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stub = self.0.get(..8).unwrap_or(&self.0);
        write!(f, "{stub}..")
    }
}

// ---------------------------------------------------------------------------
// Slot - which side of the table
// ---------------------------------------------------------------------------

/// One of the two seats in a session.
///
/// The challenge requester always becomes [`Slot::One`] and the acceptor
/// [`Slot::Two`]. The framework never serializes slots; a game that wants
/// to tell the client which seat it holds maps the slot into its own view
/// type (see [`Slot::as_number`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// The challenge requester's seat.
    One,
    /// The acceptor's seat.
    Two,
}

impl Slot {
    /// Both seats, in order. Handy for "for each seat" loops.
    pub const BOTH: [Slot; 2] = [Slot::One, Slot::Two];

    /// Zero-based index, for indexing per-seat arrays.
    pub fn index(self) -> usize {
        match self {
            Slot::One => 0,
            Slot::Two => 1,
        }
    }

    /// The opposing seat.
    pub fn other(self) -> Slot {
        match self {
            Slot::One => Slot::Two,
            Slot::Two => Slot::One,
        }
    }

    /// One-based seat number, the conventional client-facing form.
    pub fn as_number(self) -> u8 {
        match self {
            Slot::One => 1,
            Slot::Two => 2,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seat-{}", self.as_number())
    }
}

// ---------------------------------------------------------------------------
// ChallengeSummary - the public projection of a challenge
// ---------------------------------------------------------------------------

/// What the lobby shows about an open challenge.
///
/// This is deliberately NOT the full challenge record. The requester's
/// identity and their setup payload (deck) stay server-side; the summary
/// carries only what a browsing player needs to decide whether to accept.
/// The `own` flag is computed per viewer, so every subscriber sees a
/// slightly different summary of the same challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeSummary {
    /// The id to pass back in an accept frame.
    pub challenge_id: ChallengeId,
    /// Free-form text chosen by the requester ("casual", "ranked deck 3", ...).
    pub label: String,
    /// Milliseconds since the Unix epoch when the challenge was opened.
    pub created_at_ms: u64,
    /// True exactly when the viewer is the requester.
    pub own: bool,
}

// ---------------------------------------------------------------------------
// Client frames
// ---------------------------------------------------------------------------

/// Everything a client can send.
///
/// `#[serde(tag = "type")]` makes the JSON internally tagged:
/// `{ "type": "Open", "label": "casual", "deck": [...] }` rather than the
/// doubly nested `{ "Open": { ... } }` form. Internally tagged enums are
/// what JavaScript clients handle most naturally.
///
/// The first frame on any connection must be one of the two hello
/// variants; everything after that depends on which kind of connection it
/// turned out to be.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientFrame {
    /// Opens a lobby connection. `player` is an identity claim; the
    /// server's authenticator turns it into a [`PlayerId`] or rejects it.
    LobbyHello { version: u32, player: String },

    /// Opens a game connection. The token was minted when a match was
    /// made and determines both the session and the seat.
    GameHello { version: u32, token: JoinToken },

    /// Publishes a challenge. The deck is the requester's hidden setup
    /// payload; it is held server-side and revealed only to the engine
    /// factory when someone accepts.
    Open { label: String, deck: Vec<String> },

    /// Withdraws the sender's open challenge, if any.
    Close,

    /// Accepts the identified challenge with the acceptor's own deck.
    Accept {
        challenge_id: ChallengeId,
        deck: Vec<String>,
    },

    /// Requests a fresh copy of the open-challenge list.
    List,
}

// ---------------------------------------------------------------------------
// Lobby pushes
// ---------------------------------------------------------------------------

/// Everything the server pushes on a lobby connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LobbyPush {
    /// The full open-challenge list, viewer-scoped. Sent right after the
    /// hello succeeds and again on request or after a local mutation.
    Challenges { challenges: Vec<ChallengeSummary> },

    /// A challenge appeared.
    ChallengeOpened { challenge: ChallengeSummary },

    /// A challenge went away (withdrawn, or accepted by somebody else).
    ChallengeClosed { challenge_id: ChallengeId },

    /// A match involving the receiving player was made; `token` is that
    /// player's own seat credential. Nobody else's token ever appears in
    /// this frame, and after sending it the server closes the lobby
    /// connection: the client's next move is a game connection.
    MatchReady { token: JoinToken },

    /// The previous request was denied (conflict, unknown challenge,
    /// malformed frame). The connection stays open.
    Rejected { reason: String },
}

// ---------------------------------------------------------------------------
// Game pushes
// ---------------------------------------------------------------------------

/// Everything the server pushes on a game connection.
///
/// Generic over the engine's per-seat view (`V`) and per-seat notice (`N`)
/// types, so each game's wire shapes flow through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GamePush<V, N> {
    /// A full snapshot of the session state, projected for the receiving
    /// seat. Always the first push after a seat binds.
    Snapshot { state: V },

    /// One projected engine output.
    Action { action: N },

    /// The connection was refused or a frame was unusable (bad token,
    /// version mismatch, undecodable command).
    Denied { reason: String },
}

// =========================================================================
// Tests
// =========================================================================
