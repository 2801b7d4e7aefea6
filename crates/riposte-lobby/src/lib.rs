//! Lobby state and matchmaking for Riposte.
//!
//! Players open challenges, watch the board through scoped
//! subscriptions, and accept each other into sessions. The privacy rule
//! runs through everything here: a challenge's deck and requester stay
//! server-side, and when a match is made only the requester learns a
//! join token exists.
//!
//! # Key types
//!
//! - [`Lobby`] — open challenges plus the subscribers watching them
//! - [`MatchResolver`] — the accept protocol, from challenge to session
//! - [`Authenticator`] — identity hook for lobby connections
//! - [`LobbyNotice`] — what one subscriber actually receives
//! - [`Challenge`] / [`ChallengeRegistry`] — server-side challenge records

mod auth;
mod bus;
mod challenge;
mod error;
mod event;
mod lobby;
mod resolver;

pub use auth::{AcceptAll, Authenticator};
pub use bus::{EventBus, SubscriptionId};
pub use challenge::{Challenge, ChallengeRegistry};
pub use error::LobbyError;
pub use event::{LobbyEvent, LobbyNotice};
pub use lobby::Lobby;
pub use resolver::{AcceptedMatch, MatchResolver};
