//! The identity hook for lobby connections.
//!
//! Riposte does not verify identities itself; it asks an
//! [`Authenticator`] you plug in. The lobby handshake carries one claim
//! string, the authenticator turns it into a [`PlayerId`] or rejects
//! the connection, and nothing past the handshake ever sees the claim
//! again.
//!
//! Production deployments validate a JWT or call an auth service here.
//! Development and tests use [`AcceptAll`], which believes whatever the
//! client says.

use riposte_protocol::PlayerId;

use crate::LobbyError;

/// Resolves a connection's identity claim to a player.
///
/// One authenticator instance is shared by every connection the server
/// accepts, hence `Send + Sync + 'static`.
///
/// # Example
///
/// ```rust
/// use riposte_lobby::{Authenticator, LobbyError};
/// use riposte_protocol::PlayerId;
///
/// /// Accepts only claims carrying a known prefix.
/// struct PrefixAuth;
///
/// impl Authenticator for PrefixAuth {
///     async fn authenticate(&self, claim: &str) -> Result<PlayerId, LobbyError> {
///         let name = claim.strip_prefix("player:").ok_or_else(|| {
///             LobbyError::AuthFailed("claim must start with player:".into())
///         })?;
///         Ok(PlayerId::from(name))
///     }
/// }
/// ```
pub trait Authenticator: Send + Sync + 'static {
    /// Validates the handshake claim and names the player behind it.
    ///
    /// # Errors
    /// [`LobbyError::AuthFailed`] when the claim does not resolve to a
    /// player. The connection is refused and closed.
    fn authenticate(
        &self,
        claim: &str,
    ) -> impl std::future::Future<Output = Result<PlayerId, LobbyError>> + Send;
}

/// Takes every non-empty claim at face value as the player id.
///
/// Useful for local development and tests; pointless against anyone who
/// can type someone else's name.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl Authenticator for AcceptAll {
    async fn authenticate(&self, claim: &str) -> Result<PlayerId, LobbyError> {
        if claim.is_empty() {
            return Err(LobbyError::AuthFailed("empty identity claim".into()));
        }
        Ok(PlayerId::from(claim))
    }
}

// =========================================================================
// Tests
// =========================================================================
