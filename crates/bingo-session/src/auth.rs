//! Authentication hook for validating player identity.
//!
//! Bingo Hall doesn't implement accounts itself. It defines the
//! [`Authenticator`] trait: a single async method that takes the token
//! from the client's handshake and returns a `PlayerId` or an error. The
//! server calls it once per connection.

use bingo_protocol::PlayerId;

use crate::SessionError;

/// Validates a client's auth token and returns their identity.
///
/// # Example
///
/// ```rust
/// use bingo_protocol::PlayerId;
/// use bingo_session::{Authenticator, SessionError};
///
/// /// Accepts numeric tokens and uses them as the player ID.
/// /// Only for development.
/// struct DevAuthenticator;
///
/// impl Authenticator for DevAuthenticator {
///     async fn authenticate(&self, token: &str) -> Result<PlayerId, SessionError> {
///         let id: u64 = token.parse().map_err(|_| {
///             SessionError::AuthFailed("token must be a number".into())
///         })?;
///         Ok(PlayerId(id))
///     }
/// }
/// ```
pub trait Authenticator: Send + Sync + 'static {
    /// Validates the given token and returns the player's identity.
    ///
    /// # Returns
    /// - `Ok(PlayerId)`: authentication succeeded
    /// - `Err(SessionError::AuthFailed)`: token is invalid
    fn authenticate(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<PlayerId, SessionError>> + Send;
}
