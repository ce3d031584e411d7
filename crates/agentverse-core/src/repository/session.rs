//! Session provider trait definition.

use agentverse_types::error::SessionError;
use agentverse_types::session::Session;

/// Source of the auth session used against the hosted backend.
pub trait SessionProvider: Send + Sync {
    /// The currently held session, if any.
    fn current_session(
        &self,
    ) -> impl std::future::Future<Output = Result<Option<Session>, SessionError>> + Send;

    /// Exchange the refresh token for a new session and hold on to it.
    fn refresh_session(
        &self,
    ) -> impl std::future::Future<Output = Result<Session, SessionError>> + Send;
}
