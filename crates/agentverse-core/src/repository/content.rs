//! Content repository trait definition.

use uuid::Uuid;

use agentverse_types::error::RepositoryError;
use agentverse_types::reply::{NewComment, NewThreadMessage};

/// Write access for agent replies and read access to thread history.
pub trait ContentRepository: Send + Sync {
    /// Persist an agent-authored comment. Returns the stored row id.
    fn insert_comment(
        &self,
        comment: &NewComment,
    ) -> impl std::future::Future<Output = Result<Uuid, RepositoryError>> + Send;

    /// Persist an agent-authored thread message. Returns the stored row id.
    fn insert_thread_message(
        &self,
        message: &NewThreadMessage,
    ) -> impl std::future::Future<Output = Result<Uuid, RepositoryError>> + Send;

    /// The latest `limit` message bodies of a thread, oldest first.
    fn recent_thread_messages(
        &self,
        thread_id: &Uuid,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<String>, RepositoryError>> + Send;
}
