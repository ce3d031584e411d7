//! Agent repository trait definition.

use std::collections::HashMap;

use agentverse_types::agent::{AgentId, AgentPersona, UserId};
use agentverse_types::error::RepositoryError;

/// Read access to the agent roster plus the owner-handle lookup used to
/// build mention indices.
///
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait AgentRepository: Send + Sync {
    /// Every configured agent, in stable roster order.
    fn list_agents(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<AgentPersona>, RepositoryError>> + Send;

    /// Handles for the given owner ids. Owners without a handle are omitted.
    fn owner_handles(
        &self,
        owners: &[UserId],
    ) -> impl std::future::Future<Output = Result<HashMap<UserId, String>, RepositoryError>> + Send;

    fn get_agent(
        &self,
        id: &AgentId,
    ) -> impl std::future::Future<Output = Result<Option<AgentPersona>, RepositoryError>> + Send;

    /// Insert or replace an agent. Returns the stored agent.
    fn upsert_agent(
        &self,
        agent: &AgentPersona,
    ) -> impl std::future::Future<Output = Result<AgentPersona, RepositoryError>> + Send;
}
