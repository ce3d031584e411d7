//! Storage backend selected at startup.
//!
//! The reply service is generic over its repositories; `Store` lets the
//! binary pick SQLite or the hosted REST backend from `config.toml` while
//! keeping a single concrete service type.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use agentverse_core::repository::{AgentRepository, ContentRepository};
use agentverse_types::agent::{AgentId, AgentPersona, UserId};
use agentverse_types::error::RepositoryError;
use agentverse_types::reply::{NewComment, NewThreadMessage};

use crate::rest::{RestAuthClient, RestRepository};
use crate::sqlite::{DatabasePool, SqliteAgentRepository, SqliteContentRepository};

pub enum Store {
    Sqlite {
        agents: SqliteAgentRepository,
        content: SqliteContentRepository,
    },
    Rest(RestRepository),
}

impl Store {
    pub fn sqlite(pool: DatabasePool) -> Self {
        Store::Sqlite {
            agents: SqliteAgentRepository::new(pool.clone()),
            content: SqliteContentRepository::new(pool),
        }
    }

    pub fn rest(auth: Arc<RestAuthClient>) -> Self {
        Store::Rest(RestRepository::new(auth))
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Store::Sqlite { .. } => "sqlite",
            Store::Rest(_) => "rest",
        }
    }

    /// Register a local user handle. Only the SQLite backend stores users;
    /// the hosted backend manages profiles itself.
    pub async fn upsert_user(
        &self,
        id: &UserId,
        handle: Option<&str>,
    ) -> Result<(), RepositoryError> {
        match self {
            Store::Sqlite { agents, .. } => agents.upsert_user(id, handle).await,
            Store::Rest(_) => Err(RepositoryError::Query(
                "user profiles are managed by the hosted backend".to_string(),
            )),
        }
    }
}

impl AgentRepository for Store {
    async fn list_agents(&self) -> Result<Vec<AgentPersona>, RepositoryError> {
        match self {
            Store::Sqlite { agents, .. } => agents.list_agents().await,
            Store::Rest(rest) => rest.list_agents().await,
        }
    }

    async fn owner_handles(
        &self,
        owners: &[UserId],
    ) -> Result<HashMap<UserId, String>, RepositoryError> {
        match self {
            Store::Sqlite { agents, .. } => agents.owner_handles(owners).await,
            Store::Rest(rest) => rest.owner_handles(owners).await,
        }
    }

    async fn get_agent(&self, id: &AgentId) -> Result<Option<AgentPersona>, RepositoryError> {
        match self {
            Store::Sqlite { agents, .. } => agents.get_agent(id).await,
            Store::Rest(rest) => rest.get_agent(id).await,
        }
    }

    async fn upsert_agent(&self, agent: &AgentPersona) -> Result<AgentPersona, RepositoryError> {
        match self {
            Store::Sqlite { agents, .. } => agents.upsert_agent(agent).await,
            Store::Rest(rest) => rest.upsert_agent(agent).await,
        }
    }
}

impl ContentRepository for Store {
    async fn insert_comment(&self, comment: &NewComment) -> Result<Uuid, RepositoryError> {
        match self {
            Store::Sqlite { content, .. } => content.insert_comment(comment).await,
            Store::Rest(rest) => rest.insert_comment(comment).await,
        }
    }

    async fn insert_thread_message(
        &self,
        message: &NewThreadMessage,
    ) -> Result<Uuid, RepositoryError> {
        match self {
            Store::Sqlite { content, .. } => content.insert_thread_message(message).await,
            Store::Rest(rest) => rest.insert_thread_message(message).await,
        }
    }

    async fn recent_thread_messages(
        &self,
        thread_id: &Uuid,
        limit: usize,
    ) -> Result<Vec<String>, RepositoryError> {
        match self {
            Store::Sqlite { content, .. } => content.recent_thread_messages(thread_id, limit).await,
            Store::Rest(rest) => rest.recent_thread_messages(thread_id, limit).await,
        }
    }
}
