//! SQLite agent repository implementation.
//!
//! Implements `AgentRepository` from `agentverse-core` using sqlx with split read/write pools.

use std::collections::HashMap;

use agentverse_core::repository::AgentRepository;
use agentverse_types::agent::{AgentId, AgentPersona, ReplyBehavior, UserId};
use agentverse_types::error::RepositoryError;
use chrono::Utc;
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, query_error};

/// SQLite-backed implementation of `AgentRepository`.
pub struct SqliteAgentRepository {
    pool: DatabasePool,
}

impl SqliteAgentRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Insert or update a user and their handle.
    ///
    /// Owner handles are otherwise managed by the wider platform; this keeps
    /// a local database usable on its own.
    pub async fn upsert_user(
        &self,
        id: &UserId,
        handle: Option<&str>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO users (id, handle, created_at) VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET handle = excluded.handle",
        )
        .bind(id.to_string())
        .bind(handle)
        .bind(format_datetime(&Utc::now()))
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;
        Ok(())
    }
}

/// Internal row type for mapping SQLite rows to domain AgentPersona.
struct AgentRow {
    id: String,
    name: String,
    handle: Option<String>,
    persona: String,
    temperature: f64,
    owner_id: Option<String>,
    max_post_length: Option<i64>,
    max_reply_length: Option<i64>,
    reply_behavior: String,
    reply_tone: String,
    posting_frequency: String,
}

impl AgentRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            handle: row.try_get("handle")?,
            persona: row.try_get("persona")?,
            temperature: row.try_get("temperature")?,
            owner_id: row.try_get("owner_id")?,
            max_post_length: row.try_get("max_post_length")?,
            max_reply_length: row.try_get("max_reply_length")?,
            reply_behavior: row.try_get("reply_behavior")?,
            reply_tone: row.try_get("reply_tone")?,
            posting_frequency: row.try_get("posting_frequency")?,
        })
    }

    fn into_agent(self) -> Result<AgentPersona, RepositoryError> {
        let id = self
            .id
            .parse::<AgentId>()
            .map_err(|e| RepositoryError::Query(format!("invalid agent id: {e}")))?;

        let owner_id = self
            .owner_id
            .as_deref()
            .map(|s| s.parse::<UserId>())
            .transpose()
            .map_err(|e| RepositoryError::Query(format!("invalid owner id: {e}")))?;

        let reply_behavior: ReplyBehavior = self
            .reply_behavior
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(AgentPersona {
            id,
            name: self.name,
            handle: self.handle,
            persona: self.persona,
            temperature: self.temperature,
            owner_id,
            max_post_length: self.max_post_length.and_then(|v| u32::try_from(v).ok()),
            max_reply_length: self.max_reply_length.and_then(|v| u32::try_from(v).ok()),
            reply_behavior,
            reply_tone: self.reply_tone,
            posting_frequency: self.posting_frequency,
        })
    }
}

impl AgentRepository for SqliteAgentRepository {
    async fn list_agents(&self) -> Result<Vec<AgentPersona>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM agents ORDER BY created_at ASC, id ASC")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_error)?;

        rows.iter()
            .map(|row| {
                AgentRow::from_row(row)
                    .map_err(query_error)
                    .and_then(AgentRow::into_agent)
            })
            .collect()
    }

    async fn owner_handles(
        &self,
        owners: &[UserId],
    ) -> Result<HashMap<UserId, String>, RepositoryError> {
        if owners.is_empty() {
            return Ok(HashMap::new());
        }

        let placeholders = vec!["?"; owners.len()].join(", ");
        let sql = format!(
            "SELECT id, handle FROM users WHERE handle IS NOT NULL AND id IN ({placeholders})"
        );
        let mut query = sqlx::query(&sql);
        for owner in owners {
            query = query.bind(owner.to_string());
        }

        let rows = query
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_error)?;

        let mut handles = HashMap::with_capacity(rows.len());
        for row in &rows {
            let id: String = row.try_get("id").map_err(query_error)?;
            let handle: String = row.try_get("handle").map_err(query_error)?;
            let id = id
                .parse::<UserId>()
                .map_err(|e| RepositoryError::Query(format!("invalid user id: {e}")))?;
            handles.insert(id, handle);
        }
        Ok(handles)
    }

    async fn get_agent(&self, id: &AgentId) -> Result<Option<AgentPersona>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM agents WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        match row {
            Some(row) => {
                let agent_row = AgentRow::from_row(&row).map_err(query_error)?;
                Ok(Some(agent_row.into_agent()?))
            }
            None => Ok(None),
        }
    }

    async fn upsert_agent(&self, agent: &AgentPersona) -> Result<AgentPersona, RepositoryError> {
        let now = format_datetime(&Utc::now());

        sqlx::query(
            "INSERT INTO agents (id, name, handle, persona, temperature, owner_id, max_post_length, max_reply_length, reply_behavior, reply_tone, posting_frequency, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                handle = excluded.handle,
                persona = excluded.persona,
                temperature = excluded.temperature,
                owner_id = excluded.owner_id,
                max_post_length = excluded.max_post_length,
                max_reply_length = excluded.max_reply_length,
                reply_behavior = excluded.reply_behavior,
                reply_tone = excluded.reply_tone,
                posting_frequency = excluded.posting_frequency,
                updated_at = excluded.updated_at",
        )
        .bind(agent.id.to_string())
        .bind(&agent.name)
        .bind(&agent.handle)
        .bind(&agent.persona)
        .bind(agent.temperature)
        .bind(agent.owner_id.map(|id| id.to_string()))
        .bind(agent.max_post_length.map(i64::from))
        .bind(agent.max_reply_length.map(i64::from))
        .bind(agent.reply_behavior.to_string())
        .bind(&agent.reply_tone)
        .bind(&agent.posting_frequency)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        tracing::debug!(agent_id = %agent.id, name = %agent.name, "agent stored");
        Ok(agent.clone())
    }
}
