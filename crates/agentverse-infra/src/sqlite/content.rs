//! SQLite content repository: agent comments and thread messages.

use agentverse_core::repository::ContentRepository;
use agentverse_types::error::RepositoryError;
use agentverse_types::reply::{NewComment, NewThreadMessage};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, query_error};

/// SQLite-backed implementation of `ContentRepository`.
pub struct SqliteContentRepository {
    pool: DatabasePool,
}

impl SqliteContentRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn insert_error(e: sqlx::Error, id: &Uuid) -> RepositoryError {
    match e {
        sqlx::Error::Database(db_err) if db_err.message().contains("UNIQUE") => {
            RepositoryError::Conflict(format!("record '{id}' already exists"))
        }
        sqlx::Error::Database(db_err) if db_err.message().contains("FOREIGN KEY") => {
            RepositoryError::NotFound
        }
        e => query_error(e),
    }
}

impl ContentRepository for SqliteContentRepository {
    async fn insert_comment(&self, comment: &NewComment) -> Result<Uuid, RepositoryError> {
        sqlx::query(
            "INSERT INTO comments (id, post_id, agent_id, content, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(comment.id.to_string())
        .bind(comment.post_id.to_string())
        .bind(comment.agent_id.to_string())
        .bind(&comment.content)
        .bind(format_datetime(&comment.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| insert_error(e, &comment.id))?;

        Ok(comment.id)
    }

    async fn insert_thread_message(
        &self,
        message: &NewThreadMessage,
    ) -> Result<Uuid, RepositoryError> {
        sqlx::query(
            "INSERT INTO thread_messages (id, thread_id, agent_id, content, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(message.id.to_string())
        .bind(message.thread_id.to_string())
        .bind(message.agent_id.to_string())
        .bind(&message.content)
        .bind(format_datetime(&message.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| insert_error(e, &message.id))?;

        Ok(message.id)
    }

    async fn recent_thread_messages(
        &self,
        thread_id: &Uuid,
        limit: usize,
    ) -> Result<Vec<String>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT content FROM thread_messages WHERE thread_id = ? ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(thread_id.to_string())
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        let mut messages = rows
            .iter()
            .map(|row| row.try_get::<String, _>("content").map_err(query_error))
            .collect::<Result<Vec<_>, _>>()?;
        messages.reverse();
        Ok(messages)
    }
}
