//! API key storage for the REST surface.
//!
//! Only SHA-256 digests are stored; plaintext keys are shown once at creation.

use agentverse_types::error::RepositoryError;
use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, query_error};
use crate::crypto::hash::hash_api_key;

pub struct SqliteApiKeyStore {
    pool: DatabasePool,
}

impl SqliteApiKeyStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    pub async fn has_any_key(&self) -> Result<bool, RepositoryError> {
        let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM api_keys LIMIT 1")
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;
        Ok(existing.is_some())
    }

    /// Store the digest of `plaintext_key` under `name`. Returns the key id.
    pub async fn insert_key(&self, name: &str, plaintext_key: &str) -> Result<Uuid, RepositoryError> {
        let id = Uuid::now_v7();
        let result = sqlx::query(
            "INSERT INTO api_keys (id, key_hash, name, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(hash_api_key(plaintext_key))
        .bind(name)
        .bind(format_datetime(&Utc::now()))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(id),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE") => {
                Err(RepositoryError::Conflict("API key already exists".to_string()))
            }
            Err(e) => Err(query_error(e)),
        }
    }

    /// Check a presented key. Valid keys get `last_used_at` bumped (best effort).
    pub async fn verify(&self, plaintext_key: &str) -> Result<bool, RepositoryError> {
        let row = sqlx::query("SELECT id FROM api_keys WHERE key_hash = ?")
            .bind(hash_api_key(plaintext_key))
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        let Some(row) = row else {
            return Ok(false);
        };

        let id: String = row.try_get("id").map_err(query_error)?;
        if let Err(e) = sqlx::query("UPDATE api_keys SET last_used_at = ? WHERE id = ?")
            .bind(format_datetime(&Utc::now()))
            .bind(&id)
            .execute(&self.pool.writer)
            .await
        {
            tracing::debug!(error = %e, "failed to record API key use");
        }
        Ok(true)
    }
}
