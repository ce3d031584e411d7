//! Hosted REST backend.
//!
//! A PostgREST-style row API under `/rest/v1/{table}` plus a token endpoint
//! under `/auth/v1/token`. Row requests carry the current session's access
//! token, falling back to the anon key when no session is held.

pub mod auth;
pub mod client;

pub use auth::RestAuthClient;
pub use client::RestRepository;

use agentverse_types::error::RepositoryError;

/// Map a non-success row API status to a repository error.
pub(crate) fn status_error(status: reqwest::StatusCode, body: &str) -> RepositoryError {
    match status.as_u16() {
        401 | 403 => RepositoryError::Unauthorized(body.to_string()),
        404 => RepositoryError::NotFound,
        409 => RepositoryError::Conflict(body.to_string()),
        _ => RepositoryError::Query(format!("HTTP {status}: {body}")),
    }
}
