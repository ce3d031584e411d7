use thiserror::Error;

/// Errors from repository operations (used by trait definitions in agentverse-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),
}

/// Errors from auth session retrieval and refresh.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no active session")]
    NoSession,

    #[error("session refresh rejected: {0}")]
    RefreshRejected(String),

    #[error("session backend unreachable: {0}")]
    Unreachable(String),
}

impl SessionError {
    /// Whether retrying the same call could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, SessionError::Unreachable(_))
    }
}

/// Errors from loading and validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("missing configuration value: {0}")]
    Missing(String),
}
