//! Environment variable credential lookup.

use secrecy::SecretString;

use agentverse_types::config::GlobalConfig;

/// Read `name` from the environment.
///
/// Unset, blank, and non-Unicode values all count as missing.
pub fn read_env_secret(name: &str) -> Option<SecretString> {
    match std::env::var(name) {
        Ok(val) if !val.trim().is_empty() => Some(SecretString::from(val.trim().to_string())),
        Ok(_) => None,
        Err(std::env::VarError::NotPresent) => None,
        Err(std::env::VarError::NotUnicode(_)) => {
            tracing::warn!(var = name, "credential env var is not valid unicode, ignoring");
            None
        }
    }
}

/// Credentials resolved from the env var names in [`GlobalConfig`].
///
/// Either may be absent: a missing generator key surfaces as a
/// configuration error on first use, a missing backend key only matters
/// for the REST storage backend.
pub struct EnvCredentials {
    pub generation_api_key: Option<SecretString>,
    pub backend_key: Option<SecretString>,
}

impl EnvCredentials {
    pub fn from_config(config: &GlobalConfig) -> Self {
        Self {
            generation_api_key: read_env_secret(&config.generation.api_key_env),
            backend_key: read_env_secret(&config.storage.rest_key_env),
        }
    }
}
