//! Global configuration types for AgentVerse.
//!
//! `GlobalConfig` represents the top-level `config.toml` that controls the
//! text-generation backend, reply scheduling, cascade limits, and storage.

use serde::{Deserialize, Serialize};

use crate::agent::DEFAULT_MAX_REPLY_LENGTH;
use crate::error::ConfigError;

/// Upper bound on conversation messages passed as reply history.
pub const MAX_HISTORY_WINDOW: usize = 10;

/// Top-level configuration for the AgentVerse reply service.
///
/// Loaded from `~/.agentverse/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub replies: ReplyConfig,
    #[serde(default)]
    pub cascade: CascadeConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

impl GlobalConfig {
    /// Reject settings that would make the pipeline misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.replies.min_delay_ms > self.replies.max_delay_ms {
            return Err(ConfigError::Invalid(format!(
                "replies.min_delay_ms ({}) exceeds replies.max_delay_ms ({})",
                self.replies.min_delay_ms, self.replies.max_delay_ms
            )));
        }
        if self.replies.history_window > MAX_HISTORY_WINDOW {
            return Err(ConfigError::Invalid(format!(
                "replies.history_window ({}) exceeds {MAX_HISTORY_WINDOW}",
                self.replies.history_window
            )));
        }
        if self.generation.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "generation.timeout_secs must be > 0".to_string(),
            ));
        }
        if let StorageBackend::Rest = self.storage.backend {
            if self.storage.rest_url.as_deref().is_none_or(str::is_empty) {
                return Err(ConfigError::Missing("storage.rest_url".to_string()));
            }
        }
        Ok(())
    }
}

/// Text-generation backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the API credential.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Reply scheduling and composition settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyConfig {
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Number of trailing conversation messages passed as history (at most 10).
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    /// Prepend mentions of complementary agents to replies.
    #[serde(default = "default_true")]
    pub peer_mentions: bool,
    /// Reply cap for agents without their own `max_reply_length`.
    #[serde(default = "default_max_reply_length")]
    pub default_max_reply_length: u32,
}

fn default_min_delay_ms() -> u64 {
    2_000
}

fn default_max_delay_ms() -> u64 {
    6_000
}

fn default_history_window() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_max_reply_length() -> u32 {
    DEFAULT_MAX_REPLY_LENGTH
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            history_window: default_history_window(),
            peer_mentions: default_true(),
            default_max_reply_length: default_max_reply_length(),
        }
    }
}

impl ReplyConfig {
    /// `history_window` clamped to [`MAX_HISTORY_WINDOW`].
    pub fn effective_history_window(&self) -> usize {
        self.history_window.min(MAX_HISTORY_WINDOW)
    }
}

/// Limits on agents replying to each other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CascadeConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Maximum agent-to-agent hops from the original human content.
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
    /// Maximum replies from one agent to another per window.
    #[serde(default = "default_max_pair_rate")]
    pub max_pair_rate: u32,
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

fn default_max_depth() -> u32 {
    2
}

fn default_max_pair_rate() -> u32 {
    4
}

fn default_window_secs() -> u64 {
    300
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            max_depth: default_max_depth(),
            max_pair_rate: default_max_pair_rate(),
            window_secs: default_window_secs(),
        }
    }
}

/// Which persistence backend stores agents and replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Local SQLite database in the data directory.
    #[default]
    Sqlite,
    /// Hosted REST backend (row API + token auth).
    Rest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default)]
    pub rest_url: Option<String>,
    /// Environment variable holding the hosted backend's anon key.
    #[serde(default = "default_rest_key_env")]
    pub rest_key_env: String,
}

fn default_rest_key_env() -> String {
    "AGENTVERSE_BACKEND_KEY".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            rest_url: None,
            rest_key_env: default_rest_key_env(),
        }
    }
}

/// Auth session keep-alive settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Refresh when the session expires within this many seconds.
    #[serde(default = "default_refresh_threshold_secs")]
    pub refresh_threshold_secs: i64,
    /// Interval of the periodic "resumed" tick while serving.
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,
}

fn default_refresh_threshold_secs() -> i64 {
    300
}

fn default_check_interval_secs() -> u64 {
    60
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            refresh_threshold_secs: default_refresh_threshold_secs(),
            check_interval_secs: default_check_interval_secs(),
        }
    }
}
