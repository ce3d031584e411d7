use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Default reply cap applied when an agent has no `max_reply_length`.
pub const DEFAULT_MAX_REPLY_LENGTH: u32 = 500;

/// Unique identifier for an agent persona, wrapping a UUID v7 (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub Uuid);

impl AgentId {
    /// Create a new AgentId using UUID v7.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Create an AgentId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AgentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Unique identifier for a human user (agent owner or content author).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A user-configured AI persona that can post and auto-reply.
///
/// Owned and edited by the settings surface between decision cycles; the
/// reply pipeline only ever reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentPersona {
    pub id: AgentId,
    /// Display name ("TechBot").
    pub name: String,
    /// Optional handle, stored with or without a leading `@`.
    #[serde(default)]
    pub handle: Option<String>,
    /// Free-text persona description used for prompting and relevance.
    pub persona: String,
    /// Sampling temperature passed to the text generator.
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// The user who configured this agent.
    #[serde(default)]
    pub owner_id: Option<UserId>,
    #[serde(default)]
    pub max_post_length: Option<u32>,
    #[serde(default)]
    pub max_reply_length: Option<u32>,
    #[serde(default)]
    pub reply_behavior: ReplyBehavior,
    /// Tone label embedded in reply prompts ("friendly", "witty", ...).
    #[serde(default = "default_reply_tone")]
    pub reply_tone: String,
    /// Posting-frequency label ("daily", "hourly", ...).
    #[serde(default = "default_posting_frequency")]
    pub posting_frequency: String,
}

fn default_temperature() -> f64 {
    0.7
}

fn default_reply_tone() -> String {
    "friendly".to_string()
}

fn default_posting_frequency() -> String {
    "daily".to_string()
}

impl AgentPersona {
    /// Build a persona with defaults for everything but name and description.
    pub fn new(name: impl Into<String>, persona: impl Into<String>) -> Self {
        Self {
            id: AgentId::new(),
            name: name.into(),
            handle: None,
            persona: persona.into(),
            temperature: default_temperature(),
            owner_id: None,
            max_post_length: None,
            max_reply_length: None,
            reply_behavior: ReplyBehavior::default(),
            reply_tone: default_reply_tone(),
            posting_frequency: default_posting_frequency(),
        }
    }

    pub fn with_handle(mut self, handle: impl Into<String>) -> Self {
        self.handle = Some(handle.into());
        self
    }

    pub fn with_behavior(mut self, behavior: ReplyBehavior) -> Self {
        self.reply_behavior = behavior;
        self
    }

    pub fn with_max_reply_length(mut self, max: u32) -> Self {
        self.max_reply_length = Some(max);
        self
    }

    pub fn with_owner(mut self, owner: UserId) -> Self {
        self.owner_id = Some(owner);
        self
    }

    /// Handle without its leading `@`, or `None` when unset or blank.
    pub fn bare_handle(&self) -> Option<&str> {
        self.handle
            .as_deref()
            .map(strip_at)
            .filter(|h| !h.is_empty())
    }
}

/// Strip a single leading `@` and surrounding whitespace from a handle.
pub fn strip_at(handle: &str) -> &str {
    let trimmed = handle.trim();
    trimmed.strip_prefix('@').unwrap_or(trimmed).trim()
}

/// How eagerly an agent replies to content it did not author.
///
/// - Always: replies when mentioned or when content is relevant to its persona
/// - Selective: replies only when mentioned
/// - Never: does not auto-reply at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyBehavior {
    Always,
    Selective,
    Never,
}

impl fmt::Display for ReplyBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplyBehavior::Always => write!(f, "always"),
            ReplyBehavior::Selective => write!(f, "selective"),
            ReplyBehavior::Never => write!(f, "never"),
        }
    }
}

impl FromStr for ReplyBehavior {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "always" => Ok(ReplyBehavior::Always),
            "selective" => Ok(ReplyBehavior::Selective),
            "never" => Ok(ReplyBehavior::Never),
            other => Err(format!("invalid reply behavior: '{other}'")),
        }
    }
}

impl Default for ReplyBehavior {
    fn default() -> Self {
        ReplyBehavior::Selective
    }
}
