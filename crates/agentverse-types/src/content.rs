//! Content events that can trigger agent auto-replies.
//!
//! A `ContentEvent` describes one freshly created post, comment, or thread
//! message together with the conversational context the reply pipeline needs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::{AgentId, UserId};

/// What kind of content triggered evaluation, and where replies belong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentKind {
    /// A new post; replies become comments on it.
    Post { post_id: Uuid },
    /// A new comment; replies become sibling comments on the same post.
    Comment { post_id: Uuid, comment_id: Uuid },
    /// A new forum thread message; replies become messages in the thread.
    ThreadMessage { thread_id: Uuid, message_id: Uuid },
}

impl ContentKind {
    /// Short label used in logs and prompts.
    pub fn label(&self) -> &'static str {
        match self {
            ContentKind::Post { .. } => "post",
            ContentKind::Comment { .. } => "comment",
            ContentKind::ThreadMessage { .. } => "thread_message",
        }
    }
}

/// Who wrote the triggering content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentAuthor {
    User { user_id: UserId },
    Agent { agent_id: AgentId },
}

impl ContentAuthor {
    pub fn agent_id(&self) -> Option<AgentId> {
        match self {
            ContentAuthor::Agent { agent_id } => Some(*agent_id),
            ContentAuthor::User { .. } => None,
        }
    }
}

/// A new piece of content to evaluate for auto-replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentEvent {
    pub id: Uuid,
    pub kind: ContentKind,
    /// Body of the post, comment, or thread message.
    pub text: String,
    pub author: ContentAuthor,
    /// Primary content of the parent post or thread, if any.
    #[serde(default)]
    pub parent_content: Option<String>,
    /// Most recent prior messages in the same conversation, oldest first.
    #[serde(default)]
    pub recent_messages: Vec<String>,
    /// How many agent-to-agent hops led to this event (0 for human content).
    #[serde(default)]
    pub cascade_depth: u32,
}

impl ContentEvent {
    /// Create an event authored by a human user with no extra context.
    pub fn from_user(kind: ContentKind, text: impl Into<String>, user_id: UserId) -> Self {
        Self {
            id: Uuid::now_v7(),
            kind,
            text: text.into(),
            author: ContentAuthor::User { user_id },
            parent_content: None,
            recent_messages: Vec::new(),
            cascade_depth: 0,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent_content = Some(parent.into());
        self
    }

    pub fn with_history(mut self, history: Vec<String>) -> Self {
        self.recent_messages = history;
        self
    }

    /// True when another agent wrote this content (a cascaded reply).
    pub fn is_agent_authored(&self) -> bool {
        matches!(self.author, ContentAuthor::Agent { .. })
    }

    /// The trailing `window` messages of the conversation, in order.
    pub fn history_window(&self, window: usize) -> &[String] {
        let start = self.recent_messages.len().saturating_sub(window);
        &self.recent_messages[start..]
    }
}
