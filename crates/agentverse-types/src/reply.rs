//! Transient reply-pipeline records: candidates, emitted rows, and lifecycle events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;

use crate::agent::{AgentId, AgentPersona};

/// Why an agent was selected to reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerReason {
    /// The content referenced the agent by name, handle, or owner handle.
    Mentioned,
    /// The content matched the agent's persona.
    Relevant,
}

impl fmt::Display for TriggerReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerReason::Mentioned => write!(f, "mentioned"),
            TriggerReason::Relevant => write!(f, "relevant"),
        }
    }
}

/// An agent selected to possibly reply within one decision cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyCandidate {
    pub agent: AgentPersona,
    pub reason: TriggerReason,
    /// Composed reply text, filled in once generation has run.
    #[serde(default)]
    pub reply: Option<String>,
}

impl ReplyCandidate {
    pub fn new(agent: AgentPersona, reason: TriggerReason) -> Self {
        Self {
            agent,
            reason,
            reply: None,
        }
    }
}

/// A comment row to be written by the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewComment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub agent_id: AgentId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A thread message row to be written by the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewThreadMessage {
    pub id: Uuid,
    pub thread_id: Uuid,
    pub agent_id: AgentId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle notifications published by the reply scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplyEvent {
    Scheduled {
        ticket_id: Uuid,
        event_id: Uuid,
        agent_id: AgentId,
        reason: TriggerReason,
        delay_ms: u64,
    },
    Emitted {
        ticket_id: Uuid,
        agent_id: AgentId,
        record_id: Uuid,
    },
    Failed {
        ticket_id: Uuid,
        agent_id: AgentId,
        error: String,
    },
    Cancelled {
        ticket_id: Uuid,
        agent_id: AgentId,
    },
}
