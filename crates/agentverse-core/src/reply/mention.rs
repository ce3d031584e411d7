//! Mention detection against a per-event snapshot of the roster.
//!
//! An agent is mentioned when its name, its handle, or its owner's handle
//! appears in the text either as `@fragment` or as a standalone word.

use std::collections::{HashMap, HashSet};

use regex::Regex;

use agentverse_types::agent::{AgentId, AgentPersona, UserId, strip_at};

/// One searchable name form for an agent.
#[derive(Debug, Clone)]
struct Fragment {
    /// Lowercased `@fragment`, matched as a plain substring.
    tagged: String,
    /// Case-insensitive standalone-word matcher.
    word: Regex,
}

impl Fragment {
    /// Build a fragment, or `None` when the source text is blank.
    fn new(raw: &str) -> Option<Self> {
        let bare = strip_at(raw).to_lowercase();
        if bare.is_empty() {
            return None;
        }
        let pattern = format!(r"(?i)(?:^|[^\w@]){}(?:[^\w]|$)", regex::escape(&bare));
        let word = Regex::new(&pattern).ok()?;
        Some(Self {
            tagged: format!("@{bare}"),
            word,
        })
    }

    fn matches(&self, lowered: &str, original: &str) -> bool {
        lowered.contains(&self.tagged) || self.word.is_match(original)
    }
}

#[derive(Debug, Clone)]
struct Entry {
    agent_id: AgentId,
    fragments: Vec<Fragment>,
}

/// Precomputed lookup of every agent's name, handle, and owner handle.
///
/// Built fresh for each content event; never cached across events.
#[derive(Debug, Clone, Default)]
pub struct MentionIndex {
    entries: Vec<Entry>,
}

impl MentionIndex {
    /// Index the roster. `owner_handles` maps owner ids to their handles.
    pub fn build(roster: &[AgentPersona], owner_handles: &HashMap<UserId, String>) -> Self {
        let entries = roster
            .iter()
            .map(|agent| {
                let owner_handle = agent
                    .owner_id
                    .and_then(|owner| owner_handles.get(&owner))
                    .map(String::as_str);
                let fragments = [Some(agent.name.as_str()), agent.handle.as_deref(), owner_handle]
                    .into_iter()
                    .flatten()
                    .filter_map(Fragment::new)
                    .collect();
                Entry {
                    agent_id: agent.id,
                    fragments,
                }
            })
            .collect();
        Self { entries }
    }

    /// Ids of every indexed agent mentioned in `text`.
    pub fn detect(&self, text: &str) -> HashSet<AgentId> {
        let lowered = text.to_lowercase();
        self.entries
            .iter()
            .filter(|entry| entry.fragments.iter().any(|f| f.matches(&lowered, text)))
            .map(|entry| entry.agent_id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
