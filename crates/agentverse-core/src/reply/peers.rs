//! Peer discovery: which other agents would find a topic worth discussing
//! with a given agent.

use std::collections::HashSet;
use std::sync::Arc;

use futures_util::future::join_all;

use agentverse_types::agent::{AgentId, AgentPersona};
use agentverse_types::generation::GenerationRequest;

use super::keywords::shares_meaningful_word;
use super::relevance::{CLASSIFIER_TEMPERATURE, is_affirmative};
use crate::generation::TextGenerator;

/// Maximum peer tags prepended to one reply.
pub const MAX_PEER_TAGS: usize = 2;

/// How an agent is referenced in text: `@handle`, or `@name` without one.
pub fn mention_tag(agent: &AgentPersona) -> String {
    match agent.bare_handle() {
        Some(handle) => format!("@{handle}"),
        None => format!("@{}", agent.name.trim()),
    }
}

/// Up to [`MAX_PEER_TAGS`] tags for `peers`, in roster order.
pub fn peer_tags(roster: &[AgentPersona], peers: &HashSet<AgentId>) -> Vec<String> {
    roster
        .iter()
        .filter(|a| peers.contains(&a.id))
        .take(MAX_PEER_TAGS)
        .map(mention_tag)
        .collect()
}

fn peer_prompt(agent: &AgentPersona, other: &AgentPersona, topic: &str) -> String {
    format!(
        "Two AI personas are on a social platform.\n\n\
         Persona A: {a_name}: {a_persona}\n\
         Persona B: {b_name}: {b_persona}\n\n\
         Topic:\n{topic}\n\n\
         Would these two personas find this topic mutually interesting to discuss? \
         Answer with only YES or NO.",
        a_name = agent.name,
        a_persona = agent.persona,
        b_name = other.name,
        b_persona = other.persona,
    )
}

/// Finds complementary agents for a topic.
pub struct PeerDiscovery<G> {
    generator: Arc<G>,
}

impl<G: TextGenerator> PeerDiscovery<G> {
    pub fn new(generator: Arc<G>) -> Self {
        Self { generator }
    }

    /// Ids of every other roster agent judged a peer for `topic`.
    ///
    /// Pairings are evaluated concurrently. A failed pairing falls back to
    /// whether the two personas share a meaningful word.
    #[tracing::instrument(name = "find_peers", skip_all, fields(agent_id = %agent.id))]
    pub async fn find_peers(
        &self,
        agent: &AgentPersona,
        roster: &[AgentPersona],
        topic: &str,
    ) -> HashSet<AgentId> {
        let checks = roster
            .iter()
            .filter(|other| other.id != agent.id)
            .map(|other| async move {
                let request = GenerationRequest::new(peer_prompt(agent, other, topic))
                    .with_temperature(CLASSIFIER_TEMPERATURE);
                let is_peer = match self.generator.generate(&request).await {
                    Ok(answer) => is_affirmative(&answer),
                    Err(e) => {
                        tracing::debug!(peer_id = %other.id, error = %e, "peer check failed, using shared-word fallback");
                        shares_meaningful_word(&agent.persona, &other.persona)
                    }
                };
                is_peer.then_some(other.id)
            });

        join_all(checks).await.into_iter().flatten().collect()
    }
}
