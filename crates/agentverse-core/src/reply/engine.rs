//! Reply decision engine: who replies to a content event, and with what.
//!
//! One pass per event, no state carried between events. Selection runs the
//! mention and relevance paths and then gates on reply behavior; preparation
//! composes the reply and optionally tags complementary peers.

use std::sync::Arc;

use futures_util::future::join_all;

use agentverse_types::agent::{AgentPersona, ReplyBehavior};
use agentverse_types::config::ReplyConfig;
use agentverse_types::content::ContentEvent;
use agentverse_types::reply::{ReplyCandidate, TriggerReason};

use super::composer::{ResponseComposer, enforce_length, web_search_requested};
use super::mention::MentionIndex;
use super::peers::{PeerDiscovery, peer_tags};
use super::relevance::RelevanceClassifier;
use crate::generation::TextGenerator;

/// Whether an agent with `behavior` may reply for `reason`.
pub fn passes_gate(behavior: ReplyBehavior, reason: TriggerReason) -> bool {
    match behavior {
        ReplyBehavior::Never => false,
        ReplyBehavior::Selective => reason == TriggerReason::Mentioned,
        ReplyBehavior::Always => true,
    }
}

/// Context block handed to the composer for one candidate.
pub fn reply_context(event: &ContentEvent, reason: TriggerReason) -> String {
    let mut parts = Vec::with_capacity(2);
    if let Some(parent) = event.parent_content.as_deref().filter(|p| !p.trim().is_empty()) {
        parts.push(format!("Main content: {parent}"));
    }
    parts.push(match reason {
        TriggerReason::Mentioned => format!("You were mentioned in: {}", event.text),
        TriggerReason::Relevant => format!("This relates to your expertise: {}", event.text),
    });
    parts.join("\n\n")
}

/// Selects reply candidates and prepares their replies.
pub struct ReplyDecisionEngine<G> {
    relevance: RelevanceClassifier<G>,
    composer: ResponseComposer<G>,
    peers: PeerDiscovery<G>,
    config: ReplyConfig,
}

impl<G: TextGenerator> ReplyDecisionEngine<G> {
    pub fn new(generator: Arc<G>, config: ReplyConfig) -> Self {
        Self {
            relevance: RelevanceClassifier::new(generator.clone()),
            composer: ResponseComposer::new(generator.clone())
                .with_default_max_length(config.default_max_reply_length as usize),
            peers: PeerDiscovery::new(generator),
            config,
        }
    }

    pub fn composer(&self) -> &ResponseComposer<G> {
        &self.composer
    }

    pub fn config(&self) -> &ReplyConfig {
        &self.config
    }

    /// Final candidate set for `event`, in roster order.
    ///
    /// Mentioned agents are always considered. Relevance is only checked for
    /// unmentioned `always` agents, and never for cascaded events (depth > 0),
    /// which only reach agents they mention. The authoring agent is never a
    /// candidate.
    #[tracing::instrument(
        name = "select_candidates",
        skip_all,
        fields(event_id = %event.id, kind = event.kind.label(), roster_len = roster.len())
    )]
    pub async fn select_candidates(
        &self,
        event: &ContentEvent,
        roster: &[AgentPersona],
        index: &MentionIndex,
    ) -> Vec<ReplyCandidate> {
        let mentioned = index.detect(&event.text);
        let author = event.author.agent_id();
        let relevance_allowed = event.cascade_depth == 0;

        let decisions = roster
            .iter()
            .filter(|agent| Some(agent.id) != author)
            .map(|agent| {
                let is_mentioned = mentioned.contains(&agent.id);
                async move {
                    if is_mentioned {
                        return Some(TriggerReason::Mentioned);
                    }
                    if relevance_allowed
                        && agent.reply_behavior == ReplyBehavior::Always
                        && self.relevance.is_relevant(agent, &event.text).await
                    {
                        return Some(TriggerReason::Relevant);
                    }
                    None
                }
            });
        let reasons = join_all(decisions).await;

        let candidates: Vec<ReplyCandidate> = roster
            .iter()
            .filter(|agent| Some(agent.id) != author)
            .zip(reasons)
            .filter_map(|(agent, reason)| {
                let reason = reason?;
                passes_gate(agent.reply_behavior, reason)
                    .then(|| ReplyCandidate::new(agent.clone(), reason))
            })
            .collect();

        tracing::debug!(
            mentioned = mentioned.len(),
            candidates = candidates.len(),
            "candidates selected"
        );
        candidates
    }

    /// Compose the final reply text for one candidate.
    #[tracing::instrument(
        name = "prepare_reply",
        skip_all,
        fields(agent_id = %candidate.agent.id, reason = %candidate.reason)
    )]
    pub async fn prepare_reply(
        &self,
        candidate: &ReplyCandidate,
        event: &ContentEvent,
        roster: &[AgentPersona],
    ) -> String {
        let agent = &candidate.agent;
        let context = reply_context(event, candidate.reason);
        let history = event.history_window(self.config.effective_history_window());
        let allow_web_search = web_search_requested(&event.text);

        let reply = self
            .composer
            .compose(agent, &context, history, allow_web_search)
            .await;

        if !self.config.peer_mentions {
            return reply;
        }

        let peers = self.peers.find_peers(agent, roster, &event.text).await;
        let tags = peer_tags(roster, &peers);
        if tags.is_empty() {
            return reply;
        }
        let annotated = format!("{} {}", tags.join(" "), reply);
        enforce_length(&annotated, self.composer.max_length_for(agent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use agentverse_types::agent::{AgentId, UserId};
    use agentverse_types::content::{ContentAuthor, ContentKind};
    use agentverse_types::generation::GenerationError;
    use uuid::Uuid;

    use crate::testing::ScriptedGenerator;

    fn post(text: &str) -> ContentEvent {
        ContentEvent::from_user(
            ContentKind::Post {
                post_id: Uuid::now_v7(),
            },
            text,
            UserId::new(),
        )
    }

    fn no_peers_config() -> ReplyConfig {
        ReplyConfig {
            peer_mentions: false,
            ..ReplyConfig::default()
        }
    }

    fn engine(generator: ScriptedGenerator, config: ReplyConfig) -> ReplyDecisionEngine<ScriptedGenerator> {
        ReplyDecisionEngine::new(Arc::new(generator), config)
    }

    fn ids(candidates: &[ReplyCandidate]) -> Vec<AgentId> {
        candidates.iter().map(|c| c.agent.id).collect()
    }

    #[test]
    fn gate_table() {
        use ReplyBehavior::*;
        use TriggerReason::*;
        assert!(!passes_gate(Never, Mentioned));
        assert!(!passes_gate(Never, Relevant));
        assert!(passes_gate(Selective, Mentioned));
        assert!(!passes_gate(Selective, Relevant));
        assert!(passes_gate(Always, Mentioned));
        assert!(passes_gate(Always, Relevant));
    }

    #[tokio::test]
    async fn mentioned_helper_replies_but_never_agent_does_not() {
        let helper = AgentPersona::new("HelperBot", "Summaries of long discussions")
            .with_behavior(ReplyBehavior::Always);
        let news = AgentPersona::new("NewsBot", "summarize breaking news stories")
            .with_behavior(ReplyBehavior::Never);
        let roster = vec![helper.clone(), news];
        let index = MentionIndex::build(&roster, &HashMap::new());
        let engine = engine(ScriptedGenerator::always("YES"), no_peers_config());

        let candidates = engine
            .select_candidates(&post("@HelperBot can you summarize this?"), &roster, &index)
            .await;
        assert_eq!(ids(&candidates), vec![helper.id]);
        assert_eq!(candidates[0].reason, TriggerReason::Mentioned);
    }

    #[tokio::test]
    async fn never_agent_is_excluded_even_when_mentioned() {
        let silent = AgentPersona::new("Silent", "quiet").with_behavior(ReplyBehavior::Never);
        let roster = vec![silent];
        let index = MentionIndex::build(&roster, &HashMap::new());
        let engine = engine(ScriptedGenerator::always("YES"), no_peers_config());
        let candidates = engine
            .select_candidates(&post("hey @Silent"), &roster, &index)
            .await;
        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn selective_agent_only_via_mention() {
        let picky = AgentPersona::new("Picky", "astronomy and telescopes")
            .with_behavior(ReplyBehavior::Selective);
        let roster = vec![picky.clone()];
        let index = MentionIndex::build(&roster, &HashMap::new());
        let generator = Arc::new(ScriptedGenerator::always("YES"));
        let engine = ReplyDecisionEngine::new(generator.clone(), no_peers_config());

        let relevant_only = engine
            .select_candidates(&post("New telescopes announced"), &roster, &index)
            .await;
        assert!(relevant_only.is_empty());
        assert_eq!(generator.call_count(), 0, "selective agents are not classified");

        let mentioned = engine
            .select_candidates(&post("@Picky thoughts?"), &roster, &index)
            .await;
        assert_eq!(ids(&mentioned), vec![picky.id]);
    }

    #[tokio::test]
    async fn always_agent_selected_by_relevance_in_roster_order() {
        let a = AgentPersona::new("Astro", "astronomy and telescopes").with_behavior(ReplyBehavior::Always);
        let b = AgentPersona::new("Chef", "pasta recipes").with_behavior(ReplyBehavior::Always);
        let c = AgentPersona::new("Stars", "telescopes for beginners").with_behavior(ReplyBehavior::Always);
        let roster = vec![a.clone(), b, c.clone()];
        let index = MentionIndex::build(&roster, &HashMap::new());
        let engine = engine(ScriptedGenerator::always("NO"), no_peers_config());

        let candidates = engine
            .select_candidates(&post("Which telescopes are worth buying?"), &roster, &index)
            .await;
        assert_eq!(ids(&candidates), vec![a.id, c.id]);
        assert!(candidates.iter().all(|c| c.reason == TriggerReason::Relevant));
    }

    #[tokio::test]
    async fn mention_wins_over_relevance() {
        let a = AgentPersona::new("Astro", "astronomy and telescopes").with_behavior(ReplyBehavior::Always);
        let roster = vec![a.clone()];
        let index = MentionIndex::build(&roster, &HashMap::new());
        let engine = engine(ScriptedGenerator::always("YES"), no_peers_config());
        let candidates = engine
            .select_candidates(&post("@Astro telescopes?"), &roster, &index)
            .await;
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].reason, TriggerReason::Mentioned);
    }

    #[tokio::test]
    async fn relevance_still_works_without_credential() {
        let a = AgentPersona::new("Astro", "astronomy and telescopes").with_behavior(ReplyBehavior::Always);
        let b = AgentPersona::new("Chef", "pasta recipes").with_behavior(ReplyBehavior::Always);
        let roster = vec![a.clone(), b];
        let index = MentionIndex::build(&roster, &HashMap::new());
        let engine = engine(
            ScriptedGenerator::failing(GenerationError::Configuration("no key".into())),
            no_peers_config(),
        );
        let candidates = engine
            .select_candidates(&post("astronomy night"), &roster, &index)
            .await;
        assert_eq!(ids(&candidates), vec![a.id]);
    }

    #[tokio::test]
    async fn cascaded_events_skip_relevance_and_author() {
        let author = AgentPersona::new("Astro", "astronomy").with_behavior(ReplyBehavior::Always);
        let other = AgentPersona::new("Stars", "astronomy").with_behavior(ReplyBehavior::Always);
        let roster = vec![author.clone(), other.clone()];
        let index = MentionIndex::build(&roster, &HashMap::new());
        let engine = engine(ScriptedGenerator::always("YES"), no_peers_config());

        let mut event = post("@Astro astronomy rocks, right?");
        event.author = ContentAuthor::Agent { agent_id: author.id };
        event.cascade_depth = 1;
        assert!(engine.select_candidates(&event, &roster, &index).await.is_empty());

        event.text = "@Stars astronomy rocks".to_string();
        let candidates = engine.select_candidates(&event, &roster, &index).await;
        assert_eq!(ids(&candidates), vec![other.id]);
    }

    #[tokio::test]
    async fn agent_post_at_depth_zero_gets_relevance_replies() {
        let poster = AgentPersona::new("Poster", "daily news digests").with_behavior(ReplyBehavior::Always);
        let astro = AgentPersona::new("Orbit", "astronomy").with_behavior(ReplyBehavior::Always);
        let roster = vec![poster.clone(), astro.clone()];
        let index = MentionIndex::build(&roster, &HashMap::new());
        let engine = engine(ScriptedGenerator::always("YES"), no_peers_config());

        let mut event = post("New telescopes announced");
        event.author = ContentAuthor::Agent { agent_id: poster.id };

        let candidates = engine.select_candidates(&event, &roster, &index).await;
        assert_eq!(ids(&candidates), vec![astro.id]);
        assert_eq!(candidates[0].reason, TriggerReason::Relevant);
    }

    #[test]
    fn context_includes_parent_and_reason() {
        let event = post("@HelperBot summarize?").with_parent("Long article about tides");
        let mentioned = reply_context(&event, TriggerReason::Mentioned);
        assert!(mentioned.starts_with("Main content: Long article about tides"));
        assert!(mentioned.ends_with("You were mentioned in: @HelperBot summarize?"));

        let relevant = reply_context(&post("tides"), TriggerReason::Relevant);
        assert_eq!(relevant, "This relates to your expertise: tides");
    }

    #[tokio::test]
    async fn prepare_reply_passes_history_window() {
        let helper = AgentPersona::new("HelperBot", "summaries");
        let roster = vec![helper.clone()];
        let generator = Arc::new(ScriptedGenerator::always("Here is the gist."));
        let engine = ReplyDecisionEngine::new(generator.clone(), no_peers_config());
        let history: Vec<String> = (0..12).map(|i| format!("msg-{i:02}")).collect();
        let event = post("@HelperBot gist?").with_history(history);

        let candidate = ReplyCandidate::new(helper, TriggerReason::Mentioned);
        let reply = engine.prepare_reply(&candidate, &event, &roster).await;
        assert_eq!(reply, "Here is the gist.");

        let prompt = &generator.calls()[0].prompt;
        assert!(!prompt.contains("msg-01"));
        assert!(prompt.contains("msg-02"));
        assert!(prompt.contains("msg-11"));
    }

    #[tokio::test]
    async fn history_window_never_exceeds_ten_messages() {
        let helper = AgentPersona::new("HelperBot", "summaries");
        let roster = vec![helper.clone()];
        let generator = Arc::new(ScriptedGenerator::always("Here is the gist."));
        let config = ReplyConfig {
            history_window: 50,
            ..no_peers_config()
        };
        let engine = ReplyDecisionEngine::new(generator.clone(), config);
        let history: Vec<String> = (0..30).map(|i| format!("msg-{i:02}")).collect();
        let event = post("@HelperBot gist?").with_history(history);

        let candidate = ReplyCandidate::new(helper, TriggerReason::Mentioned);
        engine.prepare_reply(&candidate, &event, &roster).await;

        let prompt = &generator.calls()[0].prompt;
        let included = (0..30)
            .filter(|i| prompt.contains(&format!("msg-{i:02}")))
            .count();
        assert_eq!(included, 10);
        assert!(prompt.contains("msg-20"));
        assert!(!prompt.contains("msg-19"));
    }

    #[tokio::test]
    async fn prepare_reply_prepends_at_most_two_peer_tags() {
        let helper = AgentPersona::new("HelperBot", "summaries").with_max_reply_length(40);
        let p1 = AgentPersona::new("PeerOne", "x").with_handle("one");
        let p2 = AgentPersona::new("PeerTwo", "y");
        let p3 = AgentPersona::new("PeerThree", "z");
        let roster = vec![helper.clone(), p1, p2, p3];
        let engine = engine(ScriptedGenerator::always("YES"), ReplyConfig::default());

        let candidate = ReplyCandidate::new(helper, TriggerReason::Mentioned);
        let reply = engine
            .prepare_reply(&candidate, &post("@HelperBot hi"), &roster)
            .await;
        assert!(reply.starts_with("@one @PeerTwo YES"));
        assert!(!reply.contains("PeerThree"));
        assert!(reply.chars().count() <= 40);
    }

    #[tokio::test]
    async fn peer_annotation_respects_length_cap() {
        let helper = AgentPersona::new("HelperBot", "summaries").with_max_reply_length(20);
        let peer = AgentPersona::new("AVeryLongPeerName", "x");
        let roster = vec![helper.clone(), peer];
        let engine = engine(ScriptedGenerator::always("YES indeed this is long"), ReplyConfig::default());
        let candidate = ReplyCandidate::new(helper, TriggerReason::Mentioned);
        let reply = engine
            .prepare_reply(&candidate, &post("@HelperBot hi"), &roster)
            .await;
        assert_eq!(reply.chars().count(), 20);
        assert!(reply.ends_with("..."));
    }
}
