//! Auto-reply service: the entry point that turns a new content event into
//! scheduled agent replies.
//!
//! Runs after the triggering post, comment, or message has already been
//! stored, so nothing here is ever surfaced to its author as an error.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use futures_util::future::BoxFuture;
use uuid::Uuid;

use agentverse_types::agent::{AgentPersona, UserId};
use agentverse_types::config::GlobalConfig;
use agentverse_types::content::{ContentAuthor, ContentEvent, ContentKind};
use agentverse_types::error::RepositoryError;
use agentverse_types::reply::{NewComment, NewThreadMessage, ReplyCandidate};

use super::cascade::CascadeGuard;
use super::engine::ReplyDecisionEngine;
use super::mention::MentionIndex;
use super::scheduler::{ReplyScheduler, ScheduledReply};
use crate::event::ReplyEventBus;
use crate::generation::TextGenerator;
use crate::repository::{AgentRepository, ContentRepository};

/// Roster and mention index captured for one decision cycle.
#[derive(Debug, Clone)]
pub struct RosterSnapshot {
    pub roster: Vec<AgentPersona>,
    pub index: MentionIndex,
}

/// Evaluates content events and schedules agent replies.
pub struct AutoReplyService<A, C, G> {
    agents: Arc<A>,
    content: Arc<C>,
    engine: ReplyDecisionEngine<G>,
    scheduler: ReplyScheduler,
    /// `None` when cascading replies are disabled.
    cascade: Option<CascadeGuard>,
}

impl<A, C, G> AutoReplyService<A, C, G>
where
    A: AgentRepository + 'static,
    C: ContentRepository + 'static,
    G: TextGenerator + 'static,
{
    pub fn new(
        agents: Arc<A>,
        content: Arc<C>,
        generator: Arc<G>,
        config: &GlobalConfig,
        bus: ReplyEventBus,
    ) -> Self {
        let cascade = config
            .cascade
            .enabled
            .then(|| CascadeGuard::from_config(&config.cascade));
        Self {
            agents,
            content,
            engine: ReplyDecisionEngine::new(generator, config.replies.clone()),
            scheduler: ReplyScheduler::from_config(&config.replies, bus),
            cascade,
        }
    }

    pub fn scheduler(&self) -> &ReplyScheduler {
        &self.scheduler
    }

    pub fn engine(&self) -> &ReplyDecisionEngine<G> {
        &self.engine
    }

    /// Load the roster and build a fresh mention index.
    ///
    /// A failed owner-handle lookup only drops owner-handle mentions.
    pub async fn snapshot(&self) -> Result<RosterSnapshot, RepositoryError> {
        let roster = self.agents.list_agents().await?;
        let owners: Vec<UserId> = roster
            .iter()
            .filter_map(|a| a.owner_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let owner_handles = match self.agents.owner_handles(&owners).await {
            Ok(handles) => handles,
            Err(e) => {
                tracing::warn!(error = %e, "owner handle lookup failed, continuing without them");
                Default::default()
            }
        };
        let index = MentionIndex::build(&roster, &owner_handles);
        Ok(RosterSnapshot { roster, index })
    }

    /// Dry run: which agents would reply to `event`, without scheduling.
    pub async fn evaluate(&self, event: &ContentEvent) -> Result<Vec<ReplyCandidate>, RepositoryError> {
        let snapshot = self.snapshot().await?;
        Ok(self
            .engine
            .select_candidates(event, &snapshot.roster, &snapshot.index)
            .await)
    }

    /// Evaluate `event` and schedule one delayed reply per candidate.
    ///
    /// Errors are logged and yield no tickets.
    pub async fn handle_event(self: &Arc<Self>, event: ContentEvent) -> Vec<ScheduledReply> {
        let event_id = event.id;
        match self.try_handle_event(event).await {
            Ok(tickets) => tickets,
            Err(e) => {
                tracing::error!(%event_id, error = %e, "auto-reply evaluation failed");
                Vec::new()
            }
        }
    }

    /// Like [`handle_event`](Self::handle_event) but surfaces roster errors.
    #[tracing::instrument(
        name = "handle_content_event",
        skip_all,
        fields(event_id = %event.id, kind = event.kind.label(), depth = event.cascade_depth)
    )]
    pub async fn try_handle_event(
        self: &Arc<Self>,
        mut event: ContentEvent,
    ) -> Result<Vec<ScheduledReply>, RepositoryError> {
        if let Some(guard) = &self.cascade {
            if let Err(rejection) = guard.check_depth(event.cascade_depth) {
                tracing::debug!(%rejection, "cascade stopped");
                return Ok(Vec::new());
            }
        }

        self.fill_thread_history(&mut event).await;

        let snapshot = self.snapshot().await?;
        let mut candidates = self
            .engine
            .select_candidates(&event, &snapshot.roster, &snapshot.index)
            .await;

        if let (Some(author), Some(guard)) = (event.author.agent_id(), &self.cascade) {
            candidates.retain(|c| match guard.check_pair(author, c.agent.id) {
                Ok(()) => true,
                Err(rejection) => {
                    tracing::debug!(%rejection, "cascade reply skipped");
                    false
                }
            });
        }

        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let event = Arc::new(event);
        let snapshot = Arc::new(snapshot);
        let tickets = candidates
            .into_iter()
            .map(|candidate| {
                let svc = Arc::clone(self);
                let event = Arc::clone(&event);
                let snapshot = Arc::clone(&snapshot);
                let agent_id = candidate.agent.id;
                let reason = candidate.reason;
                self.scheduler
                    .schedule(event.id, agent_id, reason, move || async move {
                        svc.reply(candidate, &event, &snapshot).await
                    })
            })
            .collect();
        Ok(tickets)
    }

    async fn reply(
        self: &Arc<Self>,
        candidate: ReplyCandidate,
        event: &ContentEvent,
        snapshot: &RosterSnapshot,
    ) -> Result<Uuid, RepositoryError> {
        let text = self
            .engine
            .prepare_reply(&candidate, event, &snapshot.roster)
            .await;
        let record_id = self.emit(&candidate.agent, event, &text).await?;
        self.maybe_cascade(event, &candidate.agent, record_id, text, &snapshot.index);
        Ok(record_id)
    }

    async fn emit(
        &self,
        agent: &AgentPersona,
        event: &ContentEvent,
        text: &str,
    ) -> Result<Uuid, RepositoryError> {
        let id = Uuid::now_v7();
        let created_at = Utc::now();
        match &event.kind {
            ContentKind::Post { post_id } | ContentKind::Comment { post_id, .. } => {
                self.content
                    .insert_comment(&NewComment {
                        id,
                        post_id: *post_id,
                        agent_id: agent.id,
                        content: text.to_string(),
                        created_at,
                    })
                    .await
            }
            ContentKind::ThreadMessage { thread_id, .. } => {
                self.content
                    .insert_thread_message(&NewThreadMessage {
                        id,
                        thread_id: *thread_id,
                        agent_id: agent.id,
                        content: text.to_string(),
                        created_at,
                    })
                    .await
            }
        }
    }

    async fn fill_thread_history(&self, event: &mut ContentEvent) {
        let ContentKind::ThreadMessage { thread_id, .. } = event.kind else {
            return;
        };
        if !event.recent_messages.is_empty() {
            return;
        }
        let window = self.engine.config().effective_history_window();
        match self.content.recent_thread_messages(&thread_id, window).await {
            Ok(history) => event.recent_messages = history,
            Err(e) => tracing::warn!(%thread_id, error = %e, "thread history unavailable"),
        }
    }

    /// Re-submit an emitted reply that mentions other agents.
    fn maybe_cascade(
        self: &Arc<Self>,
        event: &ContentEvent,
        agent: &AgentPersona,
        record_id: Uuid,
        text: String,
        index: &MentionIndex,
    ) {
        let Some(guard) = &self.cascade else {
            return;
        };
        let depth = event.cascade_depth + 1;
        if guard.check_depth(depth).is_err() {
            return;
        }
        if index.detect(&text).iter().all(|id| *id == agent.id) {
            return;
        }

        let next = cascaded_event(event, agent, record_id, text, depth);
        tracing::debug!(agent_id = %agent.id, depth, "cascading reply");
        tokio::spawn(Arc::clone(self).cascade(next));
    }

    fn cascade(self: Arc<Self>, event: ContentEvent) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            self.handle_event(event).await;
        })
    }
}

/// The event describing an agent's emitted reply, one hop deeper.
fn cascaded_event(
    source: &ContentEvent,
    agent: &AgentPersona,
    record_id: Uuid,
    text: String,
    depth: u32,
) -> ContentEvent {
    let (kind, parent_content, mut recent_messages) = match &source.kind {
        ContentKind::Post { post_id } => (
            ContentKind::Comment {
                post_id: *post_id,
                comment_id: record_id,
            },
            Some(source.text.clone()),
            Vec::new(),
        ),
        ContentKind::Comment { post_id, .. } => (
            ContentKind::Comment {
                post_id: *post_id,
                comment_id: record_id,
            },
            source.parent_content.clone(),
            source.recent_messages.clone(),
        ),
        ContentKind::ThreadMessage { thread_id, .. } => (
            ContentKind::ThreadMessage {
                thread_id: *thread_id,
                message_id: record_id,
            },
            source.parent_content.clone(),
            source.recent_messages.clone(),
        ),
    };
    if !matches!(source.kind, ContentKind::Post { .. }) {
        recent_messages.push(source.text.clone());
    }

    ContentEvent {
        id: record_id,
        kind,
        text,
        author: ContentAuthor::Agent { agent_id: agent.id },
        parent_content,
        recent_messages,
        cascade_depth: depth,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use agentverse_types::agent::ReplyBehavior;
    use agentverse_types::config::{CascadeConfig, ReplyConfig};
    use agentverse_types::reply::ReplyEvent;

    use crate::testing::{InMemoryAgents, InMemoryContent, ScriptedGenerator};

    type TestService = AutoReplyService<InMemoryAgents, InMemoryContent, ScriptedGenerator>;

    fn config(cascade: bool) -> GlobalConfig {
        GlobalConfig {
            replies: ReplyConfig {
                min_delay_ms: 1_000,
                max_delay_ms: 1_000,
                peer_mentions: false,
                ..ReplyConfig::default()
            },
            cascade: CascadeConfig {
                enabled: cascade,
                ..CascadeConfig::default()
            },
            ..GlobalConfig::default()
        }
    }

    fn service(
        roster: Vec<AgentPersona>,
        generator: ScriptedGenerator,
        config: &GlobalConfig,
    ) -> (Arc<TestService>, Arc<InMemoryContent>) {
        let content = Arc::new(InMemoryContent::default());
        let svc = AutoReplyService::new(
            Arc::new(InMemoryAgents::with_roster(roster)),
            content.clone(),
            Arc::new(generator),
            config,
            ReplyEventBus::new(64),
        );
        (Arc::new(svc), content)
    }

    fn post(text: &str) -> ContentEvent {
        ContentEvent::from_user(
            ContentKind::Post {
                post_id: Uuid::now_v7(),
            },
            text,
            UserId::new(),
        )
    }

    async fn join_all(tickets: Vec<ScheduledReply>) {
        for ticket in tickets {
            ticket.join().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn mentioned_agent_replies_and_never_agent_stays_silent() {
        let helper = AgentPersona::new("HelperBot", "Summaries").with_behavior(ReplyBehavior::Always);
        let news = AgentPersona::new("NewsBot", "summarize breaking news").with_behavior(ReplyBehavior::Never);
        let (svc, content) = service(
            vec![helper.clone(), news],
            ScriptedGenerator::always("This post argues for shorter meetings."),
            &config(false),
        );
        let event = post("@HelperBot can you summarize this?");
        let post_id = match event.kind {
            ContentKind::Post { post_id } => post_id,
            _ => unreachable!(),
        };

        let tickets = svc.handle_event(event).await;
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].agent_id, helper.id);
        assert_eq!(svc.scheduler().pending(), 1);
        join_all(tickets).await;

        let comments = content.comments.lock().unwrap().clone();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].agent_id, helper.id);
        assert_eq!(comments[0].post_id, post_id);
        assert_eq!(comments[0].content, "This post argues for shorter meetings.");
    }

    #[tokio::test(start_paused = true)]
    async fn one_failed_emit_does_not_block_others() {
        let a = AgentPersona::new("Alpha", "x");
        let b = AgentPersona::new("Beta", "y");
        let (svc, content) = service(
            vec![a.clone(), b.clone()],
            ScriptedGenerator::always("On it: the answer is yes."),
            &config(false),
        );
        content.failing_agents.lock().unwrap().push(a.id);
        let mut events = svc.scheduler().bus().subscribe();

        let tickets = svc.handle_event(post("@Alpha @Beta thoughts?")).await;
        assert_eq!(tickets.len(), 2);
        join_all(tickets).await;

        let comments = content.comments.lock().unwrap().clone();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].agent_id, b.id);

        let mut failed = 0;
        while let Ok(event) = events.try_recv() {
            if let ReplyEvent::Failed { agent_id, .. } = event {
                assert_eq!(agent_id, a.id);
                failed += 1;
            }
        }
        assert_eq!(failed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn thread_replies_use_stored_history() {
        let helper = AgentPersona::new("HelperBot", "threads");
        let generator = ScriptedGenerator::always("Agreed with the earlier point.");
        let (svc, content) = service(vec![helper.clone()], generator, &config(false));
        let thread_id = Uuid::now_v7();
        content
            .history
            .lock()
            .unwrap()
            .insert(thread_id, vec!["earlier point about caching".to_string()]);

        let event = ContentEvent::from_user(
            ContentKind::ThreadMessage {
                thread_id,
                message_id: Uuid::now_v7(),
            },
            "@HelperBot do you agree?",
            UserId::new(),
        );
        join_all(svc.handle_event(event).await).await;

        let messages = content.messages.lock().unwrap().clone();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].thread_id, thread_id);
        assert_eq!(content.comment_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn owner_handle_mentions_trigger_reply() {
        let owner = UserId::new();
        let chef = AgentPersona::new("Chef", "cooking").with_owner(owner);
        let agents = Arc::new(InMemoryAgents::with_roster(vec![chef.clone()]));
        agents.add_owner(owner, "@maria");
        let content = Arc::new(InMemoryContent::default());
        let svc = Arc::new(AutoReplyService::new(
            agents,
            content.clone(),
            Arc::new(ScriptedGenerator::always("Use fresh basil.")),
            &config(false),
            ReplyEventBus::new(16),
        ));

        let candidates = svc.evaluate(&post("@maria what herbs?")).await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].agent.id, chef.id);
    }

    #[tokio::test(start_paused = true)]
    async fn cascade_lets_mentioned_agent_answer_once() {
        let helper = AgentPersona::new("HelperBot", "general help");
        let tides = AgentPersona::new("TideBot", "oceans");
        let generator = ScriptedGenerator::from_fn(|req| {
            if req.prompt.contains("You are HelperBot") {
                Ok("Ask @TideBot about that.".to_string())
            } else {
                Ok("Tides follow the moon.".to_string())
            }
        });
        let (svc, content) = service(vec![helper.clone(), tides.clone()], generator, &config(true));

        join_all(svc.handle_event(post("@HelperBot why are there tides?")).await).await;
        tokio::time::sleep(Duration::from_secs(30)).await;

        let comments = content.comments.lock().unwrap().clone();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].agent_id, helper.id);
        assert_eq!(comments[1].agent_id, tides.id);
    }

    #[tokio::test(start_paused = true)]
    async fn cascade_depth_stops_ping_pong() {
        let ping = AgentPersona::new("Ping", "games");
        let pong = AgentPersona::new("Pong", "games");
        let generator = ScriptedGenerator::from_fn(|req| {
            if req.prompt.contains("You are Ping") {
                Ok("@Pong your turn.".to_string())
            } else {
                Ok("@Ping your turn.".to_string())
            }
        });
        let (svc, content) = service(vec![ping, pong], generator, &config(true));

        join_all(svc.handle_event(post("@Ping start")).await).await;
        tokio::time::sleep(Duration::from_secs(60)).await;

        // Human post -> Ping (depth 0) -> Pong (depth 1) -> Ping (depth 2).
        assert_eq!(content.comment_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cascade_disabled_emits_only_direct_replies() {
        let helper = AgentPersona::new("HelperBot", "general help");
        let tides = AgentPersona::new("TideBot", "oceans");
        let (svc, content) = service(
            vec![helper, tides],
            ScriptedGenerator::always("Ask @TideBot about that."),
            &config(false),
        );
        join_all(svc.handle_event(post("@HelperBot tides?")).await).await;
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(content.comment_count(), 1);
    }

    #[test]
    fn cascaded_event_from_post_uses_post_as_main_content() {
        let agent = AgentPersona::new("HelperBot", "x");
        let source = post("Original post body");
        let record = Uuid::now_v7();
        let next = cascaded_event(&source, &agent, record, "@Other hi".into(), 1);
        assert_eq!(next.parent_content.as_deref(), Some("Original post body"));
        assert_eq!(next.author.agent_id(), Some(agent.id));
        assert_eq!(next.cascade_depth, 1);
        assert!(matches!(next.kind, ContentKind::Comment { comment_id, .. } if comment_id == record));
        assert!(next.recent_messages.is_empty());
    }
}
