//! Hand-written test doubles shared by the core unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use uuid::Uuid;

use agentverse_types::agent::{AgentId, AgentPersona, UserId};
use agentverse_types::error::RepositoryError;
use agentverse_types::generation::{GenerationError, GenerationRequest};
use agentverse_types::reply::{NewComment, NewThreadMessage};

use crate::generation::TextGenerator;
use crate::repository::{AgentRepository, ContentRepository};

type Rule = Box<dyn Fn(&GenerationRequest) -> Result<String, GenerationError> + Send + Sync>;

/// Generator whose answers are decided by a closure over the request.
pub(crate) struct ScriptedGenerator {
    rule: Rule,
    calls: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub(crate) fn from_fn<F>(rule: F) -> Self
    where
        F: Fn(&GenerationRequest) -> Result<String, GenerationError> + Send + Sync + 'static,
    {
        Self {
            rule: Box::new(rule),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn always(text: &str) -> Self {
        let text = text.to_string();
        Self::from_fn(move |_| Ok(text.clone()))
    }

    pub(crate) fn failing(err: GenerationError) -> Self {
        Self::from_fn(move |_| Err(err.clone()))
    }

    /// Answers in order; the last answer repeats once the script runs out.
    pub(crate) fn sequence(answers: Vec<Result<String, GenerationError>>) -> Self {
        let answers = Mutex::new(answers.into_iter().collect::<std::collections::VecDeque<_>>());
        Self::from_fn(move |_| {
            let mut queue = answers.lock().unwrap();
            if queue.len() > 1 {
                queue.pop_front().unwrap()
            } else {
                queue.front().cloned().unwrap()
            }
        })
    }

    pub(crate) fn calls(&self) -> Vec<GenerationRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl TextGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.calls.lock().unwrap().push(request.clone());
        (self.rule)(request)
    }
}

#[derive(Default)]
pub(crate) struct InMemoryAgents {
    pub(crate) agents: Mutex<Vec<AgentPersona>>,
    pub(crate) owners: Mutex<HashMap<UserId, String>>,
}

impl InMemoryAgents {
    pub(crate) fn with_roster(roster: Vec<AgentPersona>) -> Self {
        Self {
            agents: Mutex::new(roster),
            owners: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn add_owner(&self, owner: UserId, handle: &str) {
        self.owners.lock().unwrap().insert(owner, handle.to_string());
    }
}

impl AgentRepository for InMemoryAgents {
    async fn list_agents(&self) -> Result<Vec<AgentPersona>, RepositoryError> {
        Ok(self.agents.lock().unwrap().clone())
    }

    async fn owner_handles(
        &self,
        owners: &[UserId],
    ) -> Result<HashMap<UserId, String>, RepositoryError> {
        let all = self.owners.lock().unwrap();
        Ok(owners
            .iter()
            .filter_map(|id| all.get(id).map(|h| (*id, h.clone())))
            .collect())
    }

    async fn get_agent(&self, id: &AgentId) -> Result<Option<AgentPersona>, RepositoryError> {
        Ok(self
            .agents
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == *id)
            .cloned())
    }

    async fn upsert_agent(&self, agent: &AgentPersona) -> Result<AgentPersona, RepositoryError> {
        let mut agents = self.agents.lock().unwrap();
        match agents.iter_mut().find(|a| a.id == agent.id) {
            Some(existing) => *existing = agent.clone(),
            None => agents.push(agent.clone()),
        }
        Ok(agent.clone())
    }
}

#[derive(Default)]
pub(crate) struct InMemoryContent {
    pub(crate) comments: Mutex<Vec<NewComment>>,
    pub(crate) messages: Mutex<Vec<NewThreadMessage>>,
    pub(crate) history: Mutex<HashMap<Uuid, Vec<String>>>,
    /// Inserts by these agents fail with a query error.
    pub(crate) failing_agents: Mutex<Vec<AgentId>>,
}

impl InMemoryContent {
    fn check(&self, agent_id: &AgentId) -> Result<(), RepositoryError> {
        if self.failing_agents.lock().unwrap().contains(agent_id) {
            return Err(RepositoryError::Query("insert rejected".to_string()));
        }
        Ok(())
    }

    pub(crate) fn comment_count(&self) -> usize {
        self.comments.lock().unwrap().len()
    }
}

impl ContentRepository for InMemoryContent {
    async fn insert_comment(&self, comment: &NewComment) -> Result<Uuid, RepositoryError> {
        self.check(&comment.agent_id)?;
        self.comments.lock().unwrap().push(comment.clone());
        Ok(comment.id)
    }

    async fn insert_thread_message(
        &self,
        message: &NewThreadMessage,
    ) -> Result<Uuid, RepositoryError> {
        self.check(&message.agent_id)?;
        self.messages.lock().unwrap().push(message.clone());
        Ok(message.id)
    }

    async fn recent_thread_messages(
        &self,
        thread_id: &Uuid,
        limit: usize,
    ) -> Result<Vec<String>, RepositoryError> {
        let history = self.history.lock().unwrap();
        let all = history.get(thread_id).cloned().unwrap_or_default();
        let start = all.len().saturating_sub(limit);
        Ok(all[start..].to_vec())
    }
}
