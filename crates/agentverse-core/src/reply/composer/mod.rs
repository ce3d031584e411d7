//! Reply composition in an agent's voice.
//!
//! `ResponseComposer::compose` never fails. Generator errors become a short
//! placeholder naming the agent, so callers always have something to post.

pub mod cleanup;
pub mod prompt;

use std::sync::Arc;

use agentverse_types::agent::{AgentPersona, DEFAULT_MAX_REPLY_LENGTH};
use agentverse_types::generation::{GenerationError, GenerationRequest};

use crate::generation::TextGenerator;

pub use cleanup::{clean_response, contains_filler, enforce_length};
pub use prompt::{ReplyPrompt, web_search_requested};

/// Placeholder used when text generation has no credential configured.
pub fn unconfigured_placeholder(agent: &AgentPersona) -> String {
    format!(
        "{} can't reply yet: text generation isn't configured.",
        agent.name
    )
}

/// Placeholder used for every other generation failure.
pub fn fallback_placeholder(agent: &AgentPersona) -> String {
    format!("{} is thinking this over and will share more soon.", agent.name)
}

/// Composes replies for agents through a [`TextGenerator`].
pub struct ResponseComposer<G> {
    generator: Arc<G>,
    default_max_length: usize,
}

impl<G: TextGenerator> ResponseComposer<G> {
    pub fn new(generator: Arc<G>) -> Self {
        Self {
            generator,
            default_max_length: DEFAULT_MAX_REPLY_LENGTH as usize,
        }
    }

    /// Cap used for agents without their own `max_reply_length`.
    pub fn with_default_max_length(mut self, max: usize) -> Self {
        self.default_max_length = max;
        self
    }

    /// The character cap that applies to `agent`.
    pub fn max_length_for(&self, agent: &AgentPersona) -> usize {
        agent
            .max_reply_length
            .map(|m| m as usize)
            .unwrap_or(self.default_max_length)
    }

    /// Compose a cleaned, length-capped reply.
    ///
    /// A reply that still stalls after cleanup is regenerated exactly once
    /// with a stricter prompt; that second result is used as-is after cleanup.
    #[tracing::instrument(
        name = "compose_reply",
        skip(self, agent, context, history),
        fields(agent_id = %agent.id, history_len = history.len())
    )]
    pub async fn compose(
        &self,
        agent: &AgentPersona,
        context: &str,
        history: &[String],
        allow_web_search: bool,
    ) -> String {
        let max_length = self.max_length_for(agent);
        let prompt = ReplyPrompt {
            agent,
            context,
            history,
            max_length,
            allow_web_search,
        };

        let first = match self.generate(agent, prompt.render(), allow_web_search).await {
            Ok(raw) => clean_response(&raw),
            Err(e) => {
                tracing::warn!(error = %e, "reply generation failed");
                return enforce_length(&placeholder_for(agent, &e), max_length);
            }
        };

        let reply = if contains_filler(&first) {
            tracing::debug!("stalling phrase in reply, regenerating with strict prompt");
            match self
                .generate(agent, prompt.render_strict(), allow_web_search)
                .await
            {
                Ok(raw) => clean_response(&raw),
                Err(e) => {
                    tracing::warn!(error = %e, "strict regeneration failed, keeping first reply");
                    first
                }
            }
        } else {
            first
        };

        if reply.is_empty() {
            tracing::warn!("reply was empty after cleanup");
            return enforce_length(&fallback_placeholder(agent), max_length);
        }

        enforce_length(&reply, max_length)
    }

    async fn generate(
        &self,
        agent: &AgentPersona,
        prompt: String,
        allow_web_search: bool,
    ) -> Result<String, GenerationError> {
        let request = GenerationRequest::new(prompt)
            .with_temperature(agent.temperature)
            .with_web_search(allow_web_search);
        self.generator.generate(&request).await
    }
}

fn placeholder_for(agent: &AgentPersona, err: &GenerationError) -> String {
    if err.is_configuration() {
        unconfigured_placeholder(agent)
    } else {
        fallback_placeholder(agent)
    }
}
