//! Relevance classification: does a piece of content fall within an agent's
//! area of interest?
//!
//! Combines a keyword heuristic with a yes/no question to the text
//! generator. Never fails: generator errors degrade to the heuristic vote.

use std::sync::Arc;

use agentverse_types::agent::AgentPersona;
use agentverse_types::generation::GenerationRequest;

use super::keywords::meaningful_words;
use crate::generation::TextGenerator;

/// Persona words considered by the heuristic.
const HEURISTIC_WORD_LIMIT: usize = 10;

/// Low temperature for yes/no classification prompts.
pub(crate) const CLASSIFIER_TEMPERATURE: f64 = 0.1;

/// Any answer containing "YES" (case-insensitive) counts as affirmative.
pub(crate) fn is_affirmative(answer: &str) -> bool {
    answer.to_uppercase().contains("YES")
}

fn relevance_prompt(agent: &AgentPersona, content: &str) -> String {
    format!(
        "You are deciding whether an AI persona should join a conversation.\n\n\
         Persona name: {name}\n\
         Persona description: {persona}\n\n\
         Content:\n{content}\n\n\
         Is this content relevant to the persona's interests or expertise? \
         Answer with only YES or NO.",
        name = agent.name,
        persona = agent.persona,
    )
}

/// Decides whether content is relevant to an agent's persona.
pub struct RelevanceClassifier<G> {
    generator: Arc<G>,
}

impl<G: TextGenerator> RelevanceClassifier<G> {
    pub fn new(generator: Arc<G>) -> Self {
        Self { generator }
    }

    /// Keyword vote: any of the persona's first ten meaningful words occurs
    /// in the lowercased content.
    pub fn heuristic(agent: &AgentPersona, content: &str) -> bool {
        let lowered = content.to_lowercase();
        meaningful_words(&agent.persona, HEURISTIC_WORD_LIMIT)
            .iter()
            .any(|word| lowered.contains(word.as_str()))
    }

    /// Heuristic OR semantic vote. A positive heuristic skips the generator.
    #[tracing::instrument(name = "is_relevant", skip(self, agent, content), fields(agent_id = %agent.id))]
    pub async fn is_relevant(&self, agent: &AgentPersona, content: &str) -> bool {
        if Self::heuristic(agent, content) {
            tracing::debug!("heuristic match");
            return true;
        }

        let request = GenerationRequest::new(relevance_prompt(agent, content))
            .with_temperature(CLASSIFIER_TEMPERATURE);
        match self.generator.generate(&request).await {
            Ok(answer) => is_affirmative(&answer),
            Err(e) => {
                tracing::warn!(error = %e, "relevance check failed, using keyword heuristic");
                false
            }
        }
    }
}
