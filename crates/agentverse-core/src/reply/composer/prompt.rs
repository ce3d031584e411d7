//! Reply prompt construction.

use agentverse_types::agent::AgentPersona;

use super::cleanup::STALLING_PHRASES;

/// Keywords that signal the user wants current or external information.
pub const WEB_SEARCH_KEYWORDS: &[&str] = &[
    "search",
    "google",
    "look up",
    "lookup",
    "browse",
    "find online",
    "on the web",
    "internet",
    "latest news",
    "current events",
];

/// True when the text asks for a web lookup.
pub fn web_search_requested(text: &str) -> bool {
    let lowered = text.to_lowercase();
    WEB_SEARCH_KEYWORDS.iter().any(|k| lowered.contains(k))
}

const BEHAVIOR_RULES: &str = "\
Rules:
- If the context includes \"Main content\", base your answer on it.
- Answer directly with concrete information. Never defer or promise to follow up later.
- No greetings, no sign-offs, no \"hope this helps\".
- Stay in character and keep it conversational.";

const WEB_SEARCH_RULE: &str = "\
- The user is asking for current or external information. You may and should use \
web search to find accurate, up-to-date facts before answering.";

/// Everything that goes into one reply prompt.
#[derive(Debug, Clone, Copy)]
pub struct ReplyPrompt<'a> {
    pub agent: &'a AgentPersona,
    pub context: &'a str,
    pub history: &'a [String],
    pub max_length: usize,
    pub allow_web_search: bool,
}

impl ReplyPrompt<'_> {
    /// The standard reply prompt.
    pub fn render(&self) -> String {
        let mut prompt = format!(
            "You are {name}, an AI persona on a social platform.\n\
             Persona: {persona}\n\
             Tone: {tone}\n\
             Keep your reply under {max} characters.\n\n\
             Context:\n{context}\n",
            name = self.agent.name,
            persona = self.agent.persona,
            tone = self.agent.reply_tone,
            max = self.max_length,
            context = self.context,
        );

        if !self.history.is_empty() {
            prompt.push_str("\nRecent conversation:\n");
            prompt.push_str(&self.history.join("\n"));
            prompt.push('\n');
        }

        prompt.push('\n');
        prompt.push_str(BEHAVIOR_RULES);
        if self.allow_web_search {
            prompt.push('\n');
            prompt.push_str(WEB_SEARCH_RULE);
        }
        prompt.push_str("\n\nWrite your reply now.");
        prompt
    }

    /// The standard prompt plus an explicit ban on stalling phrases.
    pub fn render_strict(&self) -> String {
        let banned = STALLING_PHRASES
            .iter()
            .map(|p| format!("\"{p}\""))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "{}\n\nIMPORTANT: Your previous draft stalled instead of answering. \
             Give the final answer right now in this message. Do not use any of: {banned}.",
            self.render()
        )
    }
}
