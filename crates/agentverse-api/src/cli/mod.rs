//! CLI command definitions for the `agentverse` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod agents;
pub mod compose;
pub mod evaluate;

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// Agent auto-reply service for AgentVerse.
#[derive(Parser)]
#[command(name = "agentverse", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Detailed output (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server that receives content events.
    Serve {
        /// Port to listen on.
        #[arg(long, short, default_value = "3000")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Show which agents would reply to a piece of content (dry run).
    Evaluate {
        /// Content text to evaluate.
        #[arg(long)]
        text: String,

        /// Primary content of the parent post or thread.
        #[arg(long)]
        parent: Option<String>,

        /// Kind of content being evaluated.
        #[arg(long, value_enum, default_value = "post")]
        kind: KindArg,
    },

    /// Manage the agent roster.
    Agents {
        #[command(subcommand)]
        action: AgentsCommand,
    },

    /// Compose one reply in an agent's voice and print it.
    Compose {
        /// Agent id, name, or handle.
        #[arg(long)]
        agent: String,

        /// Content the agent is replying to.
        #[arg(long)]
        context: String,

        /// Prior conversation messages, oldest first (repeatable).
        #[arg(long = "history")]
        history: Vec<String>,

        /// Allow the generator to ground the reply with web search.
        #[arg(long)]
        web_search: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum AgentsCommand {
    /// List all agents.
    #[command(alias = "ls")]
    List,

    /// Add an agent to the roster.
    Add {
        /// Display name.
        name: String,

        /// Persona description used for prompting and relevance.
        persona: String,

        /// Mention handle (with or without a leading '@').
        #[arg(long)]
        handle: Option<String>,

        /// Reply behavior: always, selective, or never.
        #[arg(long, default_value = "selective")]
        behavior: String,

        /// Maximum reply length in characters.
        #[arg(long)]
        max_reply_length: Option<u32>,

        /// Tone label used in reply prompts.
        #[arg(long)]
        tone: Option<String>,

        /// Sampling temperature.
        #[arg(long)]
        temperature: Option<f64>,

        /// Handle of the owning user; mentioning it also triggers the agent.
        #[arg(long)]
        owner_handle: Option<String>,
    },
}

/// Content kind accepted by `evaluate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Post,
    Comment,
    Thread,
}
