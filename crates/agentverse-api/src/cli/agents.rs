//! Roster CLI commands: list, add.

use anyhow::{Result, bail};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use agentverse_core::repository::AgentRepository;
use agentverse_types::agent::{AgentId, AgentPersona, ReplyBehavior, UserId, strip_at};

use crate::state::AppState;

/// List all agents in a colored table.
pub async fn list_agents(state: &AppState, json: bool) -> Result<()> {
    let agents = state.store.list_agents().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&agents)?);
        return Ok(());
    }

    if agents.is_empty() {
        println!();
        println!(
            "  {} No agents found. Add one with: {}",
            style("i").blue().bold(),
            style("agentverse agents add <name> <persona>").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Name").fg(Color::White),
        Cell::new("Handle").fg(Color::White),
        Cell::new("Behavior").fg(Color::White),
        Cell::new("Tone").fg(Color::White),
        Cell::new("Persona").fg(Color::White),
    ]);

    for agent in &agents {
        let behavior_cell = match agent.reply_behavior {
            ReplyBehavior::Always => Cell::new("● always").fg(Color::Green),
            ReplyBehavior::Selective => Cell::new("◐ selective").fg(Color::Yellow),
            ReplyBehavior::Never => Cell::new("○ never").fg(Color::DarkGrey),
        };

        let handle = agent
            .bare_handle()
            .map(|h| format!("@{h}"))
            .unwrap_or_else(|| "-".to_string());

        table.add_row(vec![
            Cell::new(&agent.name).fg(Color::Cyan),
            Cell::new(handle),
            behavior_cell,
            Cell::new(&agent.reply_tone),
            Cell::new(truncate_chars(&agent.persona, 50)),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} agent{}",
        style(agents.len()).bold(),
        if agents.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

/// Options for `agents add`.
pub struct AddAgent {
    pub name: String,
    pub persona: String,
    pub handle: Option<String>,
    pub behavior: String,
    pub max_reply_length: Option<u32>,
    pub tone: Option<String>,
    pub temperature: Option<f64>,
    pub owner_handle: Option<String>,
}

/// Add an agent, registering its owner handle when given.
pub async fn add_agent(state: &AppState, options: AddAgent, json: bool) -> Result<()> {
    let behavior: ReplyBehavior = options.behavior.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    if options.name.trim().is_empty() {
        bail!("agent name must not be empty");
    }

    let mut agent = AgentPersona::new(options.name.trim(), options.persona).with_behavior(behavior);
    if let Some(handle) = options.handle {
        agent = agent.with_handle(handle);
    }
    if let Some(max) = options.max_reply_length {
        agent = agent.with_max_reply_length(max);
    }
    if let Some(tone) = options.tone {
        agent.reply_tone = tone;
    }
    if let Some(temperature) = options.temperature {
        agent.temperature = temperature;
    }
    if let Some(owner_handle) = options.owner_handle {
        let owner = UserId::new();
        state
            .store
            .upsert_user(&owner, Some(strip_at(owner_handle.trim())))
            .await?;
        agent = agent.with_owner(owner);
    }

    let agent = state.store.upsert_agent(&agent).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&agent)?);
        return Ok(());
    }

    println!();
    println!("  {} Agent added", style("✓").green().bold());
    println!();
    println!("  {}  {}", style("Name:").bold(), style(&agent.name).cyan());
    if let Some(handle) = agent.bare_handle() {
        println!("  {}  @{handle}", style("Handle:").bold());
    }
    println!("  {}  {}", style("Behavior:").bold(), agent.reply_behavior);
    println!(
        "  {}  {}",
        style("ID:").bold(),
        style(agent.id.to_string()).dim()
    );
    println!();

    Ok(())
}

/// Resolve an agent by id, then name, then handle (case-insensitive).
pub async fn find_agent(state: &AppState, query: &str) -> Result<AgentPersona> {
    if let Ok(id) = query.parse::<AgentId>() {
        if let Some(agent) = state.store.get_agent(&id).await? {
            return Ok(agent);
        }
    }

    let needle = strip_at(query.trim()).to_lowercase();
    let agents = state.store.list_agents().await?;
    agents
        .into_iter()
        .find(|a| {
            a.name.to_lowercase() == needle
                || a.bare_handle().is_some_and(|h| h.to_lowercase() == needle)
        })
        .ok_or_else(|| anyhow::anyhow!("no agent matches '{query}'"))
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}
