//! Compose a single reply in an agent's voice.

use anyhow::Result;
use console::style;

use agentverse_core::reply::composer::web_search_requested;

use super::agents::find_agent;
use crate::state::AppState;

/// Compose and print a reply; nothing is stored.
///
/// Web search is enabled by `--web-search` or when the context asks for
/// current information.
pub async fn compose(
    state: &AppState,
    agent: &str,
    context: &str,
    history: &[String],
    web_search: bool,
    json: bool,
) -> Result<()> {
    let agent = find_agent(state, agent).await?;
    let allow_web_search = web_search || web_search_requested(context);

    let reply = state
        .reply_service
        .engine()
        .composer()
        .compose(&agent, context, history, allow_web_search)
        .await;

    if json {
        let out = serde_json::json!({
            "agent_id": agent.id,
            "agent": agent.name,
            "web_search": allow_web_search,
            "reply": reply,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!("  {} {}", style(&agent.name).cyan().bold(), style("replies:").dim());
    println!();
    println!("  {reply}");
    println!();

    Ok(())
}
