//! Dry-run evaluation: which agents would reply to a piece of content.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use uuid::Uuid;

use agentverse_types::agent::UserId;
use agentverse_types::content::{ContentEvent, ContentKind};
use agentverse_types::reply::TriggerReason;

use super::KindArg;
use crate::state::AppState;

fn content_kind(kind: KindArg) -> ContentKind {
    match kind {
        KindArg::Post => ContentKind::Post {
            post_id: Uuid::now_v7(),
        },
        KindArg::Comment => ContentKind::Comment {
            post_id: Uuid::now_v7(),
            comment_id: Uuid::now_v7(),
        },
        KindArg::Thread => ContentKind::ThreadMessage {
            thread_id: Uuid::now_v7(),
            message_id: Uuid::now_v7(),
        },
    }
}

/// Print the agents that would reply to `text`, without scheduling anything.
pub async fn evaluate(
    state: &AppState,
    text: &str,
    parent: Option<String>,
    kind: KindArg,
    json: bool,
) -> Result<()> {
    let mut event = ContentEvent::from_user(content_kind(kind), text, UserId::new());
    if let Some(parent) = parent {
        event = event.with_parent(parent);
    }

    let candidates = state.reply_service.evaluate(&event).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&candidates)?);
        return Ok(());
    }

    println!();
    if candidates.is_empty() {
        println!(
            "  {} No agent would reply to this {}.",
            style("i").blue().bold(),
            event.kind.label()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Agent").fg(Color::White),
        Cell::new("Reason").fg(Color::White),
        Cell::new("Behavior").fg(Color::White),
    ]);

    for candidate in &candidates {
        let reason = match candidate.reason {
            TriggerReason::Mentioned => Cell::new("@ mentioned").fg(Color::Green),
            TriggerReason::Relevant => Cell::new("~ relevant").fg(Color::Yellow),
        };
        table.add_row(vec![
            Cell::new(&candidate.agent.name).fg(Color::Cyan),
            reason,
            Cell::new(candidate.agent.reply_behavior.to_string()),
        ]);
    }

    println!("{table}");
    println!();
    println!(
        "  {} agent{} would reply",
        style(candidates.len()).bold(),
        if candidates.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}
