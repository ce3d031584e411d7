//! AgentVerse auto-reply CLI and REST API entry point.
//!
//! Binary name: `agentverse`
//!
//! Parses CLI arguments, initializes storage and the reply pipeline, then
//! dispatches to the appropriate command handler or starts the REST API server.

mod cli;
mod http;
mod state;

use std::time::Duration;

use clap::Parser;
use clap_complete::generate;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

use agentverse_core::session::SessionKeeper;
use agentverse_observe::{TracingOptions, init_tracing, shutdown_tracing};
use agentverse_types::reply::ReplyEvent;
use agentverse_types::session::SessionSignal;

use cli::{AgentsCommand, Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need tracing or app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "agentverse", &mut std::io::stdout());
        return Ok(());
    }

    let mut tracing_options = TracingOptions::from_verbosity(cli.verbose);
    tracing_options.enable_otel = cli.otel;
    init_tracing(&tracing_options).map_err(|e| anyhow::anyhow!("tracing setup failed: {e}"))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let state = AppState::init().await?;

    match cli.command {
        Commands::Serve { port, host } => serve(state, &host, port).await?,

        Commands::Evaluate { text, parent, kind } => {
            cli::evaluate::evaluate(&state, &text, parent, kind, cli.json).await?;
        }

        Commands::Agents { action } => match action {
            AgentsCommand::List => cli::agents::list_agents(&state, cli.json).await?,
            AgentsCommand::Add {
                name,
                persona,
                handle,
                behavior,
                max_reply_length,
                tone,
                temperature,
                owner_handle,
            } => {
                let options = cli::agents::AddAgent {
                    name,
                    persona,
                    handle,
                    behavior,
                    max_reply_length,
                    tone,
                    temperature,
                    owner_handle,
                };
                cli::agents::add_agent(&state, options, cli.json).await?;
            }
        },

        Commands::Compose {
            agent,
            context,
            history,
            web_search,
        } => {
            cli::compose::compose(&state, &agent, &context, &history, web_search, cli.json)
                .await?;
        }

        Commands::Completions { .. } => unreachable!("handled before state init"),
    }

    Ok(())
}

async fn serve(mut state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    // Ensure an API key exists, print it if new
    if let Some(api_key) = http::extractors::auth::ensure_api_key(&state).await? {
        println!();
        println!(
            "  {} API key generated (save this -- it won't be shown again):",
            console::style("🔑").bold()
        );
        println!();
        println!("  {}", console::style(&api_key).yellow().bold());
        println!();
    }

    let cancel = CancellationToken::new();
    let mut background = vec![tokio::spawn(log_reply_events(
        state.bus.subscribe(),
        cancel.clone(),
    ))];

    if let Some(auth) = state.auth.clone() {
        let (tx, rx) = mpsc::channel(8);
        let keeper = SessionKeeper::from_config(auth, &state.config.session);
        background.push(tokio::spawn(keeper.run(rx, cancel.clone())));
        background.push(tokio::spawn(periodic_resume(
            tx.clone(),
            Duration::from_secs(state.config.session.check_interval_secs.max(1)),
            cancel.clone(),
        )));
        state = state.with_session_signals(tx);
    }

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!(
        "  {} AgentVerse auto-reply API listening on {}",
        console::style("⚡").bold(),
        console::style(format!("http://{addr}")).cyan()
    );
    println!(
        "  {} {}",
        console::style("Data directory:").dim(),
        console::style(state.data_dir.display()).dim()
    );
    println!("  {}", console::style("Press Ctrl+C to stop").dim());

    let reply_service = state.reply_service.clone();
    let router = http::router::build_router(state);

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    cancel.cancel();
    let dropped = reply_service.scheduler().cancel_all();
    if dropped > 0 {
        tracing::info!(dropped, "cancelled pending replies on shutdown");
    }
    for task in background {
        if let Err(e) = task.await {
            tracing::warn!(error = %e, "background task ended abnormally");
        }
    }

    served?;
    println!("\n  Server stopped.");
    Ok(())
}

/// Log reply lifecycle events until cancelled.
async fn log_reply_events(
    mut events: broadcast::Receiver<ReplyEvent>,
    cancel: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = events.recv() => event,
        };
        match event {
            Ok(ReplyEvent::Scheduled { ticket_id, agent_id, reason, delay_ms, .. }) => {
                tracing::info!(%ticket_id, %agent_id, %reason, delay_ms, "reply scheduled");
            }
            Ok(ReplyEvent::Emitted { ticket_id, agent_id, record_id }) => {
                tracing::info!(%ticket_id, %agent_id, %record_id, "reply posted");
            }
            Ok(ReplyEvent::Failed { ticket_id, agent_id, error }) => {
                tracing::warn!(%ticket_id, %agent_id, %error, "reply failed");
            }
            Ok(ReplyEvent::Cancelled { ticket_id, agent_id }) => {
                tracing::info!(%ticket_id, %agent_id, "reply cancelled");
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "reply event log lagging");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Nudge the session keeper on a fixed interval while serving.
async fn periodic_resume(
    signals: mpsc::Sender<SessionSignal>,
    every: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(every);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                if signals.send(SessionSignal::Resumed).await.is_err() {
                    break;
                }
            }
        }
    }
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
