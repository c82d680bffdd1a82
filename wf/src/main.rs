//! Wayfinder - chat-driven flight and hotel search
//!
//! CLI entry point for asking questions and browsing chat sessions.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info};

use wayfinder::cli::{Cli, Command};
use wayfinder::config::Config;
use wayfinder::domain::SessionContext;
use wayfinder::orchestrator::{OrchestratorConfig, QueryOrchestrator};
use wayfinder::repl::{ChatRepl, print_message, submit_and_print};
use wayfinder::search::{HttpSearchClient, SearchClient};
use wayfinder::store::ConversationStore;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("wayfinder")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("wayfinder.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    // Setup logging with priority: CLI > config > INFO default
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!(
        "Wayfinder loaded config: endpoint={}, streaming={}",
        config.search.endpoint(),
        config.streaming.enabled
    );

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Ask {
            prompt,
            session,
            no_stream,
        } => cmd_ask(&config, &prompt, session, no_stream).await,
        Command::Chat { session, no_stream } => cmd_chat(&config, session, no_stream).await,
        Command::Sessions => cmd_sessions(&config).await,
        Command::Show { session } => cmd_show(&config, &session).await,
    }
}

fn open_store(config: &Config) -> Result<ConversationStore> {
    let dir = config.storage.sessions_path();
    debug!(dir = %dir.display(), "open_store: called");
    ConversationStore::spawn(Some(dir)).context("Failed to open conversation store")
}

/// Wire an orchestrator for an existing or new session
async fn build_orchestrator(
    config: &Config,
    store: &ConversationStore,
    session: Option<String>,
    no_stream: bool,
) -> Result<Arc<QueryOrchestrator>> {
    debug!(?session, no_stream, "build_orchestrator: called");
    let session = match session {
        Some(id) => store.ensure_session(&id).await,
        None => store.create_session().await,
    }
    .context("Failed to open chat session")?;

    let client: Arc<dyn SearchClient> =
        Arc::new(HttpSearchClient::from_config(&config.search).context("Failed to create search client")?);

    let mut orchestrator_config = OrchestratorConfig::from(&config.streaming);
    if no_stream {
        orchestrator_config.streaming_enabled = false;
    }

    Ok(Arc::new(QueryOrchestrator::new(
        SessionContext::new(session.id),
        client,
        store.clone(),
        orchestrator_config,
    )))
}

/// Ask one question and print the answer
async fn cmd_ask(config: &Config, prompt: &str, session: Option<String>, no_stream: bool) -> Result<()> {
    debug!(%prompt, ?session, no_stream, "cmd_ask: called");
    let store = open_store(config)?;
    let orchestrator = build_orchestrator(config, &store, session, no_stream).await?;

    submit_and_print(&orchestrator, prompt).await?;
    println!("{}", format!("session: {}", orchestrator.session().session_id).dimmed());

    store.shutdown().await?;
    Ok(())
}

/// Run the interactive chat
async fn cmd_chat(config: &Config, session: Option<String>, no_stream: bool) -> Result<()> {
    debug!(?session, no_stream, "cmd_chat: called");
    let store = open_store(config)?;
    let orchestrator = build_orchestrator(config, &store, session, no_stream).await?;

    let mut repl = ChatRepl::new(orchestrator);
    let result = repl.run().await;

    store.shutdown().await?;
    result
}

/// List stored chat sessions
async fn cmd_sessions(config: &Config) -> Result<()> {
    debug!("cmd_sessions: called");
    let store = open_store(config)?;
    let sessions = store.list_sessions().await?;

    if sessions.is_empty() {
        println!("No chat sessions found.");
    } else {
        println!("{:<38} {:<34} {:>5} {}", "ID", "TITLE", "MSGS", "UPDATED");
        for session in &sessions {
            println!(
                "{:<38} {:<34} {:>5} {}",
                session.id,
                session.title,
                session.messages.len(),
                session.updated_at.format("%Y-%m-%d %H:%M")
            );
        }
    }

    store.shutdown().await?;
    Ok(())
}

/// Print the messages of one session
async fn cmd_show(config: &Config, id: &str) -> Result<()> {
    debug!(%id, "cmd_show: called");
    let store = open_store(config)?;
    let session = store
        .get_session_required(id)
        .await
        .context(format!("No chat session {}", id))?;

    println!("{}", session.title.bright_cyan().bold());
    println!();
    session.messages.iter().for_each(print_message);

    store.shutdown().await?;
    Ok(())
}
