//! Interactive chat session

use std::io::{self, Write};
use std::sync::Arc;

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::broadcast;
use tracing::debug;

use super::display::print_message;
use crate::domain::ContentItem;
use crate::orchestrator::{QueryEvent, QueryOrchestrator, ResultPath, SubmitError};

/// Interactive chat over one orchestrator
pub struct ChatRepl {
    orchestrator: Arc<QueryOrchestrator>,
}

enum SlashResult {
    Continue,
    Quit,
}

impl ChatRepl {
    pub fn new(orchestrator: Arc<QueryOrchestrator>) -> Self {
        Self { orchestrator }
    }

    /// Run the chat main loop
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome();

        // Create readline editor for proper line editing
        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            let readline = rl.readline(&format!("{} ", ">".bright_green()));

            match readline {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }

                    let _ = rl.add_history_entry(input);

                    if input.starts_with('/') {
                        match self.handle_slash_command(input).await {
                            SlashResult::Continue => continue,
                            SlashResult::Quit => break,
                        }
                    } else {
                        submit_and_print(&self.orchestrator, input).await?;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "Wayfinder".bright_cyan().bold());
        println!("Session: {}", self.orchestrator.session().session_id);
        println!(
            "Streaming: {}",
            if self.orchestrator.is_streaming_enabled() { "on" } else { "off" }
        );
        println!("Type {} for help, {} to quit", "/help".yellow(), "/quit".yellow());
        println!();
    }

    async fn handle_slash_command(&mut self, input: &str) -> SlashResult {
        let parts: Vec<&str> = input.split_whitespace().collect();
        let cmd = parts.first().copied().unwrap_or("");

        match cmd {
            "/help" | "/h" => {
                self.print_help();
                SlashResult::Continue
            }
            "/quit" | "/q" | "/exit" => SlashResult::Quit,
            "/stream" => {
                match parts.get(1).copied() {
                    Some("on") => self.orchestrator.set_streaming(true),
                    Some("off") => self.orchestrator.set_streaming(false),
                    Some(other) => println!("{} Expected on or off, got {}", "?".yellow(), other),
                    None => {}
                }
                let state = if self.orchestrator.is_streaming_enabled() { "on" } else { "off" };
                println!("{}", format!("Streaming is {}.", state).dimmed());
                SlashResult::Continue
            }
            "/history" => {
                match self.orchestrator.conversation_view().await {
                    Ok(messages) if messages.is_empty() => println!("{}", "No conversation history.".dimmed()),
                    Ok(messages) => messages.iter().for_each(print_message),
                    Err(e) => println!("{} {}", "Error:".red(), e),
                }
                SlashResult::Continue
            }
            _ => {
                println!("{} Unknown command: {}", "?".yellow(), cmd);
                println!("Type {} for available commands", "/help".yellow());
                SlashResult::Continue
            }
        }
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Available Commands:".bright_cyan());
        println!("  {:14} Show this help", "/help".yellow());
        println!("  {:14} Exit the chat", "/quit".yellow());
        println!("  {:14} Turn streaming on or off", "/stream on|off".yellow());
        println!("  {:14} Show conversation history", "/history".yellow());
        println!();
    }
}

/// Submit one question, echoing streamed text as it arrives
///
/// Rejections are printed rather than returned; only failures to commit the
/// answer end the session.
pub async fn submit_and_print(orchestrator: &Arc<QueryOrchestrator>, input: &str) -> Result<()> {
    debug!(input_len = input.len(), "submit_and_print: called");
    let printer = tokio::spawn(echo_stream(orchestrator.subscribe()));

    let result = orchestrator.submit(input).await;
    let streamed = if result.is_ok() {
        printer.await.unwrap_or(false)
    } else {
        // nothing will be finalized
        printer.abort();
        false
    };

    match result {
        Ok(outcome) => {
            for message in &outcome.messages {
                let already_shown = streamed
                    && outcome.path == ResultPath::Streamed
                    && matches!(message.contents.as_slice(), [ContentItem::Text { citations, .. }] if citations.is_empty());
                if !already_shown {
                    print_message(message);
                }
            }
            Ok(())
        }
        Err(e) if e.is_rejection() => {
            println!("{} {}", "?".yellow(), e);
            Ok(())
        }
        Err(SubmitError::Store(e)) => Err(eyre::eyre!("Failed to save answer: {}", e)),
        Err(e) => Err(e.into()),
    }
}

/// Print cumulative text updates as deltas. Returns whether any text was shown.
async fn echo_stream(mut events: broadcast::Receiver<QueryEvent>) -> bool {
    let mut shown = String::new();
    let mut any = false;

    loop {
        match events.recv().await {
            Ok(QueryEvent::TextUpdated { text, .. }) => {
                if let Some(delta) = text.strip_prefix(shown.as_str()) {
                    print!("{}", delta);
                } else {
                    print!("\n{}", text);
                }
                let _ = io::stdout().flush();
                shown = text;
                any = true;
            }
            Ok(QueryEvent::FallbackEngaged { .. }) => {
                if any {
                    println!();
                }
                println!("{}", "(stream interrupted, fetching the full answer)".dimmed());
                shown.clear();
                any = false;
            }
            Ok(QueryEvent::Finalized { .. }) => break,
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }

    if any {
        println!();
        println!();
    }
    any
}
