//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Wayfinder - chat-driven flight and hotel search
#[derive(Parser)]
#[command(
    name = "wf",
    about = "Chat-driven flight and hotel search with streaming answers",
    version,
    after_help = "Logs are written to: ~/.local/share/wayfinder/logs/wayfinder.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Ask one question and print the answer
    Ask {
        /// The question to search for
        prompt: String,

        /// Continue an existing session
        #[arg(short, long)]
        session: Option<String>,

        /// Skip the event stream and use the blocking call
        #[arg(long)]
        no_stream: bool,
    },

    /// Start an interactive chat
    Chat {
        /// Continue an existing session
        #[arg(short, long)]
        session: Option<String>,

        /// Skip the event stream and use the blocking call
        #[arg(long)]
        no_stream: bool,
    },

    /// List stored chat sessions
    Sessions,

    /// Print the messages of a session
    Show {
        /// Session id
        #[arg(value_name = "SESSION")]
        session: String,
    },
}
