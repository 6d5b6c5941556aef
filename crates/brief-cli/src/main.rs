mod cmd;
mod output;

use clap::{Parser, Subcommand};
use cmd::session::SessionSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "taskbrief",
    about = "Compose structured prompts for AI coding agents from guided answers",
    version,
    propagate_version = true
)]
struct Cli {
    /// Session file (default: ~/.taskbrief/session.yaml)
    #[arg(long, global = true, env = "TASKBRIEF_SESSION")]
    session: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose the prompt for a flow from an answers file
    Build {
        /// Builtin flow id or path to a flow template file
        #[arg(long)]
        flow: String,

        /// Answers file: dotted field paths mapped to values
        #[arg(long)]
        answers: Option<PathBuf>,
    },

    /// Show the completeness score for the current answers
    Score {
        /// Builtin flow id or path to a flow template file
        #[arg(long)]
        flow: String,

        /// Answers file: dotted field paths mapped to values
        #[arg(long)]
        answers: Option<PathBuf>,
    },

    /// Show the generated step list
    Steps {
        /// Builtin flow id or path to a flow template file
        #[arg(long)]
        flow: String,

        /// Answers file: dotted field paths mapped to values
        #[arg(long)]
        answers: Option<PathBuf>,
    },

    /// List builtin flows and their weighted fields
    Flows,

    /// Manage the persisted session (owner identity and access token)
    Session {
        #[command(subcommand)]
        subcommand: SessionSubcommand,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let session_path = match cli.session.clone() {
        Some(path) => path,
        None => match brief_core::session::default_session_path() {
            Ok(path) => path,
            Err(e) => {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        },
    };

    let result = match cli.command {
        Commands::Build { flow, answers } => {
            cmd::build::run(&session_path, &flow, answers.as_deref(), cli.json)
        }
        Commands::Score { flow, answers } => {
            cmd::score::run(&session_path, &flow, answers.as_deref(), cli.json)
        }
        Commands::Steps { flow, answers } => {
            cmd::steps::run(&session_path, &flow, answers.as_deref(), cli.json)
        }
        Commands::Flows => cmd::flows::run(cli.json),
        Commands::Session { subcommand } => cmd::session::run(&session_path, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
