use crate::output::print_json;
use anyhow::Context;
use brief_core::session::SessionRecord;
use clap::Subcommand;
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum SessionSubcommand {
    /// Persist the owner identity and access token for future runs
    Set {
        /// Account that owns the target repositories
        #[arg(long)]
        owner: String,

        /// Personal access token used in generated prompts
        #[arg(long, default_value = "")]
        token: String,
    },

    /// Show the persisted session
    Show,

    /// Delete the persisted session
    Clear,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(session_path: &Path, subcmd: SessionSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        SessionSubcommand::Set { owner, token } => set(session_path, owner, token),
        SessionSubcommand::Show => show(session_path, json),
        SessionSubcommand::Clear => clear(session_path),
    }
}

fn set(session_path: &Path, owner: String, token: String) -> anyhow::Result<()> {
    let record = SessionRecord {
        owner,
        access_token: token,
        saved_at: Some(chrono::Utc::now()),
    };
    record
        .save(session_path)
        .context("failed to save session")?;
    println!("Session saved to {}", session_path.display());
    Ok(())
}

fn show(session_path: &Path, json: bool) -> anyhow::Result<()> {
    let Some(record) = SessionRecord::load(session_path) else {
        println!("No session saved.");
        return Ok(());
    };

    if json {
        print_json(&record)?;
        return Ok(());
    }

    println!("owner: {}", record.owner);
    let token = if record.access_token.is_empty() {
        "(none)"
    } else {
        "(set)"
    };
    println!("access token: {token}");
    if let Some(at) = record.saved_at {
        println!("saved at: {}", at.to_rfc3339());
    }
    Ok(())
}

fn clear(session_path: &Path) -> anyhow::Result<()> {
    if session_path.exists() {
        std::fs::remove_file(session_path).context("failed to remove session file")?;
        println!("Session cleared.");
    } else {
        println!("No session saved.");
    }
    Ok(())
}
