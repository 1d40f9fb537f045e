//! Session management CLI operations.
//!
//! Handles listing, showing, and deleting saved sessions through the
//! `parsley session` subcommand family, with git-style partial IDs.

use anyhow::Result;
use colored::Colorize;

use super::SessionAction;
use crate::session::{SessionDoc, SessionStore};

/// Width of the preview column in `session list`.
const PREVIEW_WIDTH: usize = 60;

/// Dispatches a session subcommand to its handler.
pub(crate) fn handle_session(action: SessionAction) -> Result<()> {
    let store = SessionStore::open_default()?;
    match action {
        SessionAction::List => session_list(&store),
        SessionAction::Show { id } => {
            let full_id = store.resolve_id(&id)?;
            session_show(&store.load(&full_id)?);
            Ok(())
        }
        SessionAction::Delete { id } => {
            let full_id = store.resolve_id(&id)?;
            store.delete(&full_id)?;
            println!("Deleted session {}", short_id(&full_id).cyan());
            Ok(())
        }
    }
}

fn short_id(id: &str) -> &str {
    &id[..8.min(id.len())]
}

/// Formats an RFC 3339 timestamp as "YYYY-MM-DD HH:MM".
fn format_timestamp(ts: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(ts)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| ts.chars().take(16).collect())
}

/// First line of the stored answer, truncated for the table.
fn preview(doc: &SessionDoc) -> String {
    let line = doc.previous_conversation.lines().next().unwrap_or("");
    if line.chars().count() > PREVIEW_WIDTH {
        let truncated: String = line.chars().take(PREVIEW_WIDTH - 3).collect();
        format!("{}...", truncated)
    } else {
        line.to_string()
    }
}

/// Lists all saved sessions in a formatted table, most recent first.
fn session_list(store: &SessionStore) -> Result<()> {
    let sessions = store.list()?;
    if sessions.is_empty() {
        println!("{}", "No sessions found.".dimmed());
        println!(
            "Start one with: {}",
            "parsley ask --task-id <id> --execution <n> \"...\"".cyan()
        );
        return Ok(());
    }

    println!(
        "{} {} {}",
        format!("{:<10}", "ID").bold(),
        format!("{:<18}", "UPDATED").bold(),
        "LAST ANSWER".bold(),
    );
    println!("{}", "-".repeat(10 + 1 + 18 + 1 + PREVIEW_WIDTH));

    for s in &sessions {
        // Pad first, then colorize to avoid ANSI escape code width issues
        let id_col = format!("{:<10}", short_id(&s.id));
        let updated_col = format!("{:<18}", format_timestamp(&s.updated_at));
        println!("{} {} {}", id_col.cyan(), updated_col.dimmed(), preview(s));
    }
    println!();
    println!(
        "{} {} sessions. Continue with: {}",
        "total:".dimmed(),
        sessions.len(),
        "parsley ask --session <id> ...".cyan()
    );
    Ok(())
}

fn session_show(doc: &SessionDoc) {
    println!("{} {}", "session:".bold(), doc.id.cyan());
    println!("{} {}", "updated:".bold(), format_timestamp(&doc.updated_at));
    println!();
    println!("{}", doc.previous_conversation);
}
