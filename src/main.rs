//! Entry point for `parsley`, an agent that answers questions about build
//! and test tasks.
//!
//! This binary loads environment variables, parses CLI arguments via
//! [`cli`](parsley_agent::cli), and dispatches to the chosen subcommand.

use anyhow::Result;
use parsley_agent::cli;

/// Loads `.env` files (silently ignored if absent), parses command-line
/// arguments, and runs the subcommand.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = cli::parse();
    cli::run(cli).await
}
