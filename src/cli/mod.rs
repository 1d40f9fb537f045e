//! Command-line interface definition and dispatch.
//!
//! Uses [`clap`] for argument parsing with derive macros. Each subcommand is
//! routed to its handler. Session operations live in the [`session`] submodule.

mod session;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::agent::AgentLoop;
use crate::completion::{CompletionProvider, Usage};
use crate::config::Config;
use crate::conversation::build_conversation;
use crate::evergreen::{EvergreenClient, TaskSource};
use crate::provider::{self, ModelSelection, Provider};
use crate::session::SessionStore;
use crate::summarizer::{segment, LogSummarizer, SummarizerConfig};
use crate::tokens::{count_tokens, format_number};
use crate::tools::ToolRegistry;

/// Top-level CLI structure.
#[derive(Parser)]
#[command(
    name = "parsley",
    about = "Ask questions about build and test tasks, or summarize large logs"
)]
pub struct Cli {
    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
///
/// The `///` doc comments on variants double as `--help` text rendered by clap.
#[derive(Subcommand)]
pub enum Commands {
    /// Ask a question about a task
    Ask {
        /// Task identifier
        #[arg(long)]
        task_id: String,
        /// Task execution number
        #[arg(long)]
        execution: u32,
        /// Continue a previous session (supports partial IDs)
        #[arg(short, long)]
        session: Option<String>,
        /// Provider to use (openai, anthropic, openrouter, ollama)
        #[arg(short, long)]
        provider: Option<String>,
        /// Model to use (overrides config)
        #[arg(short, long)]
        model: Option<String>,
        /// The question to ask
        message: Vec<String>,
    },
    /// Summarize a local log file section by section
    Summarize {
        /// Path to the log file
        path: PathBuf,
        /// Lines per section (overrides config)
        #[arg(long)]
        section_size: Option<usize>,
        /// Prior summaries shown to each section (overrides config)
        #[arg(long)]
        context_window: Option<usize>,
        /// Provider to use (openai, anthropic, openrouter, ollama)
        #[arg(short, long)]
        provider: Option<String>,
        /// Model to use (overrides config)
        #[arg(short, long)]
        model: Option<String>,
    },
    /// Print the registered tool definitions as JSON
    Tools,
    /// List available models
    Models,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Manage saved sessions
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
}

/// Subcommands for the `config` command.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current config
    Show,
}

/// Subcommands for the `session` command.
#[derive(Subcommand)]
pub enum SessionAction {
    /// List all sessions
    List,
    /// Show a session's stored conversation (supports partial IDs)
    Show { id: String },
    /// Delete a session by ID (supports partial IDs)
    Delete { id: String },
}

/// Parses command-line arguments into a [`Cli`] struct.
///
/// Delegates to [`clap::Parser::parse`], which exits the process on invalid input.
pub fn parse() -> Cli {
    Cli::parse()
}

/// Installs the stderr tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `-v` flags raise the default `warn`.
fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Dispatches the parsed CLI command to its handler.
pub async fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose);

    match cli.command {
        Commands::Ask {
            task_id,
            execution,
            session,
            provider: provider_name,
            model,
            message,
        } => {
            let message = message.join(" ");
            if message.trim().is_empty() {
                anyhow::bail!(
                    "No message provided. Usage: parsley ask --task-id <id> --execution <n> \"your question\""
                );
            }
            let config = Config::load()?;
            let selection =
                provider::resolve_model(provider_name.as_deref(), model.as_deref(), &config)?;
            ask(&config, &selection, &task_id, execution, session, &message).await
        }
        Commands::Summarize {
            path,
            section_size,
            context_window,
            provider: provider_name,
            model,
        } => {
            let config = Config::load()?;
            let selection =
                provider::resolve_model(provider_name.as_deref(), model.as_deref(), &config)?;
            let mut sizing = config.summarizer_config();
            if let Some(n) = section_size {
                sizing.section_size_lines = n;
            }
            if let Some(n) = context_window {
                sizing.context_window = n;
            }
            summarize(&config, &selection, &path, sizing).await
        }
        Commands::Tools => {
            let config = Config::load()?;
            let selection = provider::resolve_model(None, None, &config)?;
            let provider: Arc<dyn CompletionProvider> =
                Arc::new(Provider::from_config(&config, &selection)?);
            let registry = build_registry(&config, provider)?;
            println!("{}", serde_json::to_string_pretty(registry.definitions())?);
            Ok(())
        }
        Commands::Models => {
            let config = Config::load()?;
            provider::list_models(&config).await
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let config = Config::load()?;
                let path = Config::config_path()?;
                println!("{} {}", "Config path:".bold(), path.display());
                println!();
                println!("{}", toml::to_string_pretty(&redacted(config))?);
                Ok(())
            }
        },
        Commands::Session { action } => session::handle_session(action),
    }
}

/// Wires the task backend and log summarizer into the built-in tools.
fn build_registry(
    config: &Config,
    provider: Arc<dyn CompletionProvider>,
) -> Result<ToolRegistry> {
    let source: Arc<dyn TaskSource> = Arc::new(EvergreenClient::from_config(config)?);
    let summarizer = Arc::new(LogSummarizer::new(provider, config.summarizer_config()));
    Ok(ToolRegistry::with_builtins(source, summarizer)?)
}

/// Returns a token that fires on Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n{}", "cancelling...".yellow());
            token.cancel();
        }
    });
    cancel
}

async fn ask(
    config: &Config,
    selection: &ModelSelection,
    task_id: &str,
    execution: u32,
    session: Option<String>,
    message: &str,
) -> Result<()> {
    let provider: Arc<dyn CompletionProvider> =
        Arc::new(Provider::from_config(config, selection)?);
    let registry = Arc::new(build_registry(config, Arc::clone(&provider))?);

    let store = SessionStore::open_default()?;
    let session_id = session.map(|s| store.resolve_id(&s)).transpose()?;
    let previous = match session_id.as_deref() {
        Some(id) => Some(store.load(id)?.previous_conversation),
        None => None,
    };

    let system_prompt = config.load_system_prompt(&std::env::current_dir()?)?;
    let messages = build_conversation(
        &system_prompt,
        task_id,
        execution,
        previous.as_deref(),
        message,
    );

    println!(
        "{} [model: {}] [task: {} #{}]",
        "parsley".bold().cyan(),
        selection.model.yellow(),
        task_id,
        execution,
    );
    if let Some(url) = config.task_url(task_id, execution) {
        println!("{}", url.dimmed());
    }
    println!();
    println!("{} {}", ">".green().bold(), message);
    println!();

    let cancel = cancel_on_ctrl_c();
    let agent = AgentLoop::new(provider, registry, config.agent_config());
    let outcome = agent.run(messages, &cancel).await?;

    println!("{}", outcome.answer);
    println!();

    let doc = store.upsert(session_id.as_deref(), &outcome.answer)?;
    println!(
        "{}",
        format!(
            "iterations: {}  tools: {}  {}",
            outcome.iterations,
            outcome.tool_invocations,
            usage_line(&outcome.usage)
        )
        .dimmed()
    );
    println!("{} {}", "session:".dimmed(), doc.id.cyan());
    Ok(())
}

async fn summarize(
    config: &Config,
    selection: &ModelSelection,
    path: &Path,
    sizing: SummarizerConfig,
) -> Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read log file {:?}", path))?;

    let sections = segment(&raw, sizing.section_size_lines)?;
    let largest = sections
        .iter()
        .map(|s| count_tokens(s.content))
        .max()
        .unwrap_or(0);
    if let Some(limit) = crate::models::context_window_for(&selection.model) {
        if largest > limit {
            eprintln!(
                "{} largest section is ~{} tokens, above {}'s {} token context",
                "warning:".yellow(),
                format_number(largest),
                selection.model,
                format_number(limit)
            );
        }
    }

    eprintln!(
        "{} {} sections of up to {} lines [model: {}]",
        "summarizing".bold().cyan(),
        sections.len(),
        sizing.section_size_lines,
        selection.model.yellow()
    );

    let provider: Arc<dyn CompletionProvider> =
        Arc::new(Provider::from_config(config, selection)?);
    let summarizer = LogSummarizer::new(provider, sizing);
    let cancel = cancel_on_ctrl_c();
    let report = summarizer.summarize(&raw, &cancel).await?;

    println!("{}", report.text);
    println!();
    println!(
        "{}",
        format!(
            "sections: {}  failed: {}  log tokens: {}  {}",
            report.results.len(),
            report.failed_sections(),
            format_number(count_tokens(&raw)),
            usage_line(&report.usage)
        )
        .dimmed()
    );
    Ok(())
}

fn usage_line(usage: &Usage) -> String {
    format!(
        "tokens: {} in / {} out  cost: ${:.4}",
        format_number(usage.prompt_tokens as usize),
        format_number(usage.completion_tokens as usize),
        usage.cost_usd()
    )
}

/// Masks secrets before the config is printed.
fn redacted(mut config: Config) -> Config {
    const MASK: &str = "********";
    for entry in [
        &mut config.provider.openai,
        &mut config.provider.anthropic,
        &mut config.provider.openrouter,
        &mut config.provider.ollama,
    ]
    .into_iter()
    .flatten()
    {
        if entry.api_key.as_deref().is_some_and(|k| !k.is_empty()) {
            entry.api_key = Some(MASK.to_string());
        }
    }
    if config.evergreen.api_key.as_deref().is_some_and(|k| !k.is_empty()) {
        config.evergreen.api_key = Some(MASK.to_string());
    }
    config
}
