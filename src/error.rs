//! Error taxonomy for the agent loop, tool registry, and log summarizer.
//!
//! Every variant except per-section analysis failures is fatal to the run
//! that produced it. Per-section failures never surface here; they are
//! recorded inline in the summary report instead.

use thiserror::Error;

/// Failure reported by a [`CompletionProvider`](crate::completion::CompletionProvider).
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport or API failure from the upstream service.
    #[error("completion request failed: {0}")]
    Request(#[source] anyhow::Error),
    /// The upstream response carried zero choices.
    #[error("completion returned no choices")]
    NoChoices,
}

/// Errors surfaced by the core to its caller.
#[derive(Debug, Error)]
pub enum Error {
    #[error("provider error on iteration {iteration}: {source}")]
    Provider {
        iteration: usize,
        #[source]
        source: ProviderError,
    },

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("tool already registered: {0}")]
    DuplicateTool(String),

    #[error("invalid arguments for tool {tool}: {reason}")]
    ArgumentParse { tool: String, reason: String },

    #[error("tool {tool} failed on iteration {iteration}: {source:#}")]
    ToolExecution {
        tool: String,
        iteration: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("final completion failed: {0}")]
    FinalCompletion(#[source] ProviderError),

    #[error("section size must be a positive number of lines, got {0}")]
    InvalidSectionSize(usize),

    #[error("run cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, Error>;
