//! Centralized constants for parsley-agent.
//!
//! All magic numbers, default strings, and configuration constants live here
//! so they can be changed in one place.

/// Application name used in CLI output and directory paths.
pub const APP_NAME: &str = "parsley-agent";

/// Default LLM model identifier.
pub const DEFAULT_MODEL: &str = "gpt-4.1";

/// Maximum tokens for LLM completions.
pub const MAX_TOKENS: u64 = 4096;

/// Default system prompt used when no prompt file or inline prompt is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are Parsley AI, an assistant that answers questions about Evergreen build and test tasks. \
Use the available tools to look up the task, its history, and its logs before answering. \
When you have everything you need, call end_orchestration and then answer concisely.";

/// Configuration filename.
pub const CONFIG_FILENAME: &str = "config.toml";

/// Per-project configuration filename.
pub const PROJECT_CONFIG_FILENAME: &str = "parsley-agent.toml";

/// Default LLM model identifier for Anthropic.
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-6";

/// Default LLM model identifier for OpenRouter.
pub const DEFAULT_OPENROUTER_MODEL: &str = "openai/gpt-4.1";

/// Default base URL for local Ollama server.
pub const OLLAMA_DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Default LLM model identifier for Ollama.
pub const OLLAMA_DEFAULT_MODEL: &str = "llama3";

// --- Provider defaults ---

/// Default provider when none is configured.
pub const DEFAULT_PROVIDER: &str = "openai";

// --- Agent loop ---

/// Default cap on tool-calling iterations before the forced final answer.
pub const DEFAULT_MAX_ITERATIONS: usize = 5;

/// Name of the no-op tool whose invocation ends the agent loop.
pub const END_ORCHESTRATION_TOOL: &str = "end_orchestration";

// --- Log summarizer ---

/// Default number of log lines per analyzed section.
pub const DEFAULT_SECTION_SIZE_LINES: usize = 500;

/// Default number of prior successful section summaries shown to each section.
pub const DEFAULT_CONTEXT_WINDOW: usize = 5;

// --- Usage accounting ---

/// Cost in USD per prompt (input) token.
pub const COST_PER_INPUT_TOKEN: f64 = 2.0 / 1_000_000.0;

/// Cost in USD per completion (output) token.
pub const COST_PER_OUTPUT_TOKEN: f64 = 8.0 / 1_000_000.0;

// --- Task backend ---

/// Default Evergreen REST API base URL.
pub const EVERGREEN_DEFAULT_API_URL: &str = "https://evergreen.mongodb.com";

/// Timeout for requests to the task backend, in seconds.
pub const EVERGREEN_TIMEOUT_SECS: u64 = 30;
