//! Struct definitions and serde defaults for parsley-agent configuration.

use serde::{Deserialize, Serialize};

/// Root configuration, deserialized from `config.toml`.
///
/// Fields use serde defaults so the CLI can run with sensible defaults
/// when no config file exists.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Default model identifier (e.g. `"gpt-4.1"`).
    #[serde(default = "default_model")]
    pub model: String,
    /// Per-provider settings.
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Default provider name (e.g., "openai", "anthropic").
    #[serde(default)]
    pub default_provider: Option<String>,
    /// Inline system prompt. Ignored when `system_prompt_path` is set.
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// File to read the system prompt from.
    #[serde(default)]
    pub system_prompt_path: Option<String>,
    /// Agent loop settings.
    #[serde(default)]
    pub agent: AgentSettings,
    /// Log summarizer settings.
    #[serde(default)]
    pub summarizer: SummarizerSettings,
    /// Task backend connection.
    #[serde(default)]
    pub evergreen: EvergreenConfig,
}

/// Returns the default model identifier.
///
/// Used by serde's `#[serde(default)]` attribute during deserialization.
pub(super) fn default_model() -> String {
    crate::constants::DEFAULT_MODEL.to_string()
}

/// Provider-specific configuration map.
///
/// Each field corresponds to a supported LLM provider. Only providers
/// the user has configured will be `Some`.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ProviderConfig {
    pub openai: Option<ProviderEntry>,
    pub anthropic: Option<ProviderEntry>,
    pub ollama: Option<ProviderEntry>,
    pub openrouter: Option<ProviderEntry>,
}

/// Connection details for a single LLM provider.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderEntry {
    /// API key for authentication. Can also be set via environment variables.
    pub api_key: Option<String>,
    /// Custom base URL for the provider's API (useful for proxies or self-hosted instances).
    pub base_url: Option<String>,
}

/// `[agent]` table.
#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct AgentSettings {
    /// Tool-calling iterations before the forced final answer.
    pub max_iterations: Option<usize>,
}

/// `[summarizer]` table.
#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct SummarizerSettings {
    /// Lines per analyzed log section. Must be positive.
    pub section_size_lines: Option<usize>,
    /// Prior successful summaries shown to each section. Zero disables context.
    pub context_window: Option<usize>,
}

/// `[evergreen]` table.
#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct EvergreenConfig {
    /// REST API base URL.
    pub api_url: Option<String>,
    /// API user. Overridden by `EVERGREEN_API_USER`.
    pub api_user: Option<String>,
    /// API key. Overridden by `EVERGREEN_API_KEY`.
    pub api_key: Option<String>,
    /// Web UI base URL, used to print task links.
    pub ui_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: default_model(),
            provider: ProviderConfig::default(),
            default_provider: None,
            system_prompt: None,
            system_prompt_path: None,
            agent: AgentSettings::default(),
            summarizer: SummarizerSettings::default(),
            evergreen: EvergreenConfig::default(),
        }
    }
}
