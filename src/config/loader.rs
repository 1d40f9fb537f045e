//! File loading and merging for configuration.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use super::types::{
    default_model, AgentSettings, Config, EvergreenConfig, ProviderConfig, SummarizerSettings,
};

impl Config {
    /// Loads the global config from `~/.config/parsley-agent/config.toml`.
    ///
    /// If no config file exists, creates one with sensible defaults
    /// (including `{env:VAR}` placeholders for secrets) and returns it.
    pub(super) fn load_global() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            let default_toml = format!(
                r#"model = "{}"
default_provider = "{}"

[provider.openai]
api_key = "{{env:OPENAI_API_KEY}}"

[provider.anthropic]
api_key = "{{env:ANTHROPIC_API_KEY}}"

[provider.openrouter]
api_key = "{{env:OPENROUTER_API_KEY}}"

[provider.ollama]
base_url = "{}"

[agent]
max_iterations = {}

[summarizer]
section_size_lines = {}
context_window = {}

[evergreen]
api_url = "{}"
api_user = "{{env:EVERGREEN_API_USER}}"
api_key = "{{env:EVERGREEN_API_KEY}}"
"#,
                default_model(),
                crate::constants::DEFAULT_PROVIDER,
                crate::constants::OLLAMA_DEFAULT_BASE_URL,
                crate::constants::DEFAULT_MAX_ITERATIONS,
                crate::constants::DEFAULT_SECTION_SIZE_LINES,
                crate::constants::DEFAULT_CONTEXT_WINDOW,
                crate::constants::EVERGREEN_DEFAULT_API_URL,
            );
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, &default_toml)
                .with_context(|| format!("Failed to write default config to {:?}", path))?;
            tracing::info!(path = %path.display(), "wrote default config");
            let config: Config = toml::from_str(&default_toml)
                .with_context(|| "Failed to parse default config".to_string())?;
            return Ok(config);
        }

        Self::load_file(&path)
    }

    /// Reads and parses one config file.
    pub(super) fn load_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config at {:?}", path))?;
        Ok(config)
    }

    /// Look for `parsley-agent.toml` in `start`, then walk up to the git root.
    pub(super) fn load_project(start: &Path) -> Result<Option<Config>> {
        let mut dir = start.to_path_buf();
        loop {
            let candidate = dir.join(crate::constants::PROJECT_CONFIG_FILENAME);
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "using project config");
                return Self::load_file(&candidate).map(Some);
            }
            // Stop at git root or filesystem root
            if dir.join(".git").exists() || !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Merge project config over global config.
    /// Project values win when present.
    pub(super) fn merge(global: Config, project: Config) -> Config {
        Config {
            model: if project.model != default_model() {
                project.model
            } else {
                global.model
            },
            provider: ProviderConfig {
                openai: project.provider.openai.or(global.provider.openai),
                anthropic: project.provider.anthropic.or(global.provider.anthropic),
                ollama: project.provider.ollama.or(global.provider.ollama),
                openrouter: project.provider.openrouter.or(global.provider.openrouter),
            },
            default_provider: project.default_provider.or(global.default_provider),
            system_prompt: project.system_prompt.or(global.system_prompt),
            system_prompt_path: project.system_prompt_path.or(global.system_prompt_path),
            agent: AgentSettings {
                max_iterations: project
                    .agent
                    .max_iterations
                    .or(global.agent.max_iterations),
            },
            summarizer: SummarizerSettings {
                section_size_lines: project
                    .summarizer
                    .section_size_lines
                    .or(global.summarizer.section_size_lines),
                context_window: project
                    .summarizer
                    .context_window
                    .or(global.summarizer.context_window),
            },
            evergreen: EvergreenConfig {
                api_url: project.evergreen.api_url.or(global.evergreen.api_url),
                api_user: project.evergreen.api_user.or(global.evergreen.api_user),
                api_key: project.evergreen.api_key.or(global.evergreen.api_key),
                ui_url: project.evergreen.ui_url.or(global.evergreen.ui_url),
            },
        }
    }
}
