//! Environment variable substitution and setting resolution.

use anyhow::{Context, Result};
use std::path::Path;

use super::types::{Config, ProviderEntry};
use crate::agent::AgentConfig;
use crate::constants::{
    DEFAULT_CONTEXT_WINDOW, DEFAULT_MAX_ITERATIONS, DEFAULT_SECTION_SIZE_LINES,
    DEFAULT_SYSTEM_PROMPT, EVERGREEN_DEFAULT_API_URL, OLLAMA_DEFAULT_BASE_URL,
};
use crate::summarizer::SummarizerConfig;

impl Config {
    /// Resolve {env:VAR_NAME} patterns in string fields.
    pub(super) fn resolve_substitutions(&mut self) {
        self.model = Self::resolve_str(&self.model);
        for field in [
            &mut self.system_prompt,
            &mut self.system_prompt_path,
            &mut self.default_provider,
            &mut self.evergreen.api_url,
            &mut self.evergreen.api_user,
            &mut self.evergreen.api_key,
            &mut self.evergreen.ui_url,
        ] {
            if let Some(value) = field {
                *value = Self::resolve_str(value);
            }
        }
        Self::resolve_provider_entry(&mut self.provider.openai);
        Self::resolve_provider_entry(&mut self.provider.anthropic);
        Self::resolve_provider_entry(&mut self.provider.ollama);
        Self::resolve_provider_entry(&mut self.provider.openrouter);
    }

    /// Resolves `{env:VAR}` patterns in a single provider entry's `api_key` and `base_url`.
    fn resolve_provider_entry(entry: &mut Option<ProviderEntry>) {
        if let Some(ref mut e) = entry {
            if let Some(ref mut key) = e.api_key {
                *key = Self::resolve_str(key);
            }
            if let Some(ref mut url) = e.base_url {
                *url = Self::resolve_str(url);
            }
        }
    }

    /// Replace {env:VAR} with the environment variable value.
    pub(super) fn resolve_str(s: &str) -> String {
        let mut result = s.to_string();
        while let Some(start) = result.find("{env:") {
            if let Some(end) = result[start..].find('}') {
                let var_name = &result[start + 5..start + end];
                let value = std::env::var(var_name).unwrap_or_default();
                result = format!(
                    "{}{}{}",
                    &result[..start],
                    value,
                    &result[start + end + 1..]
                );
            } else {
                break;
            }
        }
        result
    }

    /// Non-empty environment variable, if set.
    fn env_value(name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|v| !v.is_empty())
    }

    /// Resolve API key for a provider: env var first, then config value.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        // OPENAI_API_KEY, ANTHROPIC_API_KEY, etc.
        if let Some(val) = Self::env_value(&format!("{}_API_KEY", provider.to_uppercase())) {
            return Some(val);
        }

        let entry = match provider {
            "openai" => &self.provider.openai,
            "anthropic" => &self.provider.anthropic,
            "ollama" => &self.provider.ollama,
            "openrouter" => &self.provider.openrouter,
            _ => &None,
        };
        entry
            .as_ref()
            .and_then(|e| e.api_key.clone())
            .filter(|k| !k.is_empty())
    }

    /// Base URL of the local Ollama server.
    pub fn ollama_base_url(&self) -> &str {
        self.provider
            .ollama
            .as_ref()
            .and_then(|o| o.base_url.as_deref())
            .filter(|u| !u.is_empty())
            .unwrap_or(OLLAMA_DEFAULT_BASE_URL)
    }

    /// Get the configured default provider name, if any.
    pub fn provider_name(&self) -> Option<&str> {
        self.default_provider.as_deref().filter(|p| !p.is_empty())
    }

    /// Get the model name from config, stripping provider prefix if present.
    /// Returns None if the model is the compile-time default (meaning user hasn't configured it).
    pub fn model_name(&self) -> Option<String> {
        let m = &self.model;
        if m == crate::constants::DEFAULT_MODEL {
            return None;
        }
        if let Some((_prov, model)) = m.split_once('/') {
            Some(model.to_string())
        } else {
            Some(m.to_string())
        }
    }

    /// Evergreen API user: `EVERGREEN_API_USER`, then config.
    pub fn resolve_evergreen_user(&self) -> Option<String> {
        Self::env_value("EVERGREEN_API_USER")
            .or_else(|| self.evergreen.api_user.clone().filter(|u| !u.is_empty()))
    }

    /// Evergreen API key: `EVERGREEN_API_KEY`, then config.
    pub fn resolve_evergreen_key(&self) -> Option<String> {
        Self::env_value("EVERGREEN_API_KEY")
            .or_else(|| self.evergreen.api_key.clone().filter(|k| !k.is_empty()))
    }

    /// Evergreen REST API base URL without a trailing slash.
    pub fn evergreen_api_url(&self) -> &str {
        self.evergreen
            .api_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .unwrap_or(EVERGREEN_DEFAULT_API_URL)
            .trim_end_matches('/')
    }

    /// Web UI link for a task execution, when `ui_url` is configured.
    pub fn task_url(&self, task_id: &str, execution: u32) -> Option<String> {
        self.evergreen
            .ui_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .map(|base| format!("{}/task/{task_id}/{execution}", base.trim_end_matches('/')))
    }

    /// Agent loop settings with defaults applied.
    pub fn agent_config(&self) -> AgentConfig {
        AgentConfig {
            max_iterations: self.agent.max_iterations.unwrap_or(DEFAULT_MAX_ITERATIONS),
            ..AgentConfig::default()
        }
    }

    /// Summarizer sizing with defaults applied.
    pub fn summarizer_config(&self) -> SummarizerConfig {
        SummarizerConfig {
            section_size_lines: self
                .summarizer
                .section_size_lines
                .unwrap_or(DEFAULT_SECTION_SIZE_LINES),
            context_window: self
                .summarizer
                .context_window
                .unwrap_or(DEFAULT_CONTEXT_WINDOW),
        }
    }

    /// The agent's system prompt.
    ///
    /// Read from `system_prompt_path` when set (relative paths resolve
    /// against `base_dir`), otherwise the inline `system_prompt`, otherwise
    /// the built-in default.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt file cannot be read.
    pub fn load_system_prompt(&self, base_dir: &Path) -> Result<String> {
        if let Some(path) = self.system_prompt_path.as_deref().filter(|p| !p.is_empty()) {
            let path = base_dir.join(path);
            let prompt = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
            return Ok(prompt);
        }
        Ok(self
            .system_prompt
            .clone()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()))
    }
}
