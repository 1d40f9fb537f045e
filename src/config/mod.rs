//! Configuration types and path resolution.
//!
//! Settings live as TOML at the platform's XDG config path
//! (e.g. `~/.config/parsley-agent/config.toml` on Linux), with an optional
//! per-project `parsley-agent.toml` layered on top. Sessions are stored under
//! the XDG data directory (`~/.local/share/parsley-agent/`).

mod loader;
mod paths;
mod resolve;
mod types;

pub use types::{
    AgentSettings, Config, EvergreenConfig, ProviderConfig, ProviderEntry, SummarizerSettings,
};

use anyhow::Result;

impl Config {
    /// Load config with precedence: project > global > defaults.
    /// Creates default config file if none exists.
    pub fn load() -> Result<Self> {
        let global = Self::load_global()?;
        let project = Self::load_project(&std::env::current_dir()?)?;

        let mut config = global;
        if let Some(proj) = project {
            config = Self::merge(config, proj);
        }

        config.resolve_substitutions();
        Ok(config)
    }
}
