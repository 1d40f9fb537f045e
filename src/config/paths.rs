//! Where parsley keeps its global config file and saved sessions.
//!
//! Both live under the platform's per-user directories, namespaced by
//! [`APP_NAME`]. Project config is found separately by walking up from the
//! working directory (see `loader.rs`).

use std::path::PathBuf;

use anyhow::{Context, Result};

use super::types::Config;
use crate::constants::{APP_NAME, CONFIG_FILENAME};

const SESSIONS_DIRNAME: &str = "sessions";

fn app_dir(base: Option<PathBuf>, kind: &str) -> Result<PathBuf> {
    base.map(|dir| dir.join(APP_NAME))
        .with_context(|| format!("Could not determine the {kind} directory"))
}

impl Config {
    /// Holds `config.toml`, which is written with defaults on first run.
    pub fn config_dir() -> Result<PathBuf> {
        app_dir(dirs::config_dir(), "config")
    }

    /// `~/.config/parsley-agent/config.toml` on Linux.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILENAME))
    }

    /// One JSON document per conversation, keyed by session id.
    ///
    /// `~/.local/share/parsley-agent/sessions` on Linux.
    pub fn sessions_dir() -> Result<PathBuf> {
        Ok(app_dir(dirs::data_dir(), "data")?.join(SESSIONS_DIRNAME))
    }
}
