//! Session persistence.
//!
//! A session carries the previous answer forward so a follow-up question
//! keeps its context. Each session is one JSON document under
//! `~/.local/share/parsley-agent/sessions/<uuid>.json`.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;

/// One stored session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDoc {
    pub id: String,
    pub previous_conversation: String,
    /// RFC 3339 timestamp of the last update.
    pub updated_at: String,
}

/// Directory of session documents.
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    /// A store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The store under the XDG data directory.
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(Config::sessions_dir()?))
    }

    fn path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Loads a session by full id.
    pub fn load(&self, id: &str) -> Result<SessionDoc> {
        let path = self.path(id);
        let short = &id[..8.min(id.len())];
        anyhow::ensure!(path.exists(), "Session {} not found", short);
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read session file {:?}", path))?;
        let doc = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse session file {:?}", path))?;
        Ok(doc)
    }

    /// Creates or replaces a session's previous conversation.
    ///
    /// A new uuid v4 id is minted when `id` is `None`.
    pub fn upsert(&self, id: Option<&str>, previous_conversation: &str) -> Result<SessionDoc> {
        let doc = SessionDoc {
            id: id
                .map(str::to_string)
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            previous_conversation: previous_conversation.to_string(),
            updated_at: Utc::now().to_rfc3339(),
        };
        fs::create_dir_all(&self.dir).context("Failed to create sessions directory")?;
        let path = self.path(&doc.id);
        let json = serde_json::to_string_pretty(&doc)?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write session file {:?}", path))?;
        tracing::debug!(session = %doc.id, "session saved");
        Ok(doc)
    }

    /// All sessions, most recently updated first.
    pub fn list(&self) -> Result<Vec<SessionDoc>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut sessions = Vec::new();
        for entry in fs::read_dir(&self.dir).context("Failed to read sessions directory")? {
            let path = entry?.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let contents = fs::read_to_string(&path)?;
            match serde_json::from_str::<SessionDoc>(&contents) {
                Ok(doc) => sessions.push(doc),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping unreadable session")
                }
            }
        }
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(sessions)
    }

    /// Deletes a session's file.
    pub fn delete(&self, id: &str) -> Result<()> {
        let path = self.path(id);
        anyhow::ensure!(path.exists(), "Session not found: {}", id);
        fs::remove_file(&path)
            .with_context(|| format!("Failed to delete session file {:?}", path))?;
        Ok(())
    }

    /// Resolves a partial session ID to a full ID (git-style short IDs).
    ///
    /// Returns an error if zero or multiple sessions match.
    pub fn resolve_id(&self, partial: &str) -> Result<String> {
        let sessions = self.list()?;
        let matches: Vec<_> = sessions
            .iter()
            .filter(|s| s.id.starts_with(partial))
            .collect();
        match matches.len() {
            0 => anyhow::bail!("No session found matching '{}'", partial),
            1 => Ok(matches[0].id.clone()),
            n => anyhow::bail!(
                "{} sessions match '{}'. Provide more characters to disambiguate",
                n,
                partial
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_creates_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("sessions"));

        let created = store.upsert(None, "first answer").unwrap();
        assert!(Uuid::parse_str(&created.id).is_ok());
        assert_eq!(store.load(&created.id).unwrap().previous_conversation, "first answer");

        let updated = store.upsert(Some(&created.id), "second answer").unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(store.load(&created.id).unwrap().previous_conversation, "second answer");
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_list_empty_when_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("nope"));
        assert!(store.list().unwrap().is_empty());
        assert!(store.load("abc").is_err());
    }

    #[test]
    fn test_resolve_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        store.upsert(Some("abc123"), "a").unwrap();
        store.upsert(Some("abd456"), "b").unwrap();

        assert_eq!(store.resolve_id("abc").unwrap(), "abc123");
        assert!(store.resolve_id("ab").is_err());
        assert!(store.resolve_id("zzz").is_err());

        store.delete("abc123").unwrap();
        assert!(store.load("abc123").is_err());
        assert!(store.delete("abc123").is_err());
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_list_skips_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        store.upsert(Some("s1"), "a").unwrap();
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        fs::write(dir.path().join("broken.json"), "{").unwrap();
        let ids: Vec<_> = store.list().unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["s1"]);
    }
}
