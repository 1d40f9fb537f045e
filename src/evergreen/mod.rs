//! Access to build/test task data.
//!
//! Tools read tasks, task history, and raw task logs through the
//! [`TaskSource`] trait. [`EvergreenClient`] is the REST-backed
//! implementation used by the CLI.

mod client;

pub use client::EvergreenClient;

use anyhow::{anyhow, Result};
use serde_json::Value;

/// Which side of the anchor task to walk when reading history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryDirection {
    Before,
    After,
}

impl HistoryDirection {
    /// Parses `"BEFORE"` / `"AFTER"`, case-insensitively.
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "BEFORE" => Ok(Self::Before),
            "AFTER" => Ok(Self::After),
            other => Err(anyhow!(
                "Unknown history direction: {other}. Expected BEFORE or AFTER"
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Before => "BEFORE",
            Self::After => "AFTER",
        }
    }
}

/// Parameters for a task history lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub project_identifier: String,
    pub task_name: String,
    pub build_variant: String,
    pub task_id: String,
    pub direction: HistoryDirection,
}

/// Read-only access to tasks and their logs.
#[async_trait::async_trait]
pub trait TaskSource: Send + Sync {
    /// Fetches one execution of a task.
    async fn task(&self, task_id: &str, execution: u32) -> Result<Value>;

    /// Fetches neighbouring runs of the same task on the same build variant.
    async fn task_history(&self, query: &HistoryQuery) -> Result<Value>;

    /// Fetches the raw task log text.
    async fn task_logs(&self, task_id: &str) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_parsing() {
        assert_eq!(HistoryDirection::from_str("before").unwrap(), HistoryDirection::Before);
        assert_eq!(HistoryDirection::from_str("AFTER").unwrap(), HistoryDirection::After);
        assert!(HistoryDirection::from_str("sideways").is_err());
    }
}
