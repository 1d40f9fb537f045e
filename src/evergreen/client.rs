//! REST client for the Evergreen v2 API.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::Url;
use serde_json::Value;

use super::{HistoryQuery, TaskSource};
use crate::config::Config;
use crate::constants::EVERGREEN_TIMEOUT_SECS;

/// Talks to Evergreen's REST API with `Api-User` / `Api-Key` auth headers.
pub struct EvergreenClient {
    http: reqwest::Client,
    api_url: String,
    api_user: String,
    api_key: String,
}

impl EvergreenClient {
    /// Creates a client from the loaded application config.
    ///
    /// # Errors
    ///
    /// Returns an error if credentials are missing or the HTTP client
    /// cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_user = config
            .resolve_evergreen_user()
            .context("No Evergreen API user found. Set EVERGREEN_API_USER or configure it in config.toml")?;
        let api_key = config
            .resolve_evergreen_key()
            .context("No Evergreen API key found. Set EVERGREEN_API_KEY or configure it in config.toml")?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(EVERGREEN_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            http,
            api_url: config.evergreen_api_url().to_string(),
            api_user,
            api_key,
        })
    }

    fn get(&self, segments: &[&str]) -> Result<reqwest::RequestBuilder> {
        let url = endpoint(&self.api_url, segments)?;
        Ok(self
            .http
            .get(url)
            .header("Api-User", &self.api_user)
            .header("Api-Key", &self.api_key))
    }
}

/// Builds `{api_url}/rest/v2/{segments..}`, percent-encoding each segment.
fn endpoint(api_url: &str, segments: &[&str]) -> Result<Url> {
    let mut url =
        Url::parse(api_url).with_context(|| format!("Invalid Evergreen API URL: {api_url}"))?;
    url.path_segments_mut()
        .map_err(|()| anyhow!("Evergreen API URL cannot have a path: {api_url}"))?
        .pop_if_empty()
        .extend(["rest", "v2"])
        .extend(segments);
    Ok(url)
}

#[async_trait::async_trait]
impl TaskSource for EvergreenClient {
    async fn task(&self, task_id: &str, execution: u32) -> Result<Value> {
        tracing::debug!(task_id, execution, "fetching task");
        let task = self
            .get(&["tasks", task_id])?
            .query(&[("execution", execution.to_string())])
            .send()
            .await
            .with_context(|| format!("Failed to request task {task_id}"))?
            .error_for_status()
            .with_context(|| format!("Evergreen rejected request for task {task_id}"))?
            .json()
            .await
            .with_context(|| format!("Failed to decode task {task_id}"))?;
        Ok(task)
    }

    async fn task_history(&self, query: &HistoryQuery) -> Result<Value> {
        tracing::debug!(
            task_id = %query.task_id,
            task_name = %query.task_name,
            direction = query.direction.as_str(),
            "fetching task history"
        );
        let history = self
            .get(&[
                "projects",
                query.project_identifier.as_str(),
                "tasks",
                query.task_name.as_str(),
            ])?
            .query(&[
                ("build_variant", query.build_variant.as_str()),
                ("task_id", query.task_id.as_str()),
                ("direction", query.direction.as_str()),
            ])
            .send()
            .await
            .with_context(|| format!("Failed to request history for {}", query.task_name))?
            .error_for_status()
            .with_context(|| format!("Evergreen rejected history request for {}", query.task_name))?
            .json()
            .await
            .with_context(|| format!("Failed to decode history for {}", query.task_name))?;
        Ok(history)
    }

    async fn task_logs(&self, task_id: &str) -> Result<String> {
        tracing::debug!(task_id, "fetching task logs");
        let logs = self
            .get(&["tasks", task_id, "build", "TaskLogs"])?
            .query(&[("type", "task_log")])
            .send()
            .await
            .with_context(|| format!("Failed to request logs for task {task_id}"))?
            .error_for_status()
            .with_context(|| format!("Evergreen rejected log request for task {task_id}"))?
            .text()
            .await
            .with_context(|| format!("Failed to read logs for task {task_id}"))?;
        Ok(logs)
    }
}
