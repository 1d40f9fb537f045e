use std::sync::Arc;

use serde_json::{json, Map, Value};
use tokio_util::sync::CancellationToken;

use super::{required_str, Tool, ToolArgs, ToolOutput, ToolParameters};
use crate::evergreen::TaskSource;
use crate::summarizer::LogSummarizer;

/// Fetches a task's logs and condenses them with the [`LogSummarizer`].
///
/// Raw logs are usually far larger than a context window, so the LLM only
/// ever sees the section-by-section report.
pub struct GetTaskLogsTool {
    source: Arc<dyn TaskSource>,
    summarizer: Arc<LogSummarizer>,
}

impl GetTaskLogsTool {
    pub fn new(source: Arc<dyn TaskSource>, summarizer: Arc<LogSummarizer>) -> Self {
        Self { source, summarizer }
    }
}

#[async_trait::async_trait]
impl Tool for GetTaskLogsTool {
    fn name(&self) -> &str {
        "get_task_logs"
    }

    fn description(&self) -> &str {
        "Fetch a task's logs and return a section-by-section analysis of them."
    }

    fn parameters(&self) -> ToolParameters {
        ToolParameters::object().required("task_id", json!({"type": "string"}))
    }

    async fn execute(&self, args: ToolArgs) -> anyhow::Result<ToolOutput> {
        let task_id = required_str(&args, "task_id")?;
        let raw = self.source.task_logs(task_id).await?;
        tracing::info!(task_id, bytes = raw.len(), "summarizing task logs");

        // The agent loop drops this future on cancellation, which stops the
        // summarizer between provider calls.
        let report = self
            .summarizer
            .summarize(&raw, &CancellationToken::new())
            .await?;

        let mut output = Map::new();
        output.insert("task_logs".to_string(), Value::String(report.text));
        Ok(output)
    }
}
