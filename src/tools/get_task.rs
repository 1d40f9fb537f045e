use std::sync::Arc;

use anyhow::Context;
use serde_json::{json, Map};

use super::{required_str, Tool, ToolArgs, ToolOutput, ToolParameters};
use crate::evergreen::TaskSource;

/// Looks up one execution of a task.
pub struct GetTaskTool {
    source: Arc<dyn TaskSource>,
}

impl GetTaskTool {
    pub fn new(source: Arc<dyn TaskSource>) -> Self {
        Self { source }
    }
}

#[async_trait::async_trait]
impl Tool for GetTaskTool {
    fn name(&self) -> &str {
        "get_task"
    }

    fn description(&self) -> &str {
        "Fetch a task's details (status, build variant, distro, display name) \
for a given task id and execution number."
    }

    fn parameters(&self) -> ToolParameters {
        ToolParameters::object()
            .required("task_id", json!({"type": "string"}))
            .required("execution", json!({"type": "string"}))
    }

    async fn execute(&self, args: ToolArgs) -> anyhow::Result<ToolOutput> {
        let task_id = required_str(&args, "task_id")?;
        let execution = required_str(&args, "execution")?;
        let execution: u32 = execution
            .trim()
            .parse()
            .with_context(|| format!("invalid execution value: {execution}"))?;

        let task = self.source.task(task_id, execution).await?;

        let mut output = Map::new();
        output.insert("task".to_string(), task);
        Ok(output)
    }
}

