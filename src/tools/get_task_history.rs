use std::sync::Arc;

use serde_json::{json, Map};

use super::{required_str, Tool, ToolArgs, ToolOutput, ToolParameters};
use crate::evergreen::{HistoryDirection, HistoryQuery, TaskSource};

/// Looks up neighbouring runs of a task to spot when a failure started.
pub struct GetTaskHistoryTool {
    source: Arc<dyn TaskSource>,
}

impl GetTaskHistoryTool {
    pub fn new(source: Arc<dyn TaskSource>) -> Self {
        Self { source }
    }
}

#[async_trait::async_trait]
impl Tool for GetTaskHistoryTool {
    fn name(&self) -> &str {
        "get_task_history"
    }

    fn description(&self) -> &str {
        "Fetch the history of a task on a build variant, walking BEFORE or AFTER \
the given task id. Useful to find when a failure first appeared."
    }

    fn parameters(&self) -> ToolParameters {
        ToolParameters::object()
            .required("project_identifier", json!({"type": "string"}))
            .required("task_name", json!({"type": "string"}))
            .required("build_variant", json!({"type": "string"}))
            .required("task_id", json!({"type": "string"}))
            .required(
                "direction",
                json!({"type": "string", "enum": ["BEFORE", "AFTER"]}),
            )
    }

    async fn execute(&self, args: ToolArgs) -> anyhow::Result<ToolOutput> {
        let query = HistoryQuery {
            project_identifier: required_str(&args, "project_identifier")?.to_string(),
            task_name: required_str(&args, "task_name")?.to_string(),
            build_variant: required_str(&args, "build_variant")?.to_string(),
            task_id: required_str(&args, "task_id")?.to_string(),
            direction: HistoryDirection::from_str(required_str(&args, "direction")?)?,
        };

        let history = self.source.task_history(&query).await?;

        let mut output = Map::new();
        output.insert("task_history".to_string(), history);
        Ok(output)
    }
}
