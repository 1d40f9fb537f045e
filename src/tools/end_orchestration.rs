use serde_json::Map;

use super::{Tool, ToolArgs, ToolOutput, ToolParameters};
use crate::constants::END_ORCHESTRATION_TOOL;

/// Signals that the agent has gathered enough information to answer.
///
/// Has no side effects. The agent loop recognizes the name and stops
/// iterating once the current batch of tool calls has been processed.
pub struct EndOrchestrationTool;

#[async_trait::async_trait]
impl Tool for EndOrchestrationTool {
    fn name(&self) -> &str {
        END_ORCHESTRATION_TOOL
    }

    fn description(&self) -> &str {
        "Call this when you have all the information needed to answer the user. \
Takes no arguments."
    }

    fn parameters(&self) -> ToolParameters {
        ToolParameters::object()
    }

    async fn execute(&self, _args: ToolArgs) -> anyhow::Result<ToolOutput> {
        Ok(Map::new())
    }
}
