pub mod end_orchestration;
pub mod get_task;
pub mod get_task_history;
pub mod get_task_logs;

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{Error, Result};
use crate::evergreen::TaskSource;
use crate::message::Message;
use crate::summarizer::LogSummarizer;

use end_orchestration::EndOrchestrationTool;
use get_task::GetTaskTool;
use get_task_history::GetTaskHistoryTool;
use get_task_logs::GetTaskLogsTool;

/// Arguments passed to a tool, parsed from the provider's JSON.
pub type ToolArgs = Map<String, Value>;

/// Result payload returned by a tool.
pub type ToolOutput = Map<String, Value>;

/// The output of one tool call, correlated to the call that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool: String,
    pub results: ToolOutput,
    #[serde(skip)]
    pub tool_call_id: String,
    #[serde(skip)]
    pub call_id: Option<String>,
}

impl ToolResult {
    /// Builds the tool-role message fed back to the LLM.
    ///
    /// The content is `{"tool": <name>, "results": <payload>}`.
    pub fn into_message(self) -> Message {
        let body = json!({ "tool": self.tool, "results": self.results });
        Message::tool_result(self.tool_call_id, body.to_string()).with_call_id(self.call_id)
    }
}

/// JSON-schema description of a tool's parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolParameters {
    #[serde(rename = "type")]
    pub kind: String,
    pub properties: Map<String, Value>,
    pub required: Vec<String>,
    #[serde(rename = "additionalProperties")]
    pub additional_properties: bool,
}

impl ToolParameters {
    /// An object schema with no properties that rejects unlisted ones.
    pub fn object() -> Self {
        Self {
            kind: "object".to_string(),
            properties: Map::new(),
            required: Vec::new(),
            additional_properties: false,
        }
    }

    /// Adds a required property with the given schema.
    pub fn required(mut self, name: &str, schema: Value) -> Self {
        self.properties.insert(name.to_string(), schema);
        self.required.push(name.to_string());
        self
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Definition sent to the LLM so it knows what tools are available.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: ToolParameters,
    pub strict: bool,
}

/// Every tool implements this trait.
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Unique name the LLM uses to call this tool.
    fn name(&self) -> &str;

    /// Human-readable description advertised to the LLM.
    fn description(&self) -> &str;

    /// JSON Schema describing the tool's input parameters.
    fn parameters(&self) -> ToolParameters;

    /// Execute the tool with the given arguments.
    async fn execute(&self, args: ToolArgs) -> anyhow::Result<ToolOutput>;
}

/// Holds all registered tools and resolves calls by name.
///
/// Built once at startup, then shared read-only (usually behind an `Arc`)
/// across concurrent runs. There is no way to mutate it through `&self`.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    definitions: Vec<ToolDefinition>,
    by_name: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            definitions: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Register a tool. Called during startup.
    ///
    /// Fails with [`Error::DuplicateTool`] if the name is already taken.
    pub fn register(&mut self, tool: Box<dyn Tool>) -> Result<()> {
        let name = tool.name().to_string();
        if self.by_name.contains_key(&name) {
            return Err(Error::DuplicateTool(name));
        }
        self.definitions.push(ToolDefinition {
            name: name.clone(),
            description: tool.description().to_string(),
            parameters: tool.parameters(),
            strict: true,
        });
        self.by_name.insert(name, self.tools.len());
        self.tools.push(Arc::from(tool));
        Ok(())
    }

    /// Look up a tool by name.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Tool>> {
        self.by_name
            .get(name)
            .map(|&i| Arc::clone(&self.tools[i]))
            .ok_or_else(|| Error::UnknownTool(name.to_string()))
    }

    /// Definitions for the LLM, in registration order.
    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    /// How many tools are registered.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    /// Create a registry with all built-in tools.
    pub fn with_builtins(
        source: Arc<dyn TaskSource>,
        summarizer: Arc<LogSummarizer>,
    ) -> Result<Self> {
        let mut registry = Self::new();
        registry.register(Box::new(GetTaskTool::new(Arc::clone(&source))))?;
        registry.register(Box::new(GetTaskHistoryTool::new(Arc::clone(&source))))?;
        registry.register(Box::new(GetTaskLogsTool::new(source, summarizer)))?;
        registry.register(Box::new(EndOrchestrationTool))?;
        Ok(registry)
    }
}

/// Parses a tool call's raw argument text into a key/value mapping.
///
/// Blank input is treated as an empty object, since providers send that for
/// parameterless tools.
pub fn parse_arguments(tool: &str, raw: &str) -> Result<ToolArgs> {
    if raw.trim().is_empty() {
        return Ok(ToolArgs::new());
    }
    let value: Value = serde_json::from_str(raw).map_err(|e| Error::ArgumentParse {
        tool: tool.to_string(),
        reason: e.to_string(),
    })?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::ArgumentParse {
            tool: tool.to_string(),
            reason: format!("expected a JSON object, got {}", json_kind(&other)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Reads a required string argument.
pub(crate) fn required_str<'a>(args: &'a ToolArgs, key: &str) -> anyhow::Result<&'a str> {
    match args.get(key) {
        Some(Value::String(s)) => Ok(s),
        Some(_) => anyhow::bail!("argument {key} must be a string"),
        None => anyhow::bail!("missing {key} argument"),
    }
}
