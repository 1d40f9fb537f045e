//! Scripted fakes shared by the agent loop and summarizer tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Map;

use crate::completion::{CompletionProvider, CompletionResponse, Usage};
use crate::error::ProviderError;
use crate::message::{Message, ToolCall};
use crate::tools::{Tool, ToolArgs, ToolDefinition, ToolOutput, ToolParameters};

/// One request observed by [`ScriptedProvider`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<Message>,
    pub tools: Option<Vec<ToolDefinition>>,
}

impl RecordedCall {
    /// Text of the last message in the request.
    pub fn last_text(&self) -> &str {
        self.messages.last().map(|m| m.text()).unwrap_or_default()
    }
}

/// Replays a fixed queue of responses and records every request.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<CompletionResponse, String>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<CompletionResponse, String>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<CompletionResponse, ProviderError> {
        self.calls.lock().unwrap().push(RecordedCall {
            messages: messages.to_vec(),
            tools: tools.map(|t| t.to_vec()),
        });
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(response)) => Ok(response),
            Some(Err(msg)) => Err(ProviderError::Request(anyhow::anyhow!(msg))),
            None => Err(ProviderError::Request(anyhow::anyhow!("script exhausted"))),
        }
    }
}

fn usage() -> Usage {
    Usage {
        prompt_tokens: 10,
        completion_tokens: 5,
        total_tokens: 15,
    }
}

/// A plain-text answer.
pub fn text(answer: &str) -> Result<CompletionResponse, String> {
    Ok(CompletionResponse::single(Message::assistant(answer), usage()))
}

/// An assistant turn requesting the given `(id, name, arguments)` tool calls.
pub fn tool_calls(calls: &[(&str, &str, &str)]) -> Result<CompletionResponse, String> {
    let calls = calls
        .iter()
        .map(|(id, name, args)| ToolCall::new(*id, *name, *args))
        .collect();
    Ok(CompletionResponse::single(
        Message::assistant_tool_calls("", calls),
        usage(),
    ))
}

/// A provider failure.
pub fn failure(msg: &str) -> Result<CompletionResponse, String> {
    Err(msg.to_string())
}

/// A tool that returns a fixed payload (or error) and counts invocations.
pub struct CountingTool {
    name: String,
    output: Result<ToolOutput, String>,
    invocations: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<ToolArgs>>>,
}

impl CountingTool {
    pub fn ok(name: &str, output: ToolOutput) -> Self {
        Self::build(name, Ok(output))
    }

    pub fn failing(name: &str, msg: &str) -> Self {
        Self::build(name, Err(msg.to_string()))
    }

    pub fn empty(name: &str) -> Self {
        Self::ok(name, Map::new())
    }

    fn build(name: &str, output: Result<ToolOutput, String>) -> Self {
        Self {
            name: name.to_string(),
            output,
            invocations: Arc::new(AtomicUsize::new(0)),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Shared invocation counter; clone before boxing the tool.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.invocations)
    }

    /// Shared record of received arguments.
    pub fn seen(&self) -> Arc<Mutex<Vec<ToolArgs>>> {
        Arc::clone(&self.seen)
    }
}

#[async_trait]
impl Tool for CountingTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "test tool"
    }

    fn parameters(&self) -> ToolParameters {
        ToolParameters::object()
    }

    async fn execute(&self, args: ToolArgs) -> anyhow::Result<ToolOutput> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(args);
        self.output.clone().map_err(|msg| anyhow::anyhow!(msg))
    }
}
