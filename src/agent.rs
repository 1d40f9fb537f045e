//! The tool-calling conversation loop.
//!
//! [`AgentLoop::run`] sends the transcript and tool definitions to the
//! completion provider, executes any requested tools in the order they were
//! emitted, appends their results, and repeats. The loop ends when the model
//! answers in plain text, when the end-signal tool is called, or when the
//! iteration budget runs out. The last two cases are followed by one final
//! tool-free completion so the caller always gets natural-language text.
//!
//! Any tool failure aborts the whole run. Tools can have side effects and
//! later calls may depend on earlier results, so there is no partial recovery.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::cancel::{cancellable, ensure_active};
use crate::completion::{Choice, CompletionProvider, CompletionResponse, Usage};
use crate::constants::{DEFAULT_MAX_ITERATIONS, END_ORCHESTRATION_TOOL};
use crate::error::{Error, ProviderError, Result};
use crate::message::{Message, ToolCall};
use crate::tools::{parse_arguments, ToolDefinition, ToolRegistry, ToolResult};

/// Loop limits and the name of the end-signal tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    /// Maximum tool-calling iterations before the forced final answer.
    pub max_iterations: usize,
    /// Tool whose invocation ends the loop after the current batch.
    pub end_tool: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            end_tool: END_ORCHESTRATION_TOOL.to_string(),
        }
    }
}

/// How a successful run reached its answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The model answered without requesting tools.
    Answer,
    /// The end-signal tool was invoked.
    EndSignal,
    /// The iteration budget ran out.
    BudgetExhausted,
}

/// The result of a completed run.
#[derive(Debug, Clone)]
pub struct AgentOutcome {
    pub answer: String,
    pub termination: Termination,
    /// Provider calls made with tools attached.
    pub iterations: usize,
    pub tool_invocations: usize,
    pub usage: Usage,
    /// The full transcript, excluding the final answer.
    pub messages: Vec<Message>,
}

/// Runs tool-augmented conversations against a [`CompletionProvider`].
///
/// Holds only shared, read-only state; each [`run`](Self::run) allocates its
/// own transcript, so one loop can serve many concurrent runs.
pub struct AgentLoop {
    provider: Arc<dyn CompletionProvider>,
    registry: Arc<ToolRegistry>,
    config: AgentConfig,
}

impl AgentLoop {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        registry: Arc<ToolRegistry>,
        config: AgentConfig,
    ) -> Self {
        Self {
            provider,
            registry,
            config,
        }
    }

    /// Runs the loop and returns only the answer text.
    pub async fn answer(
        &self,
        initial: Vec<Message>,
        cancel: &CancellationToken,
    ) -> Result<String> {
        Ok(self.run(initial, cancel).await?.answer)
    }

    /// Runs the loop starting from `initial`.
    ///
    /// # Errors
    ///
    /// Fails fast on the first provider error, malformed tool arguments,
    /// unknown tool, or tool failure, and with [`Error::Cancelled`] when
    /// `cancel` fires. No tool or provider call is made after cancellation.
    pub async fn run(
        &self,
        initial: Vec<Message>,
        cancel: &CancellationToken,
    ) -> Result<AgentOutcome> {
        let mut messages = initial;
        let mut usage = Usage::default();
        let mut iterations = 0;
        let mut tool_invocations = 0;
        let mut termination = Termination::BudgetExhausted;
        let tools = self.registry.definitions();

        while iterations < self.config.max_iterations {
            iterations += 1;
            let iteration = iterations;
            tracing::debug!(iteration, messages = messages.len(), "requesting completion");

            let response = self
                .complete(&messages, Some(tools), cancel)
                .await?
                .map_err(|source| Error::Provider { iteration, source })?;
            usage += response.usage;
            let choice = response
                .into_first()
                .map_err(|source| Error::Provider { iteration, source })?;

            if !choice.message.has_tool_calls() {
                tracing::info!(iteration, "model answered without tools");
                return Ok(AgentOutcome {
                    answer: choice.message.text().to_string(),
                    termination: Termination::Answer,
                    iterations,
                    tool_invocations,
                    usage,
                    messages,
                });
            }

            let Choice { message } = choice;
            let calls = message.tool_calls.clone();
            messages.push(Message::assistant_tool_calls(message.text(), calls.clone()));

            let mut end_requested = false;
            for call in &calls {
                ensure_active(cancel)?;
                let result = self.invoke(call, iteration, cancel).await?;
                tool_invocations += 1;
                messages.push(result.into_message());
                if call.name == self.config.end_tool {
                    end_requested = true;
                }
            }

            if end_requested {
                tracing::info!(iteration, "end-signal tool invoked");
                termination = Termination::EndSignal;
                break;
            }
        }

        if termination == Termination::BudgetExhausted {
            tracing::warn!(
                max_iterations = self.config.max_iterations,
                "iteration budget exhausted, requesting final answer"
            );
        }

        let response = self
            .complete(&messages, None, cancel)
            .await?
            .map_err(Error::FinalCompletion)?;
        usage += response.usage;
        let choice = response.into_first().map_err(Error::FinalCompletion)?;

        tracing::info!(
            iterations,
            tool_invocations,
            total_tokens = usage.total_tokens,
            cost_usd = usage.cost_usd(),
            "agent run complete"
        );

        Ok(AgentOutcome {
            answer: choice.message.text().to_string(),
            termination,
            iterations,
            tool_invocations,
            usage,
            messages,
        })
    }

    /// Issues one completion request, honouring cancellation.
    async fn complete(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
        cancel: &CancellationToken,
    ) -> Result<std::result::Result<CompletionResponse, ProviderError>> {
        ensure_active(cancel)?;
        cancellable(cancel, self.provider.complete(messages, tools)).await
    }

    /// Parses, resolves, and executes a single tool call.
    async fn invoke(
        &self,
        call: &ToolCall,
        iteration: usize,
        cancel: &CancellationToken,
    ) -> Result<ToolResult> {
        let args = parse_arguments(&call.name, &call.arguments)?;
        let tool = self.registry.resolve(&call.name)?;

        tracing::info!(
            iteration,
            tool = %call.name,
            args = %call.arguments,
            "invoking tool"
        );
        let results = cancellable(cancel, tool.execute(args))
            .await?
            .map_err(|source| Error::ToolExecution {
                tool: call.name.clone(),
                iteration,
                source,
            })?;

        Ok(ToolResult {
            tool: call.name.clone(),
            results,
            tool_call_id: call.id.clone(),
            call_id: call.call_id.clone(),
        })
    }
}

#[cfg(test)]
mod tests;
