//! The chat-completion capability consumed by the agent loop and summarizer.
//!
//! [`CompletionProvider`] is the only seam between the core and an LLM
//! vendor. The concrete rig-core backed implementation lives in
//! [`crate::provider`]; tests substitute scripted fakes.

use std::ops::AddAssign;

use async_trait::async_trait;

use crate::constants::{COST_PER_INPUT_TOKEN, COST_PER_OUTPUT_TOKEN};
use crate::error::ProviderError;
use crate::message::Message;
use crate::tools::ToolDefinition;

/// Produces a model-generated message for a conversation.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Requests a completion for `messages`.
    ///
    /// When `tools` is `Some`, the definitions are advertised to the model and
    /// the returned message may carry tool calls. When `None`, the model is
    /// expected to answer in plain text.
    async fn complete(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<CompletionResponse, ProviderError>;
}

/// A provider response: zero or more candidate messages plus token usage.
#[derive(Debug, Clone, Default)]
pub struct CompletionResponse {
    pub choices: Vec<Choice>,
    pub usage: Usage,
}

impl CompletionResponse {
    /// Builds a single-choice response.
    pub fn single(message: Message, usage: Usage) -> Self {
        Self {
            choices: vec![Choice { message }],
            usage,
        }
    }

    /// Returns the first choice, or [`ProviderError::NoChoices`].
    pub fn into_first(self) -> Result<Choice, ProviderError> {
        self.choices
            .into_iter()
            .next()
            .ok_or(ProviderError::NoChoices)
    }
}

/// One candidate message. Tool calls, if any, ride on `message.tool_calls`.
#[derive(Debug, Clone)]
pub struct Choice {
    pub message: Message,
}

/// Token accounting for one or more completion calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl Usage {
    /// Estimated cost in USD at the configured per-token rates.
    pub fn cost_usd(&self) -> f64 {
        self.prompt_tokens as f64 * COST_PER_INPUT_TOKEN
            + self.completion_tokens as f64 * COST_PER_OUTPUT_TOKEN
    }
}

impl AddAssign for Usage {
    fn add_assign(&mut self, rhs: Self) {
        self.prompt_tokens += rhs.prompt_tokens;
        self.completion_tokens += rhs.completion_tokens;
        self.total_tokens += rhs.total_tokens;
    }
}
