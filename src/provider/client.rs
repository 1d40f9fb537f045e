//! rig-core backed completion provider.
//!
//! Contains the [`Provider`] struct which wraps rig-core provider clients
//! behind enum dispatch. Each request is a single raw completion: tool
//! definitions are advertised to the model but never executed by rig, so
//! the agent loop stays in control of every tool call.

use anyhow::{Context, Result};
use async_trait::async_trait;
use rig::client::CompletionClient;
use rig::completion::{Completion, ToolDefinition as RigToolDefinition};
use rig::message::{
    AssistantContent, Message as RigMessage, Text, ToolCall as RigToolCall, ToolFunction,
};
use rig::providers::{anthropic, openai, openrouter};
use rig::OneOrMany;
use serde_json::Value;

use super::kind::ProviderKind;
use super::resolve::ModelSelection;
use crate::completion::{CompletionProvider, CompletionResponse, Usage};
use crate::config::Config;
use crate::error::ProviderError;
use crate::message::{Message, Role, ToolCall};
use crate::tools::ToolDefinition;

/// Internal enum wrapping provider-specific clients.
enum ClientKind {
    Anthropic(anthropic::Client),
    OpenAI(openai::Client),
    OpenRouter(openrouter::Client),
    Ollama(openai::Client),
}

/// A configured LLM provider ready to handle completion requests.
///
/// Agents are constructed on each call since they are cheap to create and
/// the preamble comes from the transcript's system messages.
pub struct Provider {
    client: ClientKind,
    model: String,
}

/// Helper macro to reduce duplication across provider match arms.
///
/// Builds an agent from the given client, model, and optional system prompt,
/// then executes the provided block with the agent bound to `$agent`.
macro_rules! with_agent {
    ($client:expr, $model:expr, $sys:expr, |$agent:ident| $body:expr) => {{
        let $agent = if let Some(sys) = $sys {
            $client
                .agent($model)
                .preamble(sys)
                .max_tokens(crate::constants::MAX_TOKENS)
                .build()
        } else {
            $client
                .agent($model)
                .max_tokens(crate::constants::MAX_TOKENS)
                .build()
        };
        $body
    }};
}

/// Dispatches an operation across provider-specific clients.
///
/// Matches on [`ClientKind`] and executes the same block for each variant,
/// letting the compiler monomorphize per provider.
macro_rules! dispatch {
    ($self:expr, |$client:ident| $body:expr) => {
        match &$self.client {
            ClientKind::Anthropic($client) => $body,
            ClientKind::OpenAI($client) => $body,
            ClientKind::OpenRouter($client) => $body,
            ClientKind::Ollama($client) => $body,
        }
    };
}

impl Provider {
    /// Creates a new [`Provider`] from the loaded application config.
    ///
    /// # Errors
    ///
    /// Returns an error if no API key is found for the selected provider
    /// or if client construction fails.
    pub fn from_config(config: &Config, selection: &ModelSelection) -> Result<Self> {
        let client = match selection.provider {
            ProviderKind::Anthropic => {
                let api_key = config
                    .resolve_api_key("anthropic")
                    .context("No API key found for Anthropic. Set ANTHROPIC_API_KEY or configure it in config.toml")?;
                ClientKind::Anthropic(
                    anthropic::Client::new(&api_key)
                        .context("Failed to create Anthropic client")?,
                )
            }
            ProviderKind::OpenAI => {
                let api_key = config
                    .resolve_api_key("openai")
                    .context("No API key found for OpenAI. Set OPENAI_API_KEY or configure it in config.toml")?;
                ClientKind::OpenAI(
                    openai::Client::new(&api_key).context("Failed to create OpenAI client")?,
                )
            }
            ProviderKind::OpenRouter => {
                let api_key = config
                    .resolve_api_key("openrouter")
                    .context("No API key found for OpenRouter. Set OPENROUTER_API_KEY or configure it in config.toml")?;
                ClientKind::OpenRouter(
                    openrouter::Client::new(&api_key)
                        .context("Failed to create OpenRouter client")?,
                )
            }
            ProviderKind::Ollama => ClientKind::Ollama(
                openai::Client::builder()
                    .api_key("ollama")
                    .base_url(format!("{}/v1", config.ollama_base_url()))
                    .build()
                    .context("Failed to create Ollama client")?,
            ),
        };
        tracing::debug!(
            provider = selection.provider.as_str(),
            model = %selection.model,
            "provider ready"
        );
        Ok(Self {
            client,
            model: selection.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionProvider for Provider {
    async fn complete(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<CompletionResponse, ProviderError> {
        let preamble = preamble(messages);
        let (prompt, history) = split_transcript(messages);
        let rig_tools = tools.map(to_rig_definitions).unwrap_or_default();

        let response = dispatch!(self, |client| {
            with_agent!(client, &self.model, preamble.as_deref(), |agent| {
                let request = agent
                    .completion(prompt.clone(), history.clone())
                    .await
                    .map_err(|e| ProviderError::Request(e.into()))?;
                let response = request
                    .tools(rig_tools.clone())
                    .send()
                    .await
                    .map_err(|e| ProviderError::Request(e.into()))?;
                from_rig_response(response.choice, response.usage)
            })
        });

        tracing::debug!(
            model = %self.model,
            prompt_tokens = response.usage.prompt_tokens,
            completion_tokens = response.usage.completion_tokens,
            cost_usd = response.usage.cost_usd(),
            "completion received"
        );
        Ok(response)
    }
}

/// Joins every system message into the agent preamble.
fn preamble(messages: &[Message]) -> Option<String> {
    let parts: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.text())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n\n"))
    }
}

/// Splits the non-system transcript into the prompt (last message) and
/// the preceding chat history.
fn split_transcript(messages: &[Message]) -> (RigMessage, Vec<RigMessage>) {
    let mut converted: Vec<RigMessage> =
        messages.iter().filter_map(convert_message_to_rig).collect();
    let prompt = converted.pop().unwrap_or_else(|| RigMessage::user(""));
    (prompt, converted)
}

fn to_rig_definitions(tools: &[ToolDefinition]) -> Vec<RigToolDefinition> {
    tools
        .iter()
        .map(|t| RigToolDefinition {
            name: t.name.clone(),
            description: t.description.clone(),
            parameters: t.parameters.to_json(),
        })
        .collect()
}

/// Converts rig's assistant content into a single-choice response.
fn from_rig_response(
    choice: OneOrMany<AssistantContent>,
    usage: rig::completion::Usage,
) -> CompletionResponse {
    let mut text = String::new();
    let mut calls = Vec::new();
    for content in choice {
        match content {
            AssistantContent::Text(Text { text: chunk }) => text.push_str(&chunk),
            AssistantContent::ToolCall(call) => calls.push(
                ToolCall::new(
                    call.id,
                    call.function.name,
                    call.function.arguments.to_string(),
                )
                .with_call_id(call.call_id),
            ),
            _ => {}
        }
    }
    let message = if calls.is_empty() {
        Message::assistant(text)
    } else {
        Message::assistant_tool_calls(text, calls)
    };
    CompletionResponse::single(
        message,
        Usage {
            prompt_tokens: usage.input_tokens,
            completion_tokens: usage.output_tokens,
            total_tokens: usage.total_tokens,
        },
    )
}

/// Converts a transcript [`Message`] to a rig-core [`RigMessage`].
///
/// - **User** → `RigMessage::User` with text content
/// - **Assistant** (text only) → `RigMessage::Assistant` with text content
/// - **Assistant** (with tool calls) → `RigMessage::Assistant` with `ToolCall` content items
/// - **Tool** (result) → `RigMessage::User` with `ToolResult` content
///
/// Provider `call_id`s are carried through both directions; the OpenAI
/// Responses API rejects tool calls and results without them.
/// - **System** → `None` (system messages become the preamble)
fn convert_message_to_rig(msg: &Message) -> Option<RigMessage> {
    match msg.role {
        Role::User => Some(RigMessage::user(msg.text())),
        Role::Assistant => {
            if msg.tool_calls.is_empty() {
                Some(RigMessage::assistant(msg.text()))
            } else {
                let mut items: Vec<AssistantContent> = Vec::new();
                let text = msg.text();
                if !text.is_empty() {
                    items.push(AssistantContent::Text(Text {
                        text: text.to_string(),
                    }));
                }
                for tc in &msg.tool_calls {
                    let arguments = serde_json::from_str(&tc.arguments)
                        .unwrap_or_else(|_| Value::Object(Default::default()));
                    let call =
                        RigToolCall::new(tc.id.clone(), ToolFunction::new(tc.name.clone(), arguments));
                    let call = match &tc.call_id {
                        Some(call_id) => call.with_call_id(call_id.clone()),
                        None => call,
                    };
                    items.push(AssistantContent::ToolCall(call));
                }
                Some(RigMessage::Assistant {
                    id: None,
                    content: OneOrMany::many(items)
                        .unwrap_or_else(|_| OneOrMany::one(AssistantContent::text(""))),
                })
            }
        }
        Role::Tool => {
            let tool_call_id = match &msg.tool_call_id {
                Some(id) => id.clone(),
                None => {
                    tracing::warn!("tool message missing tool_call_id, using empty string");
                    String::new()
                }
            };
            Some(RigMessage::tool_result_with_call_id(
                tool_call_id,
                msg.call_id.clone(),
                msg.text(),
            ))
        }
        Role::System => None,
    }
}

#[cfg(test)]
mod tests {
    use rig::providers::openai::responses_api::InputItem;

    use super::*;

    #[test]
    fn test_preamble_joins_system_messages() {
        let messages = vec![
            Message::system("prompt"),
            Message::system("Task ID: t1, Execution: 0"),
            Message::user("hi"),
        ];
        assert_eq!(
            preamble(&messages).as_deref(),
            Some("prompt\n\nTask ID: t1, Execution: 0")
        );
        assert_eq!(preamble(&[Message::user("hi")]), None);
    }

    #[test]
    fn test_split_transcript_uses_last_message_as_prompt() {
        let messages = vec![
            Message::system("sys"),
            Message::user("question"),
            Message::assistant_tool_calls("", vec![ToolCall::new("c1", "get_task", "{}")]),
            Message::tool_result("c1", r#"{"tool":"get_task","results":{}}"#),
        ];
        let (prompt, history) = split_transcript(&messages);
        assert_eq!(history.len(), 2);
        assert!(matches!(prompt, RigMessage::User { .. }));
        assert!(matches!(history[1], RigMessage::Assistant { .. }));
    }

    #[test]
    fn test_system_messages_are_not_converted() {
        assert!(convert_message_to_rig(&Message::system("sys")).is_none());
        assert!(convert_message_to_rig(&Message::user("hi")).is_some());
    }

    #[test]
    fn test_call_ids_round_trip_into_responses_api_input() {
        let usage = rig::completion::Usage::new();
        let response = from_rig_response(
            OneOrMany::one(AssistantContent::tool_call_with_call_id(
                "fc_1",
                "call_1".to_string(),
                "get_task",
                serde_json::json!({"task_id": "t1", "execution": "0"}),
            )),
            usage,
        );
        let assistant = response.into_first().unwrap().message;
        assert_eq!(assistant.tool_calls[0].call_id.as_deref(), Some("call_1"));

        let result = Message::tool_result("fc_1", "{}").with_call_id(Some("call_1".to_string()));

        let mut items: Vec<InputItem> = Vec::new();
        for msg in [&assistant, &result] {
            let converted = convert_message_to_rig(msg).unwrap();
            items.extend(Vec::<InputItem>::try_from(converted).unwrap());
        }
        let body = serde_json::to_string(&items).unwrap();
        assert_eq!(body.matches(r#""call_id":"call_1""#).count(), 2);
    }

    #[test]
    fn test_tool_result_without_call_id_is_rejected_by_responses_api() {
        let converted = convert_message_to_rig(&Message::tool_result("fc_1", "{}")).unwrap();
        assert!(Vec::<InputItem>::try_from(converted).is_err());
    }

    #[test]
    fn test_definitions_carry_schema() {
        let defs = vec![ToolDefinition {
            name: "end_orchestration".to_string(),
            description: "stop".to_string(),
            parameters: crate::tools::ToolParameters::object(),
            strict: true,
        }];
        let rig_defs = to_rig_definitions(&defs);
        assert_eq!(rig_defs[0].name, "end_orchestration");
        assert_eq!(rig_defs[0].parameters["additionalProperties"], false);
    }
}
