use std::sync::atomic::Ordering;

use serde_json::{json, Map, Value};

use super::*;
use crate::message::Role;
use crate::testing::{failure, text, tool_calls, CountingTool, ScriptedProvider};
use crate::tools::{Tool, ToolArgs, ToolOutput, ToolParameters};

fn output(pairs: Value) -> Map<String, Value> {
    pairs.as_object().cloned().unwrap()
}

fn agent(
    provider: Arc<ScriptedProvider>,
    registry: ToolRegistry,
    max_iterations: usize,
) -> AgentLoop {
    AgentLoop::new(
        provider,
        Arc::new(registry),
        AgentConfig {
            max_iterations,
            ..AgentConfig::default()
        },
    )
}

fn initial() -> Vec<Message> {
    vec![Message::system("sys"), Message::user("why did my task fail?")]
}

#[tokio::test]
async fn test_plain_answer_returns_immediately() {
    let provider = ScriptedProvider::new(vec![text("hello")]);
    let lookup = CountingTool::empty("lookup");
    let invoked = lookup.counter();
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(lookup)).unwrap();

    let outcome = agent(provider.clone(), registry, 5)
        .run(initial(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.answer, "hello");
    assert_eq!(outcome.termination, Termination::Answer);
    assert_eq!(provider.call_count(), 1);
    assert_eq!(invoked.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_lookup_then_answer() {
    let provider = ScriptedProvider::new(vec![
        tool_calls(&[("call_1", "lookup", r#"{"id":"42"}"#)]),
        text("Found: ok"),
    ]);
    let lookup = CountingTool::ok("lookup", output(json!({"value": "ok"})));
    let invoked = lookup.counter();
    let seen = lookup.seen();
    let end = CountingTool::empty(END_ORCHESTRATION_TOOL);
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(lookup)).unwrap();
    registry.register(Box::new(end)).unwrap();

    let answer = agent(provider.clone(), registry, 5)
        .answer(initial(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(answer, "Found: ok");
    assert_eq!(provider.call_count(), 2);
    assert_eq!(invoked.load(Ordering::SeqCst), 1);
    assert_eq!(seen.lock().unwrap()[0]["id"], json!("42"));

    let second = &provider.calls()[1];
    assert_eq!(second.tools.as_ref().map(Vec::len), Some(2));
    let assistant = &second.messages[2];
    assert_eq!(assistant.role, Role::Assistant);
    assert_eq!(assistant.tool_calls[0].id, "call_1");
    let result = second.messages.last().unwrap();
    assert_eq!(result.role, Role::Tool);
    assert_eq!(result.tool_call_id.as_deref(), Some("call_1"));
    let body: Value = serde_json::from_str(result.text()).unwrap();
    assert_eq!(body, json!({"tool": "lookup", "results": {"value": "ok"}}));
}

#[tokio::test]
async fn test_provider_call_id_is_echoed_on_tool_result() {
    let call = ToolCall::new("fc_1", "lookup", "{}").with_call_id(Some("call_1".to_string()));
    let provider = ScriptedProvider::new(vec![
        Ok(CompletionResponse::single(
            Message::assistant_tool_calls("", vec![call]),
            Usage::default(),
        )),
        text("done"),
    ]);
    let mut registry = ToolRegistry::new();
    registry
        .register(Box::new(CountingTool::empty("lookup")))
        .unwrap();

    agent(provider.clone(), registry, 5)
        .answer(initial(), &CancellationToken::new())
        .await
        .unwrap();

    let second = &provider.calls()[1];
    assert_eq!(
        second.messages[2].tool_calls[0].call_id.as_deref(),
        Some("call_1")
    );
    let result = second.messages.last().unwrap();
    assert_eq!(result.tool_call_id.as_deref(), Some("fc_1"));
    assert_eq!(result.call_id.as_deref(), Some("call_1"));
}

#[tokio::test]
async fn test_end_signal_finishes_batch_then_forces_final_answer() {
    let provider = ScriptedProvider::new(vec![
        tool_calls(&[("c1", END_ORCHESTRATION_TOOL, "{}"), ("c2", "lookup", "{}")]),
        text("final answer"),
    ]);
    let lookup = CountingTool::empty("lookup");
    let invoked = lookup.counter();
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(lookup)).unwrap();
    registry
        .register(Box::new(CountingTool::empty(END_ORCHESTRATION_TOOL)))
        .unwrap();

    let outcome = agent(provider.clone(), registry, 5)
        .run(initial(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.answer, "final answer");
    assert_eq!(outcome.termination, Termination::EndSignal);
    assert_eq!(outcome.tool_invocations, 2);
    assert_eq!(invoked.load(Ordering::SeqCst), 1);
    let calls = provider.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].tools.is_some());
    assert!(calls[1].tools.is_none());
}

#[tokio::test]
async fn test_budget_exhaustion_still_answers() {
    let provider = ScriptedProvider::new(vec![
        tool_calls(&[("c1", "lookup", "{}")]),
        tool_calls(&[("c2", "lookup", "{}")]),
        text("best effort"),
    ]);
    let mut registry = ToolRegistry::new();
    registry
        .register(Box::new(CountingTool::empty("lookup")))
        .unwrap();

    let outcome = agent(provider.clone(), registry, 2)
        .run(initial(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.answer, "best effort");
    assert_eq!(outcome.termination, Termination::BudgetExhausted);
    assert_eq!(outcome.iterations, 2);
    let calls = provider.calls();
    assert_eq!(calls.len(), 3);
    assert!(calls[1].tools.is_some());
    assert!(calls[2].tools.is_none());
    // system, user, then (assistant, tool) per iteration
    assert_eq!(calls[2].messages.len(), 6);
}

#[tokio::test]
async fn test_tool_calls_run_in_emitted_order() {
    let provider = ScriptedProvider::new(vec![
        tool_calls(&[("b1", "beta", "{}"), ("a1", "alpha", "{}"), ("b2", "beta", "{}")]),
        text("done"),
    ]);
    let mut registry = ToolRegistry::new();
    registry
        .register(Box::new(CountingTool::empty("alpha")))
        .unwrap();
    registry
        .register(Box::new(CountingTool::empty("beta")))
        .unwrap();

    let outcome = agent(provider, registry, 5)
        .run(initial(), &CancellationToken::new())
        .await
        .unwrap();

    let order: Vec<_> = outcome
        .messages
        .iter()
        .filter_map(|m| m.tool_call_id.as_deref())
        .collect();
    assert_eq!(order, vec!["b1", "a1", "b2"]);
}

#[tokio::test]
async fn test_unknown_tool_aborts() {
    let provider = ScriptedProvider::new(vec![tool_calls(&[("c1", "missing", "{}")])]);

    let err = agent(provider.clone(), ToolRegistry::new(), 5)
        .run(initial(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::UnknownTool(ref name) if name == "missing"));
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_malformed_arguments_abort_before_invocation() {
    let provider = ScriptedProvider::new(vec![tool_calls(&[("c1", "lookup", "{not json")])]);
    let lookup = CountingTool::empty("lookup");
    let invoked = lookup.counter();
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(lookup)).unwrap();

    let err = agent(provider, registry, 5)
        .run(initial(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ArgumentParse { ref tool, .. } if tool == "lookup"));
    assert_eq!(invoked.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_non_object_arguments_rejected() {
    let provider = ScriptedProvider::new(vec![tool_calls(&[("c1", "lookup", "[1, 2]")])]);
    let mut registry = ToolRegistry::new();
    registry
        .register(Box::new(CountingTool::empty("lookup")))
        .unwrap();

    let err = agent(provider, registry, 5)
        .run(initial(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("expected a JSON object"));
}

#[tokio::test]
async fn test_tool_failure_aborts_remaining_calls() {
    let provider = ScriptedProvider::new(vec![
        tool_calls(&[("c1", "broken", "{}"), ("c2", "lookup", "{}")]),
        text("never"),
    ]);
    let lookup = CountingTool::empty("lookup");
    let invoked = lookup.counter();
    let mut registry = ToolRegistry::new();
    registry
        .register(Box::new(CountingTool::failing("broken", "backend down")))
        .unwrap();
    registry.register(Box::new(lookup)).unwrap();

    let err = agent(provider.clone(), registry, 5)
        .run(initial(), &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        Error::ToolExecution { tool, iteration, source } => {
            assert_eq!(tool, "broken");
            assert_eq!(iteration, 1);
            assert_eq!(source.to_string(), "backend down");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(invoked.load(Ordering::SeqCst), 0);
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_provider_error_reports_iteration() {
    let provider = ScriptedProvider::new(vec![
        tool_calls(&[("c1", "lookup", "{}")]),
        failure("503 service unavailable"),
    ]);
    let mut registry = ToolRegistry::new();
    registry
        .register(Box::new(CountingTool::empty("lookup")))
        .unwrap();

    let err = agent(provider, registry, 5)
        .run(initial(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Provider { iteration: 2, .. }));
}

#[tokio::test]
async fn test_empty_choices_is_provider_error() {
    let provider = ScriptedProvider::new(vec![Ok(CompletionResponse::default())]);

    let err = agent(provider, ToolRegistry::new(), 5)
        .run(initial(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Provider {
            source: ProviderError::NoChoices,
            ..
        }
    ));
}

#[tokio::test]
async fn test_final_completion_failure() {
    let provider = ScriptedProvider::new(vec![
        tool_calls(&[("c1", END_ORCHESTRATION_TOOL, "")]),
        failure("timeout"),
    ]);
    let mut registry = ToolRegistry::new();
    registry
        .register(Box::new(CountingTool::empty(END_ORCHESTRATION_TOOL)))
        .unwrap();

    let err = agent(provider, registry, 5)
        .run(initial(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::FinalCompletion(_)));
}

#[tokio::test]
async fn test_cancelled_before_start_makes_no_calls() {
    let provider = ScriptedProvider::new(vec![text("hello")]);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = agent(provider.clone(), ToolRegistry::new(), 5)
        .run(initial(), &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Cancelled));
    assert_eq!(provider.call_count(), 0);
}

/// Cancels the run from inside a tool, as a Ctrl-C mid-batch would.
struct CancellingTool(CancellationToken);

#[async_trait::async_trait]
impl Tool for CancellingTool {
    fn name(&self) -> &str {
        "cancel"
    }

    fn description(&self) -> &str {
        "cancels the run"
    }

    fn parameters(&self) -> ToolParameters {
        ToolParameters::object()
    }

    async fn execute(&self, _args: ToolArgs) -> anyhow::Result<ToolOutput> {
        self.0.cancel();
        Ok(ToolOutput::new())
    }
}

#[tokio::test]
async fn test_cancellation_mid_batch_stops_further_work() {
    let cancel = CancellationToken::new();
    let provider = ScriptedProvider::new(vec![
        tool_calls(&[("c1", "cancel", "{}"), ("c2", "lookup", "{}")]),
        text("never"),
    ]);
    let lookup = CountingTool::empty("lookup");
    let invoked = lookup.counter();
    let mut registry = ToolRegistry::new();
    registry
        .register(Box::new(CancellingTool(cancel.clone())))
        .unwrap();
    registry.register(Box::new(lookup)).unwrap();

    let err = agent(provider.clone(), registry, 5)
        .run(initial(), &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Cancelled));
    assert_eq!(invoked.load(Ordering::SeqCst), 0);
    assert_eq!(provider.call_count(), 1);
}
