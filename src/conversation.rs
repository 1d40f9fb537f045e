//! Builds the initial transcript for a task question.

use crate::message::Message;

/// Assembles `[system prompt, task context, user message]`.
///
/// When `previous` carries text from an earlier exchange it is folded into
/// the user message so the model sees it as plain context.
pub fn build_conversation(
    system_prompt: &str,
    task_id: &str,
    execution: u32,
    previous: Option<&str>,
    message: &str,
) -> Vec<Message> {
    let user = match previous.filter(|p| !p.trim().is_empty()) {
        Some(prev) => format!(
            "here is the previous conversation context: {prev} and here is the new message prompt: {message}"
        ),
        None => message.to_string(),
    };
    vec![
        Message::system(system_prompt),
        Message::system(format!("Task ID: {task_id}, Execution: {execution}")),
        Message::user(user),
    ]
}
