//! Prompt templates for section analysis.

use super::segment::LogSection;

/// System prompt for every section analysis call.
pub const ANALYZER_SYSTEM_PROMPT: &str =
    "You are a log analysis assistant for a continuous integration system. \
You read one section of a task log at a time and report what happened in it: \
commands run, tests that failed, errors, stack traces, timeouts, and anything \
that looks like a root cause. Quote exact error lines when they matter. \
Be concise and do not invent details that are not in the log.";

/// Prompt for a section with no prior context.
pub fn context_free(section: &LogSection<'_>) -> String {
    format!(
        "Analyze section {} of a task log.\n\n\
--- LOG SECTION {} ---\n{}\n--- END LOG SECTION ---\n\n\
Summarize the notable events and any errors in this section.",
        section.index, section.index, section.content
    )
}

/// Prompt for a section given summaries of earlier sections.
pub fn with_context(context_block: &str, section: &LogSection<'_>) -> String {
    format!(
        "Analyze section {} of a task log.\n\n\
Summaries of the preceding sections, oldest first:\n\n{}\n\n\
--- LOG SECTION {} ---\n{}\n--- END LOG SECTION ---\n\n\
Summarize the notable events and any errors in this section. \
Point out when it continues or resolves something from the earlier sections.",
        section.index, context_block, section.index, section.content
    )
}
