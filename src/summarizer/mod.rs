//! Sequential chunked analysis of large logs with a rolling context window.
//!
//! A log is split into fixed-size [`LogSection`]s by [`segment`], and each
//! section is analyzed in order by the completion provider. The most recent
//! successful summaries ride along in a [`RollingContext`] so later sections
//! see a bounded slice of history. A failed section is recorded inline in the
//! report and skipped by the context window; it never aborts the summary.

mod context;
mod prompts;
mod segment;

pub use context::{ContextEntry, RollingContext};
pub use segment::{segment, LogSection};

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::cancel::{cancellable, ensure_active};
use crate::completion::{CompletionProvider, Usage};
use crate::constants::{DEFAULT_CONTEXT_WINDOW, DEFAULT_SECTION_SIZE_LINES};
use crate::error::{ProviderError, Result};
use crate::message::Message;
use crate::tokens;

/// Separator printed above every section block in the report.
pub const SECTION_SEPARATOR: &str =
    "================================================================";

/// Sizing for segmentation and the rolling context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummarizerConfig {
    pub section_size_lines: usize,
    pub context_window: usize,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            section_size_lines: DEFAULT_SECTION_SIZE_LINES,
            context_window: DEFAULT_CONTEXT_WINDOW,
        }
    }
}

/// The outcome of analyzing one section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    pub index: usize,
    /// The model's summary. Empty when the analysis failed.
    pub summary: String,
    pub failure: Option<String>,
}

impl AnalysisResult {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Formats this result as a report block.
    fn render(&self) -> String {
        match &self.failure {
            None => format!(
                "{SECTION_SEPARATOR}\nSECTION {} ANALYSIS\n{SECTION_SEPARATOR}\n{}",
                self.index, self.summary
            ),
            Some(err) => format!(
                "{SECTION_SEPARATOR}\nSECTION {} ANALYSIS: Error: {}",
                self.index, err
            ),
        }
    }
}

/// Per-section results plus the concatenated report text.
#[derive(Debug, Clone, Default)]
pub struct SummaryReport {
    /// One result per section, in index order.
    pub results: Vec<AnalysisResult>,
    /// All section blocks joined in index order.
    pub text: String,
    /// Token usage across every successful analysis call.
    pub usage: Usage,
}

impl SummaryReport {
    pub fn failed_sections(&self) -> usize {
        self.results.iter().filter(|r| !r.is_success()).count()
    }
}

/// Summarizes logs section by section using a [`CompletionProvider`].
pub struct LogSummarizer {
    provider: Arc<dyn CompletionProvider>,
    config: SummarizerConfig,
}

impl LogSummarizer {
    pub fn new(provider: Arc<dyn CompletionProvider>, config: SummarizerConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> SummarizerConfig {
        self.config
    }

    /// Summarizes `raw` with the configured section size and context window.
    pub async fn summarize(&self, raw: &str, cancel: &CancellationToken) -> Result<SummaryReport> {
        self.summarize_with(
            raw,
            self.config.section_size_lines,
            self.config.context_window,
            cancel,
        )
        .await
    }

    /// Segments `raw` and analyzes every section.
    ///
    /// Fails with [`Error::InvalidSectionSize`] before any provider call when
    /// `section_size_lines` is zero, and with [`Error::Cancelled`] if `cancel`
    /// fires. Per-section provider failures are recorded in the report.
    ///
    /// [`Error::InvalidSectionSize`]: crate::error::Error::InvalidSectionSize
    /// [`Error::Cancelled`]: crate::error::Error::Cancelled
    pub async fn summarize_with(
        &self,
        raw: &str,
        section_size_lines: usize,
        context_window: usize,
        cancel: &CancellationToken,
    ) -> Result<SummaryReport> {
        let sections = segment(raw, section_size_lines)?;
        tracing::info!(
            sections = sections.len(),
            section_size_lines,
            context_window,
            "summarizing log"
        );
        self.analyze(&sections, context_window, cancel).await
    }

    /// Analyzes `sections` strictly in order.
    ///
    /// Each section after the first successful one is prompted with up to
    /// `context_window` of the most recent successful summaries.
    pub async fn analyze(
        &self,
        sections: &[LogSection<'_>],
        context_window: usize,
        cancel: &CancellationToken,
    ) -> Result<SummaryReport> {
        let mut context = RollingContext::new(context_window);
        let mut report = SummaryReport::default();

        for section in sections {
            ensure_active(cancel)?;

            let prompt = if context.is_empty() {
                prompts::context_free(section)
            } else {
                prompts::with_context(&context.render(), section)
            };
            tracing::debug!(
                section = section.index,
                lines = section.line_count(),
                tokens = tokens::count_tokens(section.content),
                context_entries = context.len(),
                "analyzing section"
            );

            let outcome = cancellable(cancel, self.analyze_section(prompt)).await?;

            let result = match outcome {
                Ok((summary, usage)) => {
                    report.usage += usage;
                    context.push(section.index, summary.clone());
                    AnalysisResult {
                        index: section.index,
                        summary,
                        failure: None,
                    }
                }
                Err(err) => {
                    tracing::warn!(
                        section = section.index,
                        error = %err,
                        "section analysis failed"
                    );
                    AnalysisResult {
                        index: section.index,
                        summary: String::new(),
                        failure: Some(err.to_string()),
                    }
                }
            };
            report.results.push(result);
        }

        report.text = report
            .results
            .iter()
            .map(AnalysisResult::render)
            .collect::<Vec<_>>()
            .join("\n\n");
        Ok(report)
    }

    async fn analyze_section(
        &self,
        prompt: String,
    ) -> std::result::Result<(String, Usage), ProviderError> {
        let messages = [
            Message::system(prompts::ANALYZER_SYSTEM_PROMPT),
            Message::user(prompt),
        ];
        let response = self.provider.complete(&messages, None).await?;
        let usage = response.usage;
        let choice = response.into_first()?;
        Ok((choice.message.text().to_string(), usage))
    }
}
