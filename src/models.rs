//! Known models and their context window sizes.
//!
//! Used by `parsley models` for listing and by the summarize command to warn
//! when a log section would not fit in the selected model's context.

/// Information about a known LLM model.
pub struct ModelInfo {
    /// The model identifier string (e.g., "gpt-4.1").
    pub name: &'static str,
    /// Context window size in tokens.
    pub context_window: usize,
}

/// Known OpenAI models.
pub const OPENAI_MODELS: &[ModelInfo] = &[
    ModelInfo {
        name: "gpt-4.1",
        context_window: 1_047_576,
    },
    ModelInfo {
        name: "gpt-4.1-mini",
        context_window: 1_047_576,
    },
    ModelInfo {
        name: "gpt-4o",
        context_window: 128_000,
    },
    ModelInfo {
        name: "o4-mini",
        context_window: 200_000,
    },
];

/// Known Anthropic models.
pub const ANTHROPIC_MODELS: &[ModelInfo] = &[
    ModelInfo {
        name: "claude-sonnet-4-6",
        context_window: 200_000,
    },
    ModelInfo {
        name: "claude-opus-4-6",
        context_window: 200_000,
    },
    ModelInfo {
        name: "claude-haiku-4-5",
        context_window: 200_000,
    },
];

/// Context window for a known model, matching on the name after any
/// `provider/` prefix.
pub fn context_window_for(model: &str) -> Option<usize> {
    let name = model.rsplit('/').next().unwrap_or(model);
    OPENAI_MODELS
        .iter()
        .chain(ANTHROPIC_MODELS)
        .find(|m| m.name == name)
        .map(|m| m.context_window)
}
