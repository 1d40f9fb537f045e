//! LLM provider backends.
//!
//! Wraps rig-core's provider clients behind a [`Provider`] struct with enum
//! dispatch that implements [`CompletionProvider`](crate::completion::CompletionProvider).
//! Supports OpenAI, Anthropic, OpenRouter, and Ollama (local) via
//! [`ProviderKind`].

mod client;
mod kind;
mod listing;
mod resolve;

pub use client::Provider;
pub use kind::{default_model_for, ProviderKind};
pub use listing::list_models;
pub use resolve::{resolve_model, ModelSelection};
