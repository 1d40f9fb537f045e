//! An LLM agent that answers questions about build and test tasks.
//!
//! The core is two algorithms: the tool-calling [`agent`] loop, and the
//! [`summarizer`] that condenses large logs section by section with a
//! rolling window of prior summaries. Everything else wires them to a
//! provider, a task backend, configuration, and the CLI.

pub mod agent;
pub(crate) mod cancel;
pub mod cli;
pub mod completion;
pub mod config;
pub mod constants;
pub mod conversation;
pub mod error;
pub mod evergreen;
pub mod message;
pub mod models;
pub mod provider;
pub mod session;
pub mod summarizer;
pub mod tokens;
pub mod tools;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Error, ProviderError, Result};
