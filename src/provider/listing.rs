//! Model listing and discovery.
//!
//! Displays known models grouped by provider, including dynamically
//! queried Ollama models.

use anyhow::Result;
use colored::Colorize;

use super::resolve::resolve_model;
use crate::config::Config;
use crate::models::{ModelInfo, ANTHROPIC_MODELS, OPENAI_MODELS};

/// List all available models, grouped by provider.
pub async fn list_models(config: &Config) -> Result<()> {
    let selection = resolve_model(None, None, config)?;
    let current = &selection.model;

    println!("{}\n", "Available models:".bold());
    print_group("openai", OPENAI_MODELS, current);
    println!();
    print_group("anthropic", ANTHROPIC_MODELS, current);

    println!("\n  {}:", "ollama".cyan());
    match list_ollama_models(config).await {
        Ok(models) if models.is_empty() => {
            println!("    (no models found -- run `ollama pull llama3`)");
        }
        Ok(models) => {
            for model in &models {
                let marker = if model == current { " (default)" } else { "" };
                println!("    {model}{marker}");
            }
        }
        Err(err) => {
            tracing::debug!(error = %err, "ollama model listing failed");
            println!("    {}", "(ollama not running)".dimmed());
        }
    }

    Ok(())
}

fn print_group(provider: &str, models: &[ModelInfo], current: &str) {
    println!("  {}:", provider.cyan());
    for info in models {
        let marker = if info.name == current { " (default)" } else { "" };
        println!(
            "    {}{marker} {}",
            info.name,
            format!("[{} ctx]", crate::tokens::format_number(info.context_window)).dimmed()
        );
    }
}

/// Query Ollama's local API for available models.
async fn list_ollama_models(config: &Config) -> Result<Vec<String>> {
    let url = format!("{}/api/tags", config.ollama_base_url());

    let resp: serde_json::Value = reqwest::get(&url).await?.json().await?;

    let models = resp["models"]
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|m| m["name"].as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();

    Ok(models)
}
