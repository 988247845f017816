// Copyright (c) 2026 CloudShip AI, Inc.
// SPDX-License-Identifier: Apache-2.0
//! `ship investigate --prompt "..."`.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use sha2::{Digest, Sha256};
use ship_core::application::inventory::InventoryClient;
use ship_core::domain::provider::Provider;
use ship_core::infrastructure::llm::OpenAiChat;
use ship_cortex::application::investigator::{Investigator, InvestigatorConfig};
use ship_cortex::application::schema_cache::SchemaCache;
use ship_cortex::application::store::MemoryStore;
use ship_cortex::domain::investigation::{InvestigationRequest, InvestigationResult};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args)]
pub struct InvestigateArgs {
    /// What to investigate, in plain language
    #[arg(short, long)]
    pub prompt: String,

    /// Cloud provider to investigate
    #[arg(long, default_value = "aws")]
    pub provider: Provider,

    /// Region to focus on
    #[arg(long)]
    pub region: Option<String>,

    /// Write the full result JSON into this directory
    #[arg(long, value_name = "DIR")]
    pub save_results: Option<PathBuf>,

    /// Maximum investigation steps
    #[arg(long, default_value = "10")]
    pub steps: usize,
}

pub async fn run(args: InvestigateArgs) -> Result<()> {
    let orchestrator = super::build_orchestrator()?;
    let inventory = Arc::new(InventoryClient::new(orchestrator));
    let llm = Arc::new(OpenAiChat::from_env().context("configuring the LLM endpoint")?);

    let memory_path = std::env::var("SHIP_MEMORY_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| MemoryStore::default_path());
    let store = Arc::new(MemoryStore::open(memory_path).await);
    let schema_cache = Arc::new(SchemaCache::new());

    let config = InvestigatorConfig {
        max_steps: args.steps,
        ..Default::default()
    };
    let investigator = Investigator::new(llm, inventory, schema_cache, store, config);

    let prompt = args.prompt.clone();
    let mut request = InvestigationRequest::new(args.prompt, args.provider);
    request.region = args.region;
    request.credentials = args.provider.credentials_from_env();

    // Outer deadline for the whole investigation; the token propagates the
    // timeout down to any in-flight container or LLM call.
    let deadline = std::env::var("SHIP_INVESTIGATE_TIMEOUT")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(std::time::Duration::from_secs)
        .unwrap_or(std::time::Duration::from_secs(600));

    let cancel = super::cancel_on_ctrl_c();
    let result = tokio::select! {
        result = investigator.investigate(request, cancel.clone()) => result?,
        _ = tokio::time::sleep(deadline) => {
            cancel.cancel();
            anyhow::bail!("investigation timed out after {}s", deadline.as_secs());
        }
    };

    print_result(&result);

    if let Some(dir) = args.save_results {
        let path = save_result(&dir, &prompt, &result)?;
        println!("\n{} {}", "saved:".dimmed(), path.display());
    }

    Ok(())
}

fn print_result(result: &InvestigationResult) {
    println!("{}", "Investigation".bold().underline());
    println!("{}", result.summary);

    if !result.steps.is_empty() {
        println!("\n{}", "Queries".bold());
        for step in &result.steps {
            match (&step.result_count, &step.error) {
                (Some(count), _) => println!(
                    "  {} {} ({} rows, {}ms)",
                    format!("{}.", step.step).dimmed(),
                    step.sql,
                    count,
                    step.duration_ms
                ),
                (None, Some(error)) => println!(
                    "  {} {} ({})",
                    format!("{}.", step.step).dimmed(),
                    step.sql,
                    error.red()
                ),
                (None, None) => {}
            }
        }
    }

    if !result.insights.is_empty() {
        println!("\n{}", "Insights".bold());
        for insight in &result.insights {
            let severity = format!("{:?}", insight.severity).to_uppercase();
            let tag = match severity.as_str() {
                "CRITICAL" | "HIGH" => severity.red().bold(),
                "MEDIUM" => severity.yellow(),
                _ => severity.normal(),
            };
            println!("  [{}] {}", tag, insight.title.bold());
            println!("      {}", insight.recommendation);
        }
    }

    println!(
        "\n{} {} queries, {:.0}% confidence, {}ms",
        "done:".dimmed(),
        result.query_count,
        result.confidence * 100.0,
        result.duration_ms
    );
}

/// `investigation_<timestamp>_<prompt-prefix-hash>.json`
fn save_result(dir: &PathBuf, prompt: &str, result: &InvestigationResult) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating results directory {}", dir.display()))?;

    let mut hasher = Sha256::new();
    hasher.update(prompt.chars().take(64).collect::<String>());
    let digest = hasher.finalize();
    let hash = hex_prefix(&digest, 8);

    let filename = format!(
        "investigation_{}_{}.json",
        result.timestamp.format("%Y%m%dT%H%M%S"),
        hash
    );
    let path = dir.join(filename);
    let json = serde_json::to_string_pretty(result)?;
    std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

fn hex_prefix(bytes: &[u8], chars: usize) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<String>()
        .chars()
        .take(chars)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_prefix() {
        assert_eq!(hex_prefix(&[0xab, 0xcd, 0xef], 4), "abcd");
        assert_eq!(hex_prefix(&[0x01], 8), "01");
    }
}
