// Copyright (c) 2026 CloudShip AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Ship CLI
//!
//! The `ship` binary wraps infrastructure-analysis tools in ephemeral
//! containers and layers an investigation engine and an MCP server on top.
//!
//! ## Commands
//!
//! - `ship <tool> [dir] [flags]` - run one catalogued tool against a directory
//! - `ship investigate --prompt "..."` - natural-language cloud investigation
//! - `ship query "SQL" --provider aws` - direct inventory-engine query
//! - `ship mcp [tool|all|<external>]` - serve tools over MCP on stdio
//! - `ship modules list|info` - introspect the catalogue
//! - `ship vars <tool>` - emit default variables YAML for a tool

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

mod commands;

use commands::{InvestigateArgs, McpArgs, ModulesCommand, QueryArgs, VarsArgs};

/// Ship - containerized infrastructure analysis
#[derive(Parser)]
#[command(name = "ship")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "SHIP_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a natural-language investigation against cloud inventory
    Investigate(InvestigateArgs),

    /// Run one SQL query against the inventory engine
    Query(QueryArgs),

    /// Serve tools over the Model Context Protocol on stdio
    Mcp(McpArgs),

    /// Introspect the tool catalogue
    #[command(name = "modules")]
    Modules {
        #[command(subcommand)]
        command: ModulesCommand,
    },

    /// Emit default variables YAML for a tool
    Vars(VarsArgs),

    /// Any catalogued tool name: `ship lint ./infra --format json`
    #[command(external_subcommand)]
    Tool(Vec<String>),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before clap resolves env-backed flags.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    match cli.command {
        Commands::Investigate(args) => commands::investigate::run(args).await,
        Commands::Query(args) => commands::query::run(args).await,
        Commands::Mcp(args) => commands::mcp::run(args).await,
        Commands::Modules { command } => commands::modules::run(command),
        Commands::Vars(args) => commands::vars::run(args),
        Commands::Tool(argv) => {
            let exit_code = commands::tool::run(argv).await?;
            if exit_code != 0 {
                std::process::exit(exit_code);
            }
            Ok(())
        }
    }
}

/// Initialize tracing subscriber for logging. Diagnostics go to stderr so
/// stdout stays clean for tool passthrough and the MCP stdio channel.
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
