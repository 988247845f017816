// Copyright (c) 2026 CloudShip AI, Inc.
// SPDX-License-Identifier: Apache-2.0
//! `ship mcp [tool|all|<external>] [--var K=V]...`.
//!
//! Three shapes share one entry point: expose the whole catalogue, expose a
//! single tool, or proxy a known external MCP server.

use anyhow::{bail, Result};
use clap::Args;
use ship_core::application::variables;
use ship_mcp::server::{serve_stdio, Exposure, ShipMcpServer};
use ship_mcp::{external_server, run_proxy};

#[derive(Args)]
pub struct McpArgs {
    /// Tool name, `all`, or an external server (filesystem, memory, ...)
    #[arg(default_value = "all")]
    pub target: String,

    /// Variable for the tool or external server, repeatable
    #[arg(long = "var", value_name = "KEY=VALUE")]
    pub vars: Vec<String>,
}

pub async fn run(args: McpArgs) -> Result<()> {
    let user_vars = variables::parse_var_flags(&args.vars)?;

    // External servers take precedence: `ship mcp filesystem` proxies even
    // though the catalogue could one day grow a tool of the same name.
    if let Some(config) = external_server(&args.target) {
        run_proxy(config, user_vars).await?;
        return Ok(());
    }

    let orchestrator = super::build_orchestrator()?;
    let exposure = match args.target.as_str() {
        "all" => Exposure::All,
        name => {
            if orchestrator.catalogue().lookup(name).is_none() {
                bail!(
                    "'{name}' is neither a catalogued tool nor a known external server; \
                     try `ship modules list`"
                );
            }
            Exposure::Tool(name.to_string())
        }
    };

    serve_stdio(ShipMcpServer::new(orchestrator, exposure, user_vars)).await
}
