// Copyright (c) 2026 CloudShip AI, Inc.
// SPDX-License-Identifier: Apache-2.0

pub mod investigate;
pub mod mcp;
pub mod modules;
pub mod query;
pub mod tool;
pub mod vars;

pub use investigate::InvestigateArgs;
pub use mcp::McpArgs;
pub use modules::ModulesCommand;
pub use query::QueryArgs;
pub use vars::VarsArgs;

use anyhow::Result;
use ship_core::application::orchestrator::ToolOrchestrator;
use ship_core::infrastructure::catalogue::Catalogue;
use ship_core::infrastructure::docker::{DockerRuntime, DEFAULT_MAX_PARALLEL};
use std::sync::Arc;

/// Wire the catalogue and container runtime into an orchestrator. Every
/// command that executes tools goes through here.
pub fn build_orchestrator() -> Result<Arc<ToolOrchestrator>> {
    let socket = std::env::var("SHIP_DOCKER_SOCKET").ok();
    let max_parallel = std::env::var("SHIP_MAX_CONTAINERS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_MAX_PARALLEL);

    let runtime = DockerRuntime::new(socket, max_parallel)?;
    Ok(Arc::new(ToolOrchestrator::new(
        Arc::new(Catalogue::builtin()),
        Arc::new(runtime),
    )))
}

/// Cancellation token wired to Ctrl-C, propagated into container waits and
/// LLM calls.
pub fn cancel_on_ctrl_c() -> tokio_util::sync::CancellationToken {
    let cancel = tokio_util::sync::CancellationToken::new();
    let child = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            child.cancel();
        }
    });
    cancel
}
