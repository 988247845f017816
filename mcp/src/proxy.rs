// Copyright (c) 2026 CloudShip AI, Inc.
// SPDX-License-Identifier: Apache-2.0
//! External MCP server proxy.
//!
//! Ship spawns the configured third-party server as a child process, runs
//! the MCP handshake against it, discovers its tools, and re-exports them
//! verbatim over the parent's stdio. Required variables are validated
//! before the child is spawned; the child is terminated on every exit path
//! (parent-stream EOF included) because dropping the client service cancels
//! its transport and reaps the child.

use crate::external::ExternalServerConfig;
use rmcp::model::{
    CallToolRequestParams, CallToolResult, ClientInfo, Implementation, ListToolsResult,
    PaginatedRequestParams, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::{Peer, RequestContext, RoleClient, RoleServer};
use rmcp::transport::child_process::TokioChildProcess;
use rmcp::{serve_client, serve_server, ErrorData as McpError, ServerHandler};
use ship_core::application::variables::{self, VariableError};
use std::collections::HashMap;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("missing required variable {name}: {description}")]
    MissingVariable { name: String, description: String },

    #[error("malformed variable: {0}")]
    MalformedVariable(String),

    #[error("failed to spawn external server '{name}': {reason}")]
    Spawn { name: String, reason: String },

    #[error("MCP handshake with '{name}' failed: {reason}")]
    Handshake { name: String, reason: String },

    #[error("tool discovery against '{name}' failed: {reason}")]
    Discovery { name: String, reason: String },

    #[error("serving the proxy failed: {0}")]
    Serve(String),
}

/// Local server that re-exports the child's tools and forwards calls.
#[derive(Clone)]
struct ProxyServer {
    upstream: String,
    peer: Peer<RoleClient>,
    tools: Vec<Tool>,
}

impl ServerHandler for ProxyServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "ship".into(),
                title: Some(format!("Ship proxy for {}", self.upstream)),
                version: env!("CARGO_PKG_VERSION").into(),
                icons: None,
                website_url: None,
            },
            instructions: Some(format!(
                "Transparent proxy: every tool listed here is forwarded to the \
                 external '{}' MCP server.",
                self.upstream
            )),
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        std::future::ready(Ok(ListToolsResult {
            tools: self.tools.clone(),
            next_cursor: None,
            meta: None,
        }))
    }

    #[allow(clippy::manual_async_fn)]
    fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move {
            let forwarded = CallToolRequestParams {
                meta: None,
                name: request.name.clone(),
                arguments: request.arguments.clone(),
                task: None,
            };
            match self.peer.call_tool(forwarded).await {
                Ok(result) => Ok(result),
                Err(e) => Ok(CallToolResult::error(vec![rmcp::model::Content::text(
                    format!("external server '{}' failed: {}", self.upstream, e),
                )])),
            }
        }
    }
}

/// Run the proxy until the parent stream closes.
///
/// Order matters: variables are validated first (a missing required variable
/// exits before any child exists), then the child is spawned and the
/// handshake performed, and only then does the local server start accepting
/// frames.
pub async fn run_proxy(
    config: ExternalServerConfig,
    user_vars: HashMap<String, String>,
) -> Result<(), ProxyError> {
    let env = variables::resolve(&config.variables, &user_vars).map_err(|e| match e {
        VariableError::MissingRequired { name, description } => {
            ProxyError::MissingVariable { name, description }
        }
        VariableError::Malformed(pair) => ProxyError::MalformedVariable(pair),
    })?;

    let mut cmd = Command::new(&config.command);
    cmd.args(&config.args);
    for (key, value) in &config.env {
        cmd.env(key, value);
    }
    for (key, value) in &env {
        cmd.env(key, value);
    }
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null());

    // Own process group so signals aimed at the child do not leak to the
    // parent and vice versa.
    #[cfg(unix)]
    cmd.process_group(0);

    info!(
        server = %config.name,
        command = %config.command,
        args = ?config.args,
        env_vars = ?env.keys().collect::<Vec<_>>(),
        "spawning external MCP server"
    );

    let transport = TokioChildProcess::new(cmd).map_err(|e| ProxyError::Spawn {
        name: config.name.clone(),
        reason: e.to_string(),
    })?;

    let client_info = ClientInfo {
        meta: None,
        protocol_version: Default::default(),
        capabilities: Default::default(),
        client_info: Implementation {
            name: "ship".into(),
            title: Some("Ship MCP Proxy".into()),
            version: env!("CARGO_PKG_VERSION").into(),
            icons: None,
            website_url: None,
        },
    };

    let service = serve_client(client_info, transport)
        .await
        .map_err(|e| ProxyError::Handshake {
            name: config.name.clone(),
            reason: e.to_string(),
        })?;
    let peer = service.peer().clone();

    let tools = peer
        .list_all_tools()
        .await
        .map_err(|e| ProxyError::Discovery {
            name: config.name.clone(),
            reason: e.to_string(),
        })?;
    info!(server = %config.name, tool_count = tools.len(), "discovered external tools");

    let proxy = ProxyServer {
        upstream: config.name.clone(),
        peer,
        tools,
    };

    let local = serve_server(proxy, rmcp::transport::io::stdio())
        .await
        .map_err(|e| ProxyError::Serve(e.to_string()))?;

    // Returns when the parent stream reaches EOF or the client disconnects.
    if let Err(e) = local.waiting().await {
        warn!(error = %e, "proxy server ended with error");
    }

    // Dropping the client service cancels its transport and reaps the child.
    drop(service);
    info!(server = %config.name, "external MCP server stopped");
    Ok(())
}
