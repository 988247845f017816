// Copyright (c) 2026 CloudShip AI, Inc.
// SPDX-License-Identifier: Apache-2.0
//! Registry of known external MCP servers.
//!
//! When the requested server name matches one of these, Ship becomes a
//! transparent proxy instead of serving its own catalogue. Each entry
//! declares the child command and the variables it accepts; required
//! variables are validated before the child is ever spawned.

use ship_core::domain::tool::Variable;
use std::collections::HashMap;

/// Transport to the child server. Only stdio is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Stdio,
}

/// One proxied external server. Immutable after construction.
#[derive(Debug, Clone)]
pub struct ExternalServerConfig {
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
    pub transport: Transport,
    /// Fixed environment, merged under resolved variables.
    pub env: HashMap<String, String>,
    pub variables: Vec<Variable>,
    pub description: String,
}

fn npx_server(name: &str, package: &str, description: &str) -> ExternalServerConfig {
    ExternalServerConfig {
        name: name.to_string(),
        command: "npx".to_string(),
        args: vec!["-y".to_string(), package.to_string()],
        transport: Transport::Stdio,
        env: HashMap::new(),
        variables: Vec::new(),
        description: description.to_string(),
    }
}

/// The full registry, one entry per supported external server.
pub fn external_servers() -> Vec<ExternalServerConfig> {
    let mut filesystem = npx_server(
        "filesystem",
        "@modelcontextprotocol/server-filesystem",
        "File read/write access under a configurable root",
    );
    filesystem.args.push("/tmp".to_string());
    filesystem.variables.push(
        Variable::optional("FILESYSTEM_ROOT", "directory subtree the server may access")
            .with_default("/tmp"),
    );

    let memory = npx_server(
        "memory",
        "@modelcontextprotocol/server-memory",
        "Knowledge-graph memory shared across conversations",
    );

    let mut brave_search = npx_server(
        "brave-search",
        "@modelcontextprotocol/server-brave-search",
        "Web search via the Brave Search API",
    );
    brave_search.variables.push(
        Variable::required("BRAVE_API_KEY", "Brave Search API key (get one at brave.com/search/api)")
            .secret(),
    );

    let fetch = ExternalServerConfig {
        name: "fetch".to_string(),
        command: "uvx".to_string(),
        args: vec!["mcp-server-fetch".to_string()],
        transport: Transport::Stdio,
        env: HashMap::new(),
        variables: Vec::new(),
        description: "Fetch and convert web content for LLM consumption".to_string(),
    };

    vec![filesystem, memory, brave_search, fetch]
}

/// Look up one external server by name.
pub fn external_server(name: &str) -> Option<ExternalServerConfig> {
    external_servers().into_iter().find(|s| s.name == name)
}
