// Copyright (c) 2026 CloudShip AI, Inc.
// SPDX-License-Identifier: Apache-2.0
//! The Ship MCP server.
//!
//! Exposes the tool catalogue over MCP: one MCP tool per exposed descriptor,
//! an input schema mirroring the descriptor's flags, two resources (help and
//! the tools catalogue), and two built-in workflow prompts. Tool failures
//! are returned as MCP error *results* with a human-readable message, never
//! JSON-RPC protocol errors, so clients can keep operating.

use crate::chunk;
use base64::Engine;
use rmcp::model::{
    AnnotateAble, CallToolRequestParams, CallToolResult, Content, GetPromptRequestParams,
    GetPromptResult, Implementation, ListPromptsResult, ListResourcesResult, ListToolsResult,
    PaginatedRequestParams, Prompt, PromptMessage, PromptMessageContent, PromptMessageRole,
    RawResource, ReadResourceRequestParams, ReadResourceResult, ResourceContents,
    ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::{ErrorData as McpError, ServerHandler};
use ship_core::application::orchestrator::ToolOrchestrator;
use ship_core::domain::invocation::{InvocationRequest, ToolOutput};
use ship_core::domain::tool::ToolDescriptor;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Marker prefixed to base64-framed binary tool output.
pub const BINARY_MARKER: &str = "BINARY_OUTPUT(base64):";

const HELP_URI: &str = "ship://help";
const TOOLS_URI: &str = "ship://tools";

/// Which part of the catalogue this server instance exposes.
#[derive(Debug, Clone)]
pub enum Exposure {
    All,
    Tool(String),
}

#[derive(Clone)]
pub struct ShipMcpServer {
    orchestrator: Arc<ToolOrchestrator>,
    exposure: Exposure,
    /// User-supplied `--var` values, resolved per call against the
    /// descriptor's declared variables.
    vars: HashMap<String, String>,
    call_timeout: Duration,
}

impl ShipMcpServer {
    pub fn new(
        orchestrator: Arc<ToolOrchestrator>,
        exposure: Exposure,
        vars: HashMap<String, String>,
    ) -> Self {
        let call_timeout = std::env::var("SHIP_MCP_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(600));

        Self {
            orchestrator,
            exposure,
            vars,
            call_timeout,
        }
    }

    fn exposed(&self) -> Vec<&ToolDescriptor> {
        match &self.exposure {
            Exposure::All => self.orchestrator.catalogue().list().iter().collect(),
            Exposure::Tool(name) => self
                .orchestrator
                .catalogue()
                .lookup(name)
                .into_iter()
                .collect(),
        }
    }

    async fn run_tool(&self, request: &CallToolRequestParams) -> CallToolResult {
        let name = request.name.to_string();
        if self.orchestrator.catalogue().lookup(&name).is_none() {
            return CallToolResult::error(vec![Content::text(format!(
                "Unknown tool '{name}'. Use tools/list to see what this server exposes."
            ))]);
        }

        let mut invocation = InvocationRequest::new(&name);
        invocation.env = self.vars.clone();
        invocation.timeout = Some(self.call_timeout);

        if let Some(arguments) = &request.arguments {
            for (key, value) in arguments {
                let rendered = match value {
                    serde_json::Value::String(s) => s.clone(),
                    serde_json::Value::Bool(b) => b.to_string(),
                    serde_json::Value::Number(n) => n.to_string(),
                    _ => continue,
                };
                if key.as_str() == "directory" {
                    invocation.directory = Some(rendered.into());
                } else {
                    invocation.flags.push((key.clone(), rendered));
                }
            }
        }
        if invocation.directory.is_none() {
            invocation.directory = Some(".".into());
        }

        debug!(tool = %name, "MCP tool call");

        match self
            .orchestrator
            .invoke(invocation, CancellationToken::new())
            .await
        {
            Ok(result) => {
                let text = match &result.output {
                    ToolOutput::Binary(bytes) => format!(
                        "{}{}",
                        BINARY_MARKER,
                        base64::engine::general_purpose::STANDARD.encode(bytes)
                    ),
                    other => {
                        let mut text = other.display();
                        if result.exit_code != 0 {
                            let stderr = String::from_utf8_lossy(&result.stderr);
                            text.push_str(&format!(
                                "\n\n(exit code {}; stderr follows)\n{}",
                                result.exit_code, stderr
                            ));
                        }
                        text
                    }
                };
                CallToolResult::success(vec![Content::text(chunk::apply_ceiling(&text))])
            }
            Err(e) => CallToolResult::error(vec![Content::text(format!("{name} failed: {e}"))]),
        }
    }

    fn help_document(&self) -> String {
        let mut out = String::from(
            "# Ship MCP Server\n\n\
             Ship wraps infrastructure analysis tools in ephemeral containers.\n\
             Call a tool with a `directory` argument pointing at the code to\n\
             analyse; other arguments become tool flags. Oversize responses\n\
             are summarised and chunked.\n\n## Exposed tools\n",
        );
        for descriptor in self.exposed() {
            out.push_str(&format!(
                "- `{}` ({}): {}\n",
                descriptor.name,
                descriptor.category.as_str(),
                descriptor.description
            ));
        }
        out
    }

    fn tools_document(&self) -> String {
        let mut out = String::from("# Ship tool catalogue\n\n");
        for descriptor in self.orchestrator.catalogue().list() {
            out.push_str(&format!(
                "## {}\n- category: {}\n- image: {}\n- description: {}\n",
                descriptor.name,
                descriptor.category.as_str(),
                descriptor.image,
                descriptor.description
            ));
            for flag in &descriptor.flags {
                match &flag.allowed {
                    Some(allowed) => out.push_str(&format!(
                        "- flag `{}`: {} (one of: {})\n",
                        flag.name,
                        flag.description,
                        allowed.join(", ")
                    )),
                    None => {
                        out.push_str(&format!("- flag `{}`: {}\n", flag.name, flag.description))
                    }
                }
            }
            out.push('\n');
        }
        out
    }
}

/// Build the MCP input schema for one descriptor: typed strings with enum
/// constraints where the flag declares them.
pub fn input_schema(descriptor: &ToolDescriptor) -> serde_json::Map<String, serde_json::Value> {
    let mut properties = serde_json::Map::new();
    properties.insert(
        "directory".to_string(),
        serde_json::json!({
            "type": "string",
            "description": "Host directory to analyse (mounted read-only at /workspace)"
        }),
    );

    for flag in &descriptor.flags {
        let mut schema = serde_json::Map::new();
        schema.insert("type".to_string(), serde_json::json!("string"));
        schema.insert(
            "description".to_string(),
            serde_json::json!(flag.description),
        );
        if let Some(allowed) = &flag.allowed {
            schema.insert("enum".to_string(), serde_json::json!(allowed));
        }
        properties.insert(flag.name.clone(), serde_json::Value::Object(schema));
    }

    let schema = serde_json::json!({
        "type": "object",
        "properties": properties,
    });
    schema.as_object().cloned().unwrap_or_default()
}

fn to_mcp_tool(descriptor: &ToolDescriptor) -> Tool {
    Tool {
        name: Cow::Owned(descriptor.name.clone()),
        title: None,
        description: Some(Cow::Owned(descriptor.description.clone())),
        input_schema: Arc::new(input_schema(descriptor)),
        annotations: None,
        output_schema: None,
        icons: None,
        meta: None,
    }
}

const SECURITY_AUDIT_PROMPT: &str = "Run a security audit of the Terraform \
code in the target directory. Start with `checkov` and `tfsec`, then `trivy` \
for vulnerabilities and secrets. Collect every failed check, group findings \
by severity, and finish with a prioritised remediation list.";

const COST_OPTIMIZATION_PROMPT: &str = "Analyse the infrastructure for cost \
savings. Run `cost` over the target directory for an estimate, look for \
oversized instance types and unattached volumes in the configuration, and \
summarise concrete right-sizing recommendations with estimated impact.";

impl ServerHandler for ShipMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .enable_prompts()
                .build(),
            server_info: Implementation {
                name: "ship".into(),
                title: Some("Ship Infrastructure Analysis".into()),
                version: env!("CARGO_PKG_VERSION").into(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Ship exposes containerized infrastructure-analysis tools. \
                 Pass a `directory` argument with each call; results come back \
                 as text, summarised when very large."
                    .into(),
            ),
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        let tools = self.exposed().into_iter().map(to_mcp_tool).collect();
        std::future::ready(Ok(ListToolsResult {
            tools,
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
        async move { Ok(self.run_tool(&request).await) }
    }

    fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourcesResult, McpError>> + Send + '_ {
        let mut help = RawResource::new(HELP_URI, "Ship help".to_string());
        help.description = Some("How to drive Ship over MCP".to_string());
        help.mime_type = Some("text/markdown".to_string());

        let mut tools = RawResource::new(TOOLS_URI, "Tool catalogue".to_string());
        tools.description = Some("Every catalogued tool with its flags".to_string());
        tools.mime_type = Some("text/markdown".to_string());

        std::future::ready(Ok(ListResourcesResult {
            resources: vec![help.no_annotation(), tools.no_annotation()],
            next_cursor: None,
            meta: None,
        }))
    }

    #[allow(clippy::manual_async_fn)]
    fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ReadResourceResult, McpError>> + Send + '_ {
        async move {
            let contents = match request.uri.as_str() {
                HELP_URI => self.help_document(),
                TOOLS_URI => self.tools_document(),
                other => {
                    return Err(McpError::invalid_params(
                        format!("unknown resource uri: {other}"),
                        None,
                    ));
                }
            };
            Ok(ReadResourceResult {
                contents: vec![ResourceContents::text(contents, request.uri)],
            })
        }
    }

    fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListPromptsResult, McpError>> + Send + '_ {
        std::future::ready(Ok(ListPromptsResult {
            prompts: vec![
                Prompt::new(
                    "security-audit",
                    Some("Audit IaC for security findings, grouped by severity"),
                    None,
                ),
                Prompt::new(
                    "cost-optimization",
                    Some("Find cost savings in the target infrastructure"),
                    None,
                ),
            ],
            next_cursor: None,
            meta: None,
        }))
    }

    #[allow(clippy::manual_async_fn)]
    fn get_prompt(
        &self,
        request: GetPromptRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<GetPromptResult, McpError>> + Send + '_ {
        async move {
            let (description, text) = match request.name.as_str() {
                "security-audit" => ("Security audit workflow", SECURITY_AUDIT_PROMPT),
                "cost-optimization" => ("Cost optimization workflow", COST_OPTIMIZATION_PROMPT),
                other => {
                    return Err(McpError::invalid_params(
                        format!("unknown prompt: {other}"),
                        None,
                    ));
                }
            };
            Ok(GetPromptResult {
                description: Some(description.to_string()),
                messages: vec![PromptMessage {
                    role: PromptMessageRole::User,
                    content: PromptMessageContent::Text {
                        text: text.to_string(),
                    },
                }],
            })
        }
    }
}

/// Serve over the process stdio until the client disconnects.
pub async fn serve_stdio(server: ShipMcpServer) -> anyhow::Result<()> {
    info!("starting Ship MCP server on stdio");
    let transport = rmcp::transport::io::stdio();
    let service = rmcp::serve_server(server, transport).await?;
    service.waiting().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ship_core::domain::runtime::{ContainerRuntime, RunOutput, RunSpec, RuntimeError};
    use ship_core::infrastructure::catalogue::Catalogue;

    struct NoopRuntime;

    #[async_trait::async_trait]
    impl ContainerRuntime for NoopRuntime {
        async fn run(
            &self,
            _spec: RunSpec,
            _cancel: CancellationToken,
        ) -> Result<RunOutput, RuntimeError> {
            Ok(RunOutput {
                stdout: b"ok".to_vec(),
                stderr: Vec::new(),
                exit_code: 0,
                duration: Duration::from_millis(1),
            })
        }

        async fn healthcheck(&self) -> Result<(), RuntimeError> {
            Ok(())
        }
    }

    fn server(exposure: Exposure) -> ShipMcpServer {
        let orchestrator = Arc::new(ToolOrchestrator::new(
            Arc::new(Catalogue::builtin()),
            Arc::new(NoopRuntime),
        ));
        ShipMcpServer::new(orchestrator, exposure, HashMap::new())
    }

    #[test]
    fn test_single_tool_exposure() {
        let server = server(Exposure::Tool("checkov".to_string()));
        let exposed = server.exposed();
        assert_eq!(exposed.len(), 1);
        assert_eq!(exposed[0].name, "checkov");
    }

    #[test]
    fn test_all_exposure_covers_catalogue() {
        let server = server(Exposure::All);
        assert_eq!(
            server.exposed().len(),
            server.orchestrator.catalogue().len()
        );
    }

    #[test]
    fn test_input_schema_mirrors_flags() {
        let catalogue = Catalogue::builtin();
        let checkov = catalogue.lookup("checkov").unwrap();
        let schema = input_schema(checkov);

        let properties = schema.get("properties").unwrap().as_object().unwrap();
        assert!(properties.contains_key("directory"));
        let format = properties.get("format").unwrap();
        assert_eq!(format["type"], "string");
        assert!(format["enum"].as_array().unwrap().len() >= 2);
    }

    #[test]
    fn test_help_document_lists_exposed_tools() {
        let server = server(Exposure::Tool("lint".to_string()));
        let help = server.help_document();
        assert!(help.contains("`lint`"));
        assert!(!help.contains("`checkov`"));
    }
}
