// Copyright (c) 2026 CloudShip AI, Inc.
// SPDX-License-Identifier: Apache-2.0
//! Tool invocation orchestrator.
//!
//! Composes the module catalogue and the container runtime: resolves a
//! request into a concrete container run, then normalizes the captured
//! output. Tools can be requested in library mode (result returned as a
//! value) or pipe mode (stdout forwarded to the caller's stdout); both share
//! the same invocation path.

use crate::application::variables::{self, VariableError};
use crate::domain::invocation::{
    InvocationRequest, InvocationResult, OrchestratorError, ToolOutput,
};
use crate::domain::runtime::{Bind, ContainerRuntime, RunSpec};
use crate::domain::tool::{OutputMode, ToolDescriptor};
use crate::infrastructure::catalogue::Catalogue;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Fixed container path the working directory is mounted at.
pub const WORKSPACE_PATH: &str = "/workspace";
/// Fixed container path for result files that must persist to the host.
pub const OUTPUT_PATH: &str = "/output";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{([a-z_]+)\}").unwrap());

/// Declared stderr classifier table. Structured exit status is consulted
/// first; these substring patterns are the documented fallback.
static SCHEMA_COLUMN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"column "?([A-Za-z0-9_.]+)"? does not exist"#).unwrap());
static SCHEMA_RELATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(relation|table) "?([A-Za-z0-9_.]+)"? does not exist"#).unwrap());

pub struct ToolOrchestrator {
    catalogue: Arc<Catalogue>,
    runtime: Arc<dyn ContainerRuntime>,
}

impl ToolOrchestrator {
    pub fn new(catalogue: Arc<Catalogue>, runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self { catalogue, runtime }
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    /// Library mode: run the tool and return the captured result.
    pub async fn invoke(
        &self,
        request: InvocationRequest,
        cancel: CancellationToken,
    ) -> Result<InvocationResult, OrchestratorError> {
        let descriptor = self
            .catalogue
            .lookup(&request.tool)
            .ok_or_else(|| OrchestratorError::UnknownTool(request.tool.clone()))?;

        let spec = build_spec(descriptor, &request)?;
        debug!(tool = %request.tool, image = %spec.image, "dispatching container run");

        let output = self.runtime.run(spec, cancel).await?;

        if output.exit_code != 0 {
            if let Some(classified) = classify_stderr(&output.stderr_lossy()) {
                return Err(classified);
            }
            // Unclassified non-zero exits are data, not errors: scanners
            // signal findings through their exit code.
        }

        let normalized = normalize_output(&request.tool, descriptor.output_mode, &output.stdout);

        Ok(InvocationResult {
            exit_code: output.exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
            duration: output.duration,
            output: normalized,
        })
    }

    /// Pipe mode: forward the tool's stdout/stderr to the caller's stdio and
    /// return the child exit code.
    pub async fn invoke_piped(
        &self,
        request: InvocationRequest,
        cancel: CancellationToken,
    ) -> Result<i64, OrchestratorError> {
        let result = self.invoke(request, cancel).await?;

        let mut stdout = std::io::stdout().lock();
        let _ = stdout.write_all(&result.stdout);
        let _ = stdout.flush();
        if !result.stderr.is_empty() {
            let mut stderr = std::io::stderr().lock();
            let _ = stderr.write_all(&result.stderr);
        }

        Ok(result.exit_code)
    }
}

/// Resolve a request against its descriptor into a runnable container spec.
fn build_spec(
    descriptor: &ToolDescriptor,
    request: &InvocationRequest,
) -> Result<RunSpec, OrchestratorError> {
    let env = variables::resolve(&descriptor.env_spec, &request.env).map_err(|e| match e {
        VariableError::MissingRequired { name, description } => {
            OrchestratorError::MissingVariable { name, description }
        }
        VariableError::Malformed(pair) => OrchestratorError::InvalidTemplate {
            tool: descriptor.name.clone(),
            placeholder: pair,
        },
    })?;

    let mut consumed = HashSet::new();
    let mut argv = Vec::with_capacity(descriptor.entrypoint.len() + request.flags.len() * 2);
    for token in &descriptor.entrypoint {
        argv.push(substitute(descriptor, request, token, &mut consumed)?);
    }

    // Remaining caller flags, in caller order.
    for (name, value) in &request.flags {
        if consumed.contains(name.as_str()) {
            continue;
        }
        match value.as_str() {
            "true" => argv.push(format!("--{name}")),
            "false" => {}
            _ => {
                argv.push(format!("--{name}"));
                argv.push(value.clone());
            }
        }
    }
    argv.extend(request.args.iter().cloned());

    let mut binds = Vec::new();
    for mount in &descriptor.mounts {
        let host = match mount.param.as_str() {
            "directory" => request.directory.clone(),
            "output" => request.output_dir.clone(),
            _ => None,
        };
        if let Some(host_path) = host {
            binds.push(Bind {
                host_path,
                container_path: mount.container_path.clone(),
                read_only: mount.read_only,
            });
        }
    }

    let workdir = binds
        .iter()
        .any(|b| b.container_path == WORKSPACE_PATH)
        .then(|| WORKSPACE_PATH.to_string());

    let timeout = request
        .timeout
        .or_else(|| descriptor.timeout_secs.map(Duration::from_secs))
        .unwrap_or(DEFAULT_TIMEOUT);

    Ok(RunSpec {
        image: descriptor.image.clone(),
        argv,
        binds,
        env,
        workdir,
        network: true,
        timeout,
    })
}

/// Substitute `{name}` placeholders in one template token.
fn substitute(
    descriptor: &ToolDescriptor,
    request: &InvocationRequest,
    token: &str,
    consumed: &mut HashSet<String>,
) -> Result<String, OrchestratorError> {
    let mut failed: Option<String> = None;
    let out = PLACEHOLDER.replace_all(token, |caps: &regex::Captures<'_>| {
        let name = &caps[1];
        let value = match name {
            "directory" => request.directory.as_ref().map(|_| WORKSPACE_PATH.to_string()),
            "output" => request.output_dir.as_ref().map(|_| OUTPUT_PATH.to_string()),
            "format" => request
                .flag_value("format")
                .map(str::to_string)
                .or_else(|| descriptor.default_format.clone()),
            other => request.flag_value(other).map(str::to_string),
        };
        match value {
            Some(v) => {
                consumed.insert(name.to_string());
                v
            }
            None => {
                failed.get_or_insert_with(|| name.to_string());
                String::new()
            }
        }
    });

    match failed {
        Some(placeholder) => Err(OrchestratorError::InvalidTemplate {
            tool: descriptor.name.clone(),
            placeholder,
        }),
        None => Ok(out.into_owned()),
    }
}

/// Apply the descriptor's output mode to captured stdout.
fn normalize_output(tool: &str, mode: OutputMode, stdout: &[u8]) -> ToolOutput {
    match mode {
        OutputMode::Binary => ToolOutput::Binary(stdout.to_vec()),
        OutputMode::Text => ToolOutput::Text(String::from_utf8_lossy(stdout).to_string()),
        OutputMode::Json => {
            let text = String::from_utf8_lossy(stdout).to_string();
            match serde_json::from_str::<serde_json::Value>(&text) {
                Ok(value) => ToolOutput::Json(value),
                Err(err) => {
                    warn!(%tool, %err, "tool declared json output but stdout did not parse; returning text");
                    ToolOutput::Text(text)
                }
            }
        }
    }
}

/// Fallback stderr classification.
pub fn classify_stderr(stderr: &str) -> Option<OrchestratorError> {
    if let Some(caps) = SCHEMA_COLUMN.captures(stderr) {
        return Some(OrchestratorError::Schema {
            message: first_line(stderr),
            column: Some(caps[1].to_string()),
        });
    }
    if SCHEMA_RELATION.is_match(stderr) {
        return Some(OrchestratorError::Schema {
            message: first_line(stderr),
            column: None,
        });
    }
    None
}

fn first_line(text: &str) -> String {
    text.lines().next().unwrap_or("").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::runtime::{RunOutput, RuntimeError};
    use crate::domain::tool::{FlagSpec, MountSpec, ToolCategory, Variable};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::path::PathBuf;

    struct FakeRuntime {
        last_spec: Mutex<Option<RunSpec>>,
        stdout: Vec<u8>,
        stderr: Vec<u8>,
        exit_code: i64,
    }

    impl FakeRuntime {
        fn ok(stdout: &str) -> Self {
            Self {
                last_spec: Mutex::new(None),
                stdout: stdout.as_bytes().to_vec(),
                stderr: Vec::new(),
                exit_code: 0,
            }
        }

        fn failing(exit_code: i64, stderr: &str) -> Self {
            Self {
                last_spec: Mutex::new(None),
                stdout: Vec::new(),
                stderr: stderr.as_bytes().to_vec(),
                exit_code,
            }
        }
    }

    #[async_trait]
    impl ContainerRuntime for FakeRuntime {
        async fn run(
            &self,
            spec: RunSpec,
            _cancel: CancellationToken,
        ) -> Result<RunOutput, RuntimeError> {
            *self.last_spec.lock() = Some(spec);
            Ok(RunOutput {
                stdout: self.stdout.clone(),
                stderr: self.stderr.clone(),
                exit_code: self.exit_code,
                duration: Duration::from_millis(5),
            })
        }

        async fn healthcheck(&self) -> Result<(), RuntimeError> {
            Ok(())
        }
    }

    fn lint_descriptor() -> ToolDescriptor {
        ToolDescriptor {
            name: "lint".to_string(),
            category: ToolCategory::Terraform,
            image: "ghcr.io/terraform-linters/tflint:latest".to_string(),
            entrypoint: vec![
                "tflint".to_string(),
                "--chdir".to_string(),
                "{directory}".to_string(),
                "--format".to_string(),
                "{format}".to_string(),
            ],
            mounts: vec![MountSpec::workspace()],
            env_spec: vec![Variable::optional("TFLINT_LOG", "tflint log level")],
            flags: vec![FlagSpec::new("format", "output format").one_of(&["default", "json"])],
            output_mode: OutputMode::Text,
            default_format: Some("default".to_string()),
            timeout_secs: None,
            description: "Lint Terraform configuration".to_string(),
        }
    }

    fn orchestrator_with(
        descriptor: ToolDescriptor,
        runtime: Arc<FakeRuntime>,
    ) -> ToolOrchestrator {
        let catalogue = Arc::new(Catalogue::from_descriptors(vec![descriptor]));
        ToolOrchestrator::new(catalogue, runtime)
    }

    #[tokio::test]
    async fn test_unknown_tool_is_rejected() {
        let runtime = Arc::new(FakeRuntime::ok(""));
        let orch = orchestrator_with(lint_descriptor(), runtime);
        let err = orch
            .invoke(InvocationRequest::new("nosuch"), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::UnknownTool(name) if name == "nosuch"));
    }

    #[tokio::test]
    async fn test_workspace_mount_and_argv_assembly() {
        let runtime = Arc::new(FakeRuntime::ok("2 issues found"));
        let orch = orchestrator_with(lint_descriptor(), runtime.clone());

        let request = InvocationRequest::new("lint")
            .in_directory("/home/user/infra")
            .flag("format", "json")
            .flag("no-color", "true");
        let result = orch.invoke(request, CancellationToken::new()).await.unwrap();
        assert!(result.succeeded());

        let spec = runtime.last_spec.lock().clone().unwrap();
        assert_eq!(
            spec.argv,
            vec!["tflint", "--chdir", "/workspace", "--format", "json", "--no-color"]
        );
        assert_eq!(spec.binds.len(), 1);
        assert_eq!(spec.binds[0].host_path, PathBuf::from("/home/user/infra"));
        assert_eq!(spec.binds[0].container_path, "/workspace");
        assert!(spec.binds[0].read_only);
        assert_eq!(spec.workdir.as_deref(), Some("/workspace"));
    }

    #[tokio::test]
    async fn test_default_format_fills_placeholder() {
        let runtime = Arc::new(FakeRuntime::ok(""));
        let orch = orchestrator_with(lint_descriptor(), runtime.clone());

        let request = InvocationRequest::new("lint").in_directory("/infra");
        orch.invoke(request, CancellationToken::new()).await.unwrap();

        let spec = runtime.last_spec.lock().clone().unwrap();
        assert!(spec.argv.contains(&"default".to_string()));
    }

    #[tokio::test]
    async fn test_unresolved_placeholder_fails() {
        let runtime = Arc::new(FakeRuntime::ok(""));
        let orch = orchestrator_with(lint_descriptor(), runtime);

        // No directory supplied, template needs {directory}.
        let err = orch
            .invoke(InvocationRequest::new("lint"), CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            OrchestratorError::InvalidTemplate { placeholder, .. } => {
                assert_eq!(placeholder, "directory");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_required_variable_cites_description() {
        let mut descriptor = lint_descriptor();
        descriptor.env_spec = vec![Variable::required("INFRACOST_API_KEY", "Infracost API key")];
        let runtime = Arc::new(FakeRuntime::ok(""));
        let orch = orchestrator_with(descriptor, runtime);

        let err = orch
            .invoke(
                InvocationRequest::new("lint").in_directory("/infra"),
                CancellationToken::new(),
            )
            .await
            .unwrap_err();
        match err {
            OrchestratorError::MissingVariable { name, description } => {
                assert_eq!(name, "INFRACOST_API_KEY");
                assert_eq!(description, "Infracost API key");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_scanner_findings_are_not_errors() {
        let runtime = Arc::new(FakeRuntime::failing(2, "5 failed checks"));
        let orch = orchestrator_with(lint_descriptor(), runtime);

        let result = orch
            .invoke(
                InvocationRequest::new("lint").in_directory("/infra"),
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(result.exit_code, 2);
    }

    #[tokio::test]
    async fn test_schema_stderr_is_classified() {
        let runtime = Arc::new(FakeRuntime::failing(
            1,
            "Error: column \"state\" does not exist (SQLSTATE 42703)",
        ));
        let orch = orchestrator_with(lint_descriptor(), runtime);

        let err = orch
            .invoke(
                InvocationRequest::new("lint").in_directory("/infra"),
                CancellationToken::new(),
            )
            .await
            .unwrap_err();
        match err {
            OrchestratorError::Schema { column, .. } => {
                assert_eq!(column.as_deref(), Some("state"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_json_mode_falls_back_to_text() {
        let mut descriptor = lint_descriptor();
        descriptor.output_mode = OutputMode::Json;
        let runtime = Arc::new(FakeRuntime::ok("not json at all"));
        let orch = orchestrator_with(descriptor, runtime);

        let result = orch
            .invoke(
                InvocationRequest::new("lint").in_directory("/infra"),
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert!(matches!(result.output, ToolOutput::Text(_)));
    }

    #[tokio::test]
    async fn test_undeclared_env_keys_are_forwarded() {
        let runtime = Arc::new(FakeRuntime::ok(""));
        let orch = orchestrator_with(lint_descriptor(), runtime.clone());

        let mut request = InvocationRequest::new("lint").in_directory("/infra");
        request.env = HashMap::from([("AWS_REGION".to_string(), "us-east-1".to_string())]);
        orch.invoke(request, CancellationToken::new()).await.unwrap();

        let spec = runtime.last_spec.lock().clone().unwrap();
        assert_eq!(spec.env.get("AWS_REGION").map(String::as_str), Some("us-east-1"));
    }

    #[test]
    fn test_classifier_table() {
        assert!(classify_stderr("column \"instance_status\" does not exist").is_some());
        assert!(classify_stderr("relation \"aws_ec3_instance\" does not exist").is_some());
        assert!(classify_stderr("permission denied for table").is_none());
    }
}
