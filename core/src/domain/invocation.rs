// Copyright (c) 2026 CloudShip AI, Inc.
// SPDX-License-Identifier: Apache-2.0
//! Invocation value objects and the orchestrator error taxonomy.

use crate::domain::runtime::RuntimeError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// One requested tool execution.
///
/// Created by the CLI or an MCP handler, consumed by the orchestrator,
/// discarded after result capture.
#[derive(Debug, Clone, Default)]
pub struct InvocationRequest {
    pub tool: String,
    pub directory: Option<PathBuf>,
    /// Host directory mounted read-write when a tool writes result files.
    pub output_dir: Option<PathBuf>,
    pub args: Vec<String>,
    /// Named flags in caller order; ordering is preserved in the argv.
    pub flags: Vec<(String, String)>,
    /// Caller-supplied variable values, merged over descriptor defaults.
    pub env: HashMap<String, String>,
    pub timeout: Option<Duration>,
}

impl InvocationRequest {
    pub fn new(tool: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            ..Default::default()
        }
    }

    pub fn in_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.directory = Some(dir.into());
        self
    }

    pub fn flag(mut self, name: &str, value: &str) -> Self {
        self.flags.push((name.to_string(), value.to_string()));
        self
    }

    pub fn flag_value(&self, name: &str) -> Option<&str> {
        self.flags
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Normalized stdout, per the descriptor's output mode.
#[derive(Debug, Clone)]
pub enum ToolOutput {
    Text(String),
    Binary(Vec<u8>),
    Json(serde_json::Value),
}

impl ToolOutput {
    /// Human-renderable form; binary payloads report their length.
    pub fn display(&self) -> String {
        match self {
            ToolOutput::Text(s) => s.clone(),
            ToolOutput::Binary(bytes) => format!("<{} bytes of binary output>", bytes.len()),
            ToolOutput::Json(v) => serde_json::to_string_pretty(v).unwrap_or_default(),
        }
    }
}

/// Outcome of one invocation. Short-lived; returned to the caller or wrapped
/// into an MCP response.
#[derive(Debug, Clone)]
pub struct InvocationResult {
    pub exit_code: i64,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub duration: Duration,
    pub output: ToolOutput,
}

impl InvocationResult {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

/// Kind tag recorded with inventory query failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryErrorKind {
    Syntax,
    Schema,
    Auth,
    Timeout,
}

impl QueryErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryErrorKind::Syntax => "syntax",
            QueryErrorKind::Schema => "schema",
            QueryErrorKind::Auth => "auth",
            QueryErrorKind::Timeout => "timeout",
        }
    }
}

/// Classified orchestration failures, per the error design: structured kinds
/// first, substring matching only inside the declared classifier table.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("container engine unavailable: {0}")]
    RuntimeUnavailable(String),

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("cannot resolve placeholder {{{placeholder}}} in template for tool '{tool}'")]
    InvalidTemplate { tool: String, placeholder: String },

    #[error("missing required variable {name}: {description}")]
    MissingVariable { name: String, description: String },

    #[error("tool exited with status {exit_code}: {stderr}")]
    InvocationFailed { exit_code: i64, stderr: String },

    #[error("schema error: {message}")]
    Schema {
        message: String,
        /// Column name extracted from the engine's error text, when present.
        column: Option<String>,
    },

    #[error("invocation timed out after {0:?}")]
    Timeout(Duration),

    #[error("invocation cancelled")]
    Cancelled,
}

impl From<RuntimeError> for OrchestratorError {
    fn from(err: RuntimeError) -> Self {
        match err {
            RuntimeError::Unavailable(msg) => OrchestratorError::RuntimeUnavailable(msg),
            RuntimeError::Timeout(d) => OrchestratorError::Timeout(d),
            RuntimeError::Cancelled => OrchestratorError::Cancelled,
            other => OrchestratorError::InvocationFailed {
                exit_code: -1,
                stderr: other.to_string(),
            },
        }
    }
}
