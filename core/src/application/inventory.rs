// Copyright (c) 2026 CloudShip AI, Inc.
// SPDX-License-Identifier: Apache-2.0
//! Inventory-engine client.
//!
//! The inventory engine (Steampipe) is just another catalogued tool: SQL
//! strings go in as an argv placeholder, JSON rows come out of stdout. This
//! module owns that contract and the classification of engine failures into
//! the query error kinds the rest of the system records.

use crate::application::orchestrator::ToolOrchestrator;
use crate::domain::invocation::{InvocationRequest, OrchestratorError, QueryErrorKind, ToolOutput};
use crate::domain::provider::Provider;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

static AUTH_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(access ?denied|invalidclienttokenid|credentials|not authorized|expired token)")
        .unwrap()
});
static SYNTAX_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)syntax error").unwrap());
static TIMEOUT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(timed? ?out|deadline exceeded)").unwrap());

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("inventory query failed ({}): {message}", kind.as_str())]
    Query {
        kind: QueryErrorKind,
        message: String,
        /// Missing column extracted from the engine error, when present.
        column: Option<String>,
    },

    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),

    #[error("could not parse inventory rows: {0}")]
    Parse(String),
}

impl InventoryError {
    pub fn kind(&self) -> Option<QueryErrorKind> {
        match self {
            InventoryError::Query { kind, .. } => Some(*kind),
            InventoryError::Orchestrator(OrchestratorError::Timeout(_)) => {
                Some(QueryErrorKind::Timeout)
            }
            _ => None,
        }
    }
}

/// Seam for the investigation engine and the schema learner; the production
/// implementation dispatches through the orchestrator, tests substitute
/// canned rows.
#[async_trait]
pub trait InventoryQuerier: Send + Sync {
    async fn rows(
        &self,
        sql: &str,
        provider: Provider,
        credentials: &HashMap<String, String>,
        cancel: &CancellationToken,
    ) -> Result<Vec<serde_json::Value>, InventoryError>;
}

pub struct InventoryClient {
    orchestrator: Arc<ToolOrchestrator>,
    timeout: Duration,
}

impl InventoryClient {
    pub fn new(orchestrator: Arc<ToolOrchestrator>) -> Self {
        Self {
            orchestrator,
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl InventoryQuerier for InventoryClient {
    async fn rows(
        &self,
        sql: &str,
        provider: Provider,
        credentials: &HashMap<String, String>,
        cancel: &CancellationToken,
    ) -> Result<Vec<serde_json::Value>, InventoryError> {
        let mut env = if credentials.is_empty() {
            provider.credentials_from_env()
        } else {
            credentials.clone()
        };
        env.insert("STEAMPIPE_UPDATE_CHECK".to_string(), "false".to_string());

        let mut request = InvocationRequest::new("steampipe").flag("query", sql);
        request.env = env;
        request.timeout = Some(self.timeout);

        debug!(%provider, %sql, "running inventory query");

        let result = match self.orchestrator.invoke(request, cancel.clone()).await {
            Ok(result) => result,
            Err(OrchestratorError::Schema { message, column }) => {
                return Err(InventoryError::Query {
                    kind: QueryErrorKind::Schema,
                    message,
                    column,
                });
            }
            Err(OrchestratorError::Timeout(d)) => {
                return Err(InventoryError::Query {
                    kind: QueryErrorKind::Timeout,
                    message: format!("query exceeded {}s deadline", d.as_secs()),
                    column: None,
                });
            }
            Err(other) => return Err(other.into()),
        };

        if result.exit_code != 0 {
            return Err(classify_failure(&result.stderr));
        }

        parse_rows(&result.output)
    }
}

/// Classify a non-zero engine exit by its stderr text. The declared pattern
/// table is the documented fallback behind the structured classification the
/// orchestrator already performed.
fn classify_failure(stderr: &[u8]) -> InventoryError {
    let text = String::from_utf8_lossy(stderr);
    let message = text.lines().next().unwrap_or("").trim().to_string();

    let kind = if AUTH_PATTERN.is_match(&text) {
        QueryErrorKind::Auth
    } else if TIMEOUT_PATTERN.is_match(&text) {
        QueryErrorKind::Timeout
    } else if SYNTAX_PATTERN.is_match(&text) {
        QueryErrorKind::Syntax
    } else {
        QueryErrorKind::Syntax
    };

    InventoryError::Query {
        kind,
        message,
        column: None,
    }
}

/// The engine emits either a bare JSON array of rows or an object with a
/// `rows` key, depending on version.
fn parse_rows(output: &ToolOutput) -> Result<Vec<serde_json::Value>, InventoryError> {
    let value = match output {
        ToolOutput::Json(value) => value.clone(),
        ToolOutput::Text(text) if text.trim().is_empty() => {
            return Ok(Vec::new());
        }
        ToolOutput::Text(text) => serde_json::from_str(text)
            .map_err(|e| InventoryError::Parse(e.to_string()))?,
        ToolOutput::Binary(_) => {
            return Err(InventoryError::Parse(
                "unexpected binary output from inventory engine".to_string(),
            ));
        }
    };

    match value {
        serde_json::Value::Array(rows) => Ok(rows),
        serde_json::Value::Object(mut map) => match map.remove("rows") {
            Some(serde_json::Value::Array(rows)) => Ok(rows),
            _ => Err(InventoryError::Parse(
                "inventory output object had no rows array".to_string(),
            )),
        },
        other => Err(InventoryError::Parse(format!(
            "unexpected inventory output shape: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_bare_array() {
        let output = ToolOutput::Json(json!([{"instance_id": "i-1"}, {"instance_id": "i-2"}]));
        let rows = parse_rows(&output).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_parse_rows_object() {
        let output = ToolOutput::Json(json!({"rows": [{"instance_id": "i-1"}]}));
        let rows = parse_rows(&output).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_empty_text_is_zero_rows() {
        let output = ToolOutput::Text("  \n".to_string());
        assert!(parse_rows(&output).unwrap().is_empty());
    }

    #[test]
    fn test_classify_auth_failure() {
        let err = classify_failure(b"Error: AccessDenied: User is not authorized");
        match err {
            InventoryError::Query { kind, .. } => assert_eq!(kind, QueryErrorKind::Auth),
            other => panic!("unexpected: {other}"),
        }
    }

    #[test]
    fn test_classify_defaults_to_syntax() {
        let err = classify_failure(b"Error: something inscrutable");
        match err {
            InventoryError::Query { kind, .. } => assert_eq!(kind, QueryErrorKind::Syntax),
            other => panic!("unexpected: {other}"),
        }
    }
}
