// Copyright (c) 2026 CloudShip AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ship_core::domain::llm::LlmError;
use ship_core::domain::provider::Provider;
use std::collections::HashMap;
use thiserror::Error;

/// One natural-language investigation to run.
///
/// Credentials are deliberately not serializable and are redacted from debug
/// output.
#[derive(Clone)]
pub struct InvestigationRequest {
    pub prompt: String,
    pub provider: Provider,
    pub region: Option<String>,
    pub credentials: HashMap<String, String>,
}

impl InvestigationRequest {
    pub fn new(prompt: impl Into<String>, provider: Provider) -> Self {
        Self {
            prompt: prompt.into(),
            provider,
            region: None,
            credentials: HashMap::new(),
        }
    }
}

impl std::fmt::Debug for InvestigationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvestigationRequest")
            .field("prompt", &self.prompt)
            .field("provider", &self.provider)
            .field("region", &self.region)
            .field("credentials", &format!("<{} redacted>", self.credentials.len()))
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightType {
    Security,
    Cost,
    Performance,
    Compliance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    #[serde(rename = "type")]
    pub insight_type: InsightType,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub impact: String,
    pub recommendation: String,
    pub confidence: f64,
}

/// One executed inventory query inside an investigation, with its final
/// outcome after any repair retries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestigationStep {
    pub step: usize,
    pub sql: String,
    #[serde(default)]
    pub result_count: Option<usize>,
    #[serde(default)]
    pub error: Option<String>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestigationResult {
    pub success: bool,
    pub steps: Vec<InvestigationStep>,
    pub summary: String,
    pub insights: Vec<Insight>,
    /// Count of queries that returned rows (failed attempts are recorded in
    /// memory, not here).
    pub query_count: usize,
    pub duration_ms: u64,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum InvestigationError {
    #[error("investigation prompt must not be empty")]
    EmptyPrompt,

    /// LLM failures are fatal to the current investigation; partial memory
    /// updates are not committed.
    #[error(transparent)]
    Llm(#[from] LlmError),
}
