// Copyright (c) 2026 CloudShip AI, Inc.
// SPDX-License-Identifier: Apache-2.0
//! The investigation engine.
//!
//! A ReAct controller: the enhanced prompt goes to the chat model, tool
//! calls come back, each is repaired and executed against the inventory
//! engine, and the observation is fed into the next turn. The loop is
//! single-threaded by design (step *n*'s observation is visible before
//! step *n+1*'s prompt is built) and every suspension point takes the
//! cancellation token.

use crate::application::insights::extract_insights;
use crate::application::schema_cache::SchemaCache;
use crate::application::store::MemoryStore;
use crate::domain::episode::{QueryFailure, QuerySuccess};
use crate::domain::investigation::{
    InvestigationError, InvestigationRequest, InvestigationResult, InvestigationStep,
};
use chrono::Utc;
use ship_core::application::inventory::{InventoryError, InventoryQuerier};
use ship_core::application::query_repair::QueryRepairer;
use ship_core::domain::invocation::QueryErrorKind;
use ship_core::domain::llm::{ChatMessage, ChatModel, ChatTurn, ToolCallRequest, ToolSpec};
use ship_core::domain::provider::Provider;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Keyword → table hints folded into the enhanced prompt.
const AWS_KEYWORD_TABLES: &[(&str, &str)] = &[
    ("ec2", "aws_ec2_instance"),
    ("instance", "aws_ec2_instance"),
    ("s3", "aws_s3_bucket"),
    ("bucket", "aws_s3_bucket"),
    ("security group", "aws_vpc_security_group"),
    ("firewall", "aws_vpc_security_group"),
    ("vpc", "aws_vpc"),
    ("network", "aws_vpc"),
    ("iam", "aws_iam_user"),
    ("user", "aws_iam_user"),
    ("role", "aws_iam_role"),
    ("rds", "aws_rds_db_instance"),
    ("database", "aws_rds_db_instance"),
    ("lambda", "aws_lambda_function"),
    ("function", "aws_lambda_function"),
    ("volume", "aws_ebs_volume"),
    ("ebs", "aws_ebs_volume"),
    ("encryption", "aws_kms_key"),
    ("key", "aws_kms_key"),
    ("trail", "aws_cloudtrail_trail"),
];

const AZURE_KEYWORD_TABLES: &[(&str, &str)] = &[
    ("vm", "azure_compute_virtual_machine"),
    ("virtual machine", "azure_compute_virtual_machine"),
    ("instance", "azure_compute_virtual_machine"),
    ("storage", "azure_storage_account"),
    ("bucket", "azure_storage_account"),
    ("security group", "azure_network_security_group"),
    ("firewall", "azure_network_security_group"),
    ("vault", "azure_key_vault"),
    ("key", "azure_key_vault"),
];

const GCP_KEYWORD_TABLES: &[(&str, &str)] = &[
    ("instance", "gcp_compute_instance"),
    ("vm", "gcp_compute_instance"),
    ("bucket", "gcp_storage_bucket"),
    ("storage", "gcp_storage_bucket"),
    ("firewall", "gcp_compute_firewall"),
    ("security group", "gcp_compute_firewall"),
    ("service account", "gcp_service_account"),
];

/// Longest observation fed back to the model, characters.
const OBSERVATION_CEILING: usize = 4_000;

#[derive(Debug, Clone)]
pub struct InvestigatorConfig {
    /// Inventory queries per investigation.
    pub max_steps: usize,
    /// Attempts per query including repair retries.
    pub max_query_attempts: usize,
    pub learn_schemas: bool,
    /// Failure lessons folded into the enhanced prompt.
    pub lesson_limit: usize,
}

impl Default for InvestigatorConfig {
    fn default() -> Self {
        Self {
            max_steps: 10,
            max_query_attempts: 3,
            learn_schemas: true,
            lesson_limit: 5,
        }
    }
}

pub struct Investigator {
    llm: Arc<dyn ChatModel>,
    inventory: Arc<dyn InventoryQuerier>,
    schema_cache: Arc<SchemaCache>,
    store: Arc<MemoryStore>,
    repairer: QueryRepairer,
    config: InvestigatorConfig,
}

impl Investigator {
    pub fn new(
        llm: Arc<dyn ChatModel>,
        inventory: Arc<dyn InventoryQuerier>,
        schema_cache: Arc<SchemaCache>,
        store: Arc<MemoryStore>,
        config: InvestigatorConfig,
    ) -> Self {
        Self {
            llm,
            inventory,
            schema_cache,
            store,
            repairer: QueryRepairer::new(),
            config,
        }
    }

    pub async fn investigate(
        &self,
        request: InvestigationRequest,
        cancel: CancellationToken,
    ) -> Result<InvestigationResult, InvestigationError> {
        let prompt = request.prompt.trim().to_string();
        if prompt.is_empty() {
            return Err(InvestigationError::EmptyPrompt);
        }

        let started = Instant::now();

        if self.config.max_steps == 0 {
            return Ok(InvestigationResult {
                success: true,
                steps: Vec::new(),
                summary: "No investigation was performed: the step budget is zero.".to_string(),
                insights: Vec::new(),
                query_count: 0,
                duration_ms: started.elapsed().as_millis() as u64,
                confidence: 0.0,
                timestamp: Utc::now(),
            });
        }

        // Prepare: hydrate the cache from persisted memory, then (best
        // effort) learn the provider's curated tables.
        let memory = self.store.snapshot().await;
        self.schema_cache.hydrate(&memory).await;

        let mut schema_degraded = false;
        if self.config.learn_schemas {
            let outcome = self
                .schema_cache
                .learn(request.provider, &request.credentials, self.inventory.as_ref(), &cancel)
                .await;
            schema_degraded = outcome.total_failure();
            info!(
                provider = %request.provider,
                learned = outcome.learned,
                failed = outcome.failed,
                "schema learning finished"
            );
        }

        let enhanced = self.build_enhanced_prompt(&request, &memory).await;
        let tools = vec![inventory_query_tool()];
        let mut messages = vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(enhanced)];

        let mut steps: Vec<InvestigationStep> = Vec::new();
        let mut failures: Vec<QueryFailure> = Vec::new();
        let mut last_success: Option<(String, usize)> = None;
        let mut summary: Option<String> = None;

        // Drive: one extra turn is allowed beyond the step budget so the
        // model can conclude after its final observation.
        let max_turns = self.config.max_steps + 1;
        'drive: for _turn in 0..max_turns {
            let turn = self.llm.chat(&messages, &tools, &cancel).await?;

            match turn {
                ChatTurn::Message(text) => {
                    summary = Some(text);
                    break 'drive;
                }
                ChatTurn::ToolCalls(calls) => {
                    messages.push(ChatMessage::assistant_tool_calls(calls.clone()));
                    for call in calls {
                        if steps.len() >= self.config.max_steps {
                            messages.push(ChatMessage::tool_observation(
                                call.id.clone(),
                                "Step budget exhausted; summarize what you have.",
                            ));
                            continue;
                        }
                        let observation = self
                            .execute_call(
                                &call,
                                &request,
                                &prompt,
                                &cancel,
                                &mut steps,
                                &mut failures,
                                &mut last_success,
                            )
                            .await;
                        messages.push(ChatMessage::tool_observation(call.id.clone(), observation));
                    }
                }
            }
        }

        let exhausted = summary.is_none();
        let summary = summary.unwrap_or_else(|| {
            format!(
                "The investigation stopped after reaching its budget of {} queries without a final summary.",
                self.config.max_steps
            )
        });

        let mut confidence: f64 = 0.9;
        if schema_degraded {
            confidence -= 0.1;
        }
        if exhausted {
            confidence = confidence.min(0.5);
        }
        confidence = confidence.clamp(0.0, 1.0);

        let insights = extract_insights(&summary);
        let query_count = steps.iter().filter(|s| s.result_count.is_some()).count();
        let duration_ms = started.elapsed().as_millis() as u64;

        // Persist: one commit per investigation, atomic on disk. Memory I/O
        // failures degrade to in-memory state and are logged, never fatal.
        let mut memory = self.store.snapshot().await;
        self.schema_cache.export_into(&mut memory).await;
        for failure in failures {
            memory.push_failure(failure);
        }
        if let Some((sql, count)) = &last_success {
            memory.push_success(QuerySuccess {
                original_intent: prompt.clone(),
                generated_sql: sql.clone(),
                result_count: *count,
                duration_ms,
                timestamp: Utc::now(),
            });
            memory.upsert_pattern(&prompt, sql, request.provider, true);
        }
        memory.touch();
        if let Err(e) = self.store.commit(memory).await {
            warn!(error = %e, "memory commit failed; continuing with in-memory state");
        }

        Ok(InvestigationResult {
            success: true,
            steps,
            summary,
            insights,
            query_count,
            duration_ms,
            confidence,
            timestamp: Utc::now(),
        })
    }

    /// Execute one tool call: repair, query, retry on schema errors, record
    /// the step and any failures. Returns the observation for the model.
    #[allow(clippy::too_many_arguments)]
    async fn execute_call(
        &self,
        call: &ToolCallRequest,
        request: &InvestigationRequest,
        prompt: &str,
        cancel: &CancellationToken,
        steps: &mut Vec<InvestigationStep>,
        failures: &mut Vec<QueryFailure>,
        last_success: &mut Option<(String, usize)>,
    ) -> String {
        let Some(sql) = call.arguments.get("sql").and_then(|v| v.as_str()) else {
            return "Tool call was missing the required 'sql' argument.".to_string();
        };

        let mut current = self.repairer.repair(sql);
        let query_started = Instant::now();

        for attempt in 1..=self.config.max_query_attempts {
            debug!(attempt, sql = %current, "executing inventory query");

            match self
                .inventory
                .rows(&current, request.provider, &request.credentials, cancel)
                .await
            {
                Ok(rows) => {
                    steps.push(InvestigationStep {
                        step: steps.len() + 1,
                        sql: current.clone(),
                        result_count: Some(rows.len()),
                        error: None,
                        duration_ms: query_started.elapsed().as_millis() as u64,
                    });
                    *last_success = Some((current.clone(), rows.len()));
                    return render_rows(&rows);
                }
                Err(InventoryError::Query {
                    kind: QueryErrorKind::Schema,
                    message,
                    column,
                }) => {
                    failures.push(QueryFailure::new(
                        prompt,
                        current.clone(),
                        message.clone(),
                        QueryErrorKind::Schema,
                        column.as_deref(),
                    ));

                    let repaired = match &column {
                        Some(col) => self.repairer.repair(&self.repairer.repair_column(&current, col)),
                        None => current.clone(),
                    };
                    if attempt == self.config.max_query_attempts || repaired == current {
                        steps.push(InvestigationStep {
                            step: steps.len() + 1,
                            sql: current.clone(),
                            result_count: None,
                            error: Some(message.clone()),
                            duration_ms: query_started.elapsed().as_millis() as u64,
                        });
                        return format!("Query failed with a schema error: {message}");
                    }
                    current = repaired;
                }
                Err(other) => {
                    let kind = other.kind().unwrap_or(QueryErrorKind::Syntax);
                    let message = other.to_string();
                    failures.push(QueryFailure::new(
                        prompt,
                        current.clone(),
                        message.clone(),
                        kind,
                        None,
                    ));
                    steps.push(InvestigationStep {
                        step: steps.len() + 1,
                        sql: current.clone(),
                        result_count: None,
                        error: Some(message.clone()),
                        duration_ms: query_started.elapsed().as_millis() as u64,
                    });
                    return format!("Query failed: {message}");
                }
            }
        }

        // Unreachable: every arm above returns or continues within the
        // attempt budget.
        "Query retries exhausted.".to_string()
    }

    async fn build_enhanced_prompt(
        &self,
        request: &InvestigationRequest,
        memory: &crate::domain::memory::AgentMemory,
    ) -> String {
        let mut sections = Vec::new();

        sections.push(format!("Investigation request: {}", request.prompt));
        match &request.region {
            Some(region) => sections.push(format!(
                "Target: provider {} in region {}.",
                request.provider, region
            )),
            None => sections.push(format!("Target: provider {}.", request.provider)),
        }

        let tables = relevant_tables(&request.prompt, request.provider);
        let mut table_lines = Vec::new();
        for table in &tables {
            match self.schema_cache.get(request.provider, table).await {
                Some(schema) => {
                    let columns: Vec<&str> = schema.column_names().into_iter().take(8).collect();
                    table_lines.push(format!("  - {} ({})", table, columns.join(", ")));
                }
                None => table_lines.push(format!("  - {}", table)),
            }
        }
        sections.push(format!("Likely relevant tables:\n{}", table_lines.join("\n")));

        let lessons = memory.recent_lessons(self.config.lesson_limit);
        if !lessons.is_empty() {
            let lines: Vec<String> = lessons.iter().map(|l| format!("  - {l}")).collect();
            sections.push(format!(
                "Lessons from recent failed queries:\n{}",
                lines.join("\n")
            ));
        }

        sections.join("\n\n")
    }
}

const SYSTEM_PROMPT: &str = "You are Ship's infrastructure investigator. \
Answer the user's question about their cloud estate by issuing SQL through \
the inventory_query tool. Tables follow the Steampipe naming convention. \
Issue one query at a time, read the observation, and keep querying until \
you are confident. When you are done, reply with a plain-text summary of \
the findings and no tool calls.";

fn inventory_query_tool() -> ToolSpec {
    ToolSpec {
        name: "inventory_query".to_string(),
        description: "Run a SQL query against the cloud inventory engine and return matching rows as JSON."
            .to_string(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "sql": {
                    "type": "string",
                    "description": "SQL statement to execute"
                },
                "provider": {
                    "type": "string",
                    "enum": ["aws", "azure", "gcp"],
                    "description": "Cloud provider the query targets"
                }
            },
            "required": ["sql"]
        }),
    }
}

/// Keyword-matched tables for the prompt, with the account-level table
/// always included first.
pub fn relevant_tables(prompt: &str, provider: Provider) -> Vec<String> {
    let keyword_map: &[(&str, &str)] = match provider {
        Provider::Aws => AWS_KEYWORD_TABLES,
        Provider::Azure => AZURE_KEYWORD_TABLES,
        Provider::Gcp => GCP_KEYWORD_TABLES,
    };

    let haystack = prompt.to_lowercase();
    let mut tables = vec![provider.account_table().to_string()];
    for (keyword, table) in keyword_map {
        if haystack.contains(keyword) && !tables.iter().any(|t| t == table) {
            tables.push(table.to_string());
        }
    }
    tables
}

fn render_rows(rows: &[serde_json::Value]) -> String {
    let body = serde_json::to_string(rows).unwrap_or_else(|_| "[]".to_string());
    if body.len() <= OBSERVATION_CEILING {
        format!("{} rows: {}", rows.len(), body)
    } else {
        format!(
            "{} rows (truncated to {} chars): {}",
            rows.len(),
            OBSERVATION_CEILING,
            &body[..OBSERVATION_CEILING]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relevant_tables_includes_account_first() {
        let tables = relevant_tables("list running EC2 instances", Provider::Aws);
        assert_eq!(tables[0], "aws_account");
        assert!(tables.contains(&"aws_ec2_instance".to_string()));
    }

    #[test]
    fn test_relevant_tables_dedup() {
        // "ec2" and "instance" map to the same table.
        let tables = relevant_tables("ec2 instance report", Provider::Aws);
        let ec2_count = tables.iter().filter(|t| *t == "aws_ec2_instance").count();
        assert_eq!(ec2_count, 1);
    }

    #[test]
    fn test_relevant_tables_per_provider() {
        let tables = relevant_tables("show storage buckets", Provider::Gcp);
        assert!(tables.contains(&"gcp_storage_bucket".to_string()));
        assert_eq!(tables[0], "gcp_project");
    }

    #[test]
    fn test_render_rows_truncates() {
        let rows: Vec<serde_json::Value> = (0..500)
            .map(|n| serde_json::json!({"instance_id": format!("i-{n:0>17}")}))
            .collect();
        let rendered = render_rows(&rows);
        assert!(rendered.len() < OBSERVATION_CEILING + 100);
        assert!(rendered.starts_with("500 rows"));
    }

    #[test]
    fn test_inventory_tool_schema_shape() {
        let tool = inventory_query_tool();
        assert_eq!(tool.name, "inventory_query");
        assert_eq!(tool.parameters["properties"]["provider"]["enum"][0], "aws");
        assert_eq!(tool.parameters["required"][0], "sql");
    }
}
