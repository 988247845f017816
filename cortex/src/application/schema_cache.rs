// Copyright (c) 2026 CloudShip AI, Inc.
// SPDX-License-Identifier: Apache-2.0
//! Schema cache and learner.
//!
//! Table schemas are learned lazily with one `information_schema.columns`
//! meta-query per curated table. Individual table failures are logged and
//! skipped; learning as a whole is never fatal. Lookups are concurrent,
//! learning takes the writer side of the lock.

use crate::domain::memory::{AgentMemory, ColumnDescriptor, TableSchema};
use chrono::Utc;
use ship_core::application::inventory::InventoryQuerier;
use ship_core::domain::provider::Provider;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Hard-coded enrichment for well-known columns: description + example
/// values the model can pattern-match against.
const WELL_KNOWN_COLUMNS: &[(&str, &str, &[&str])] = &[
    ("instance_id", "EC2 instance identifier", &["i-0abcd1234efgh5678"]),
    (
        "instance_state",
        "lifecycle state of the instance",
        &["running", "stopped", "terminated"],
    ),
    ("instance_type", "EC2 instance size", &["t3.micro", "m5.large"]),
    ("vpc_id", "VPC the resource lives in", &["vpc-0a1b2c3d"]),
    ("subnet_id", "subnet the resource lives in", &["subnet-0a1b2c3d"]),
    ("region", "cloud region", &["us-east-1", "eu-west-1"]),
    ("account_id", "owning account identifier", &["123456789012"]),
    ("arn", "Amazon Resource Name", &["arn:aws:ec2:us-east-1:123456789012:instance/i-0abc"]),
    ("tags", "resource tags as a JSON document", &["{\"Name\": \"web-1\"}"]),
    ("title", "human-readable resource title", &["web-1"]),
    ("name", "resource name", &["my-bucket"]),
    ("group_id", "security group identifier", &["sg-0a1b2c3d"]),
    ("group_name", "security group name", &["default"]),
    ("create_date", "resource creation timestamp", &["2025-11-02T10:00:00Z"]),
    (
        "versioning_enabled",
        "whether object versioning is enabled",
        &["true", "false"],
    ),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct LearnOutcome {
    pub learned: usize,
    pub failed: usize,
}

impl LearnOutcome {
    /// True when nothing at all could be learned. The loop still runs, at
    /// reduced confidence.
    pub fn total_failure(&self) -> bool {
        self.learned == 0 && self.failed > 0
    }
}

#[derive(Default)]
pub struct SchemaCache {
    tables: RwLock<HashMap<String, TableSchema>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the cache from persisted memory.
    pub async fn hydrate(&self, memory: &AgentMemory) {
        let mut tables = self.tables.write().await;
        for (key, schema) in &memory.schemas {
            tables.insert(key.clone(), schema.clone());
        }
    }

    pub async fn get(&self, provider: Provider, table: &str) -> Option<TableSchema> {
        self.tables
            .read()
            .await
            .get(&format!("{}.{}", provider, table))
            .cloned()
    }

    pub async fn insert(&self, schema: TableSchema) {
        self.tables.write().await.insert(schema.key(), schema);
    }

    pub async fn known_tables(&self, provider: Provider) -> Vec<String> {
        let prefix = format!("{}.", provider);
        let mut names: Vec<String> = self
            .tables
            .read()
            .await
            .keys()
            .filter_map(|k| k.strip_prefix(&prefix).map(str::to_string))
            .collect();
        names.sort();
        names
    }

    /// Copy every cached schema into the memory aggregate before a commit.
    pub async fn export_into(&self, memory: &mut AgentMemory) {
        for schema in self.tables.read().await.values() {
            memory.record_schema(schema.clone());
        }
    }

    /// Learn schemas for the provider's curated tables. One meta-query per
    /// table; failures are skipped, the overall operation never fails.
    pub async fn learn(
        &self,
        provider: Provider,
        credentials: &HashMap<String, String>,
        querier: &dyn InventoryQuerier,
        cancel: &CancellationToken,
    ) -> LearnOutcome {
        let mut outcome = LearnOutcome::default();

        for table in provider.curated_tables() {
            if cancel.is_cancelled() {
                break;
            }

            let sql = format!(
                "SELECT column_name, data_type, is_nullable \
                 FROM information_schema.columns WHERE table_name = '{}'",
                table
            );

            match querier.rows(&sql, provider, credentials, cancel).await {
                Ok(rows) if rows.is_empty() => {
                    debug!(%provider, table, "no columns returned; skipping table");
                    outcome.failed += 1;
                }
                Ok(rows) => {
                    let schema = build_schema(provider, table, &rows);
                    self.insert(schema).await;
                    outcome.learned += 1;
                }
                Err(e) => {
                    debug!(%provider, table, error = %e, "schema learning failed for table");
                    outcome.failed += 1;
                }
            }
        }

        if outcome.total_failure() {
            warn!(%provider, "schema learning failed for every curated table");
        }
        outcome
    }
}

fn build_schema(provider: Provider, table: &str, rows: &[serde_json::Value]) -> TableSchema {
    let columns = rows
        .iter()
        .filter_map(|row| {
            let name = row.get("column_name")?.as_str()?.to_string();
            let data_type = row
                .get("data_type")
                .and_then(|v| v.as_str())
                .unwrap_or("text")
                .to_string();
            Some(enrich(ColumnDescriptor {
                name,
                data_type,
                description: None,
                examples: Vec::new(),
            }))
        })
        .collect();

    TableSchema {
        provider,
        table_name: table.to_string(),
        columns,
        description: format!("{} inventory table {}", provider, table),
        last_updated: Utc::now(),
    }
}

fn enrich(mut column: ColumnDescriptor) -> ColumnDescriptor {
    if let Some((_, description, examples)) = WELL_KNOWN_COLUMNS
        .iter()
        .find(|(name, _, _)| *name == column.name)
    {
        column.description = Some(description.to_string());
        column.examples = examples.iter().map(|s| s.to_string()).collect();
    }
    column
}
