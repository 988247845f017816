// Copyright (c) 2026 CloudShip AI, Inc.
// SPDX-License-Identifier: Apache-2.0
//! The persistent memory aggregate.
//!
//! One JSON document holds everything the agent has learned: table schemas,
//! query patterns, and bounded success/failure history. Schema versioning is
//! by field presence only: every collection field carries `serde(default)`
//! so older documents load cleanly.

use crate::domain::episode::{QueryFailure, QuerySuccess};
use crate::domain::pattern::QueryPattern;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ship_core::domain::provider::Provider;
use std::collections::BTreeMap;

/// Most-recent episodes retained per list.
pub const DEFAULT_EPISODE_LIMIT: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub data_type: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub examples: Vec<String>,
}

/// One inventory table description, keyed as `provider.table_name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    pub provider: Provider,
    pub table_name: String,
    pub columns: Vec<ColumnDescriptor>,
    #[serde(default)]
    pub description: String,
    pub last_updated: DateTime<Utc>,
}

impl TableSchema {
    pub fn key(&self) -> String {
        format!("{}.{}", self.provider, self.table_name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMemory {
    #[serde(default)]
    pub schemas: BTreeMap<String, TableSchema>,
    #[serde(default)]
    pub patterns: BTreeMap<String, QueryPattern>,
    #[serde(default)]
    pub successes: Vec<QuerySuccess>,
    #[serde(default)]
    pub failures: Vec<QueryFailure>,
    pub last_update: DateTime<Utc>,
}

impl Default for AgentMemory {
    fn default() -> Self {
        Self {
            schemas: BTreeMap::new(),
            patterns: BTreeMap::new(),
            successes: Vec::new(),
            failures: Vec::new(),
            last_update: Utc::now(),
        }
    }
}

impl AgentMemory {
    /// Insert or overwrite a learned schema. Re-learning is idempotent:
    /// the `provider.table` key always maps to the latest description.
    pub fn record_schema(&mut self, schema: TableSchema) {
        self.schemas.insert(schema.key(), schema);
    }

    pub fn schema(&self, provider: Provider, table: &str) -> Option<&TableSchema> {
        self.schemas.get(&format!("{}.{}", provider, table))
    }

    pub fn push_success(&mut self, success: QuerySuccess) {
        self.successes.push(success);
        trim_front(&mut self.successes, DEFAULT_EPISODE_LIMIT);
    }

    pub fn push_failure(&mut self, failure: QueryFailure) {
        self.failures.push(failure);
        trim_front(&mut self.failures, DEFAULT_EPISODE_LIMIT);
    }

    /// Upsert a pattern for (intent, provider): repeated investigations of
    /// the same intent update the existing record instead of growing the map.
    pub fn upsert_pattern(
        &mut self,
        intent: &str,
        sql_template: &str,
        provider: Provider,
        success: bool,
    ) {
        let existing = self
            .patterns
            .values_mut()
            .find(|p| p.intent == intent && p.provider == provider);
        match existing {
            Some(pattern) => {
                pattern.sql_template = sql_template.to_string();
                pattern.record_use(success);
            }
            None => {
                let pattern =
                    QueryPattern::new(intent.to_string(), sql_template.to_string(), provider);
                self.patterns.insert(pattern.id.to_string(), pattern);
            }
        }
    }

    /// Most recent failure lessons, newest first.
    pub fn recent_lessons(&self, limit: usize) -> Vec<&str> {
        self.failures
            .iter()
            .rev()
            .take(limit)
            .map(|f| f.lesson.as_str())
            .collect()
    }

    pub fn touch(&mut self) {
        self.last_update = Utc::now();
    }
}

fn trim_front<T>(list: &mut Vec<T>, limit: usize) {
    if list.len() > limit {
        let excess = list.len() - limit;
        list.drain(..excess);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::episode::QueryFailure;
    use ship_core::domain::invocation::QueryErrorKind;

    fn success(n: usize) -> QuerySuccess {
        QuerySuccess {
            original_intent: format!("intent {n}"),
            generated_sql: "SELECT 1".to_string(),
            result_count: n,
            duration_ms: 10,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_episode_lists_are_bounded() {
        let mut memory = AgentMemory::default();
        for n in 0..(DEFAULT_EPISODE_LIMIT + 25) {
            memory.push_success(success(n));
        }
        assert_eq!(memory.successes.len(), DEFAULT_EPISODE_LIMIT);
        // Most recent entries are retained.
        assert_eq!(
            memory.successes.last().unwrap().result_count,
            DEFAULT_EPISODE_LIMIT + 24
        );
        assert_eq!(memory.successes.first().unwrap().result_count, 25);
    }

    #[test]
    fn test_schema_relearning_overwrites_in_place() {
        let mut memory = AgentMemory::default();
        let mut schema = TableSchema {
            provider: Provider::Aws,
            table_name: "aws_ec2_instance".to_string(),
            columns: vec![],
            description: "first".to_string(),
            last_updated: Utc::now(),
        };
        memory.record_schema(schema.clone());

        schema.description = "second".to_string();
        memory.record_schema(schema);

        assert_eq!(memory.schemas.len(), 1);
        assert_eq!(
            memory
                .schema(Provider::Aws, "aws_ec2_instance")
                .unwrap()
                .description,
            "second"
        );
    }

    #[test]
    fn test_pattern_upsert_by_intent() {
        let mut memory = AgentMemory::default();
        memory.upsert_pattern("list instances", "SELECT a", Provider::Aws, true);
        memory.upsert_pattern("list instances", "SELECT b", Provider::Aws, true);
        assert_eq!(memory.patterns.len(), 1);

        let pattern = memory.patterns.values().next().unwrap();
        assert_eq!(pattern.sql_template, "SELECT b");
        assert_eq!(pattern.usage_count, 2);

        // Same intent on another provider is a distinct pattern.
        memory.upsert_pattern("list instances", "SELECT c", Provider::Gcp, true);
        assert_eq!(memory.patterns.len(), 2);
    }

    #[test]
    fn test_recent_lessons_newest_first() {
        let mut memory = AgentMemory::default();
        for n in 0..8 {
            memory.push_failure(QueryFailure::new(
                format!("intent {n}"),
                "SELECT 1",
                format!("error {n}"),
                QueryErrorKind::Syntax,
                None,
            ));
        }
        let lessons = memory.recent_lessons(5);
        assert_eq!(lessons.len(), 5);
    }

    #[test]
    fn test_round_trip_preserves_maps() {
        let mut memory = AgentMemory::default();
        memory.record_schema(TableSchema {
            provider: Provider::Aws,
            table_name: "aws_s3_bucket".to_string(),
            columns: vec![ColumnDescriptor {
                name: "name".to_string(),
                data_type: "text".to_string(),
                description: Some("bucket name".to_string()),
                examples: vec!["my-bucket".to_string()],
            }],
            description: "S3 buckets".to_string(),
            last_updated: Utc::now(),
        });
        memory.upsert_pattern("list buckets", "SELECT name FROM aws_s3_bucket", Provider::Aws, true);

        let json = serde_json::to_string(&memory).unwrap();
        let loaded: AgentMemory = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.schemas.len(), memory.schemas.len());
        assert_eq!(loaded.patterns.len(), memory.patterns.len());
        assert_eq!(
            serde_json::to_value(&loaded.schemas).unwrap(),
            serde_json::to_value(&memory.schemas).unwrap()
        );
    }

    #[test]
    fn test_old_documents_load_by_field_presence() {
        let minimal = r#"{"last_update": "2026-01-01T00:00:00Z"}"#;
        let memory: AgentMemory = serde_json::from_str(minimal).unwrap();
        assert!(memory.schemas.is_empty());
        assert!(memory.successes.is_empty());
    }
}
