// Copyright (c) 2026 CloudShip AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ship_core::domain::provider::Provider;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatternId(pub Uuid);

impl PatternId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PatternId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PatternId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A learned association between a user intent and the SQL that answered it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryPattern {
    pub id: PatternId,
    /// The raw prompt text the pattern was learned from.
    pub intent: String,
    pub sql_template: String,
    #[serde(default)]
    pub parameters: Vec<String>,
    pub provider: Provider,
    pub success_rate: f64,
    pub usage_count: u64,
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
}

impl QueryPattern {
    pub fn new(intent: String, sql_template: String, provider: Provider) -> Self {
        let now = Utc::now();
        Self {
            id: PatternId::new(),
            intent,
            sql_template,
            parameters: Vec::new(),
            provider,
            success_rate: 1.0,
            usage_count: 1,
            examples: Vec::new(),
            tags: Vec::new(),
            created_at: now,
            last_used_at: now,
        }
    }

    /// Fold one more use into the running success rate.
    pub fn record_use(&mut self, success: bool) {
        let total = self.usage_count as f64;
        let hits = self.success_rate * total + if success { 1.0 } else { 0.0 };
        self.usage_count += 1;
        self.success_rate = (hits / self.usage_count as f64).clamp(0.0, 1.0);
        self.last_used_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_pattern_starts_confident() {
        let pattern = QueryPattern::new(
            "list running EC2 instances".to_string(),
            "SELECT * FROM aws_ec2_instance WHERE instance_state = 'running'".to_string(),
            Provider::Aws,
        );
        assert_eq!(pattern.usage_count, 1);
        assert_eq!(pattern.success_rate, 1.0);
    }

    #[test]
    fn test_record_use_updates_rate() {
        let mut pattern =
            QueryPattern::new("x".to_string(), "SELECT 1".to_string(), Provider::Aws);
        pattern.record_use(false);
        assert_eq!(pattern.usage_count, 2);
        assert!((pattern.success_rate - 0.5).abs() < f64::EPSILON);

        pattern.record_use(true);
        assert_eq!(pattern.usage_count, 3);
        assert!(pattern.success_rate > 0.6 && pattern.success_rate < 0.7);
    }
}
