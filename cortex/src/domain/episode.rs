// Copyright (c) 2026 CloudShip AI, Inc.
// SPDX-License-Identifier: Apache-2.0
//! Ring-buffered investigation history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ship_core::domain::invocation::QueryErrorKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuerySuccess {
    pub original_intent: String,
    pub generated_sql: String,
    pub result_count: usize,
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryFailure {
    pub original_intent: String,
    pub generated_sql: String,
    pub error: String,
    pub error_kind: QueryErrorKind,
    /// Short natural-language correction fed back into future prompts.
    pub lesson: String,
    pub timestamp: DateTime<Utc>,
}

impl QueryFailure {
    pub fn new(
        intent: impl Into<String>,
        sql: impl Into<String>,
        error: impl Into<String>,
        kind: QueryErrorKind,
        column: Option<&str>,
    ) -> Self {
        let error = error.into();
        let lesson = lesson_for(kind, &error, column);
        Self {
            original_intent: intent.into(),
            generated_sql: sql.into(),
            error,
            error_kind: kind,
            lesson,
            timestamp: Utc::now(),
        }
    }
}

/// Derive a one-line lesson from a failure, specific enough to stop the
/// model repeating the mistake.
pub fn lesson_for(kind: QueryErrorKind, error: &str, column: Option<&str>) -> String {
    match kind {
        QueryErrorKind::Schema => match column {
            Some(col) => format!(
                "Column '{}' does not exist; check the table schema before filtering on it.",
                col
            ),
            None => "A referenced table or column does not exist; verify names against the schema cache.".to_string(),
        },
        QueryErrorKind::Syntax => {
            "The generated SQL had a syntax error; prefer simple SELECT statements with explicit column lists.".to_string()
        }
        QueryErrorKind::Auth => {
            "The inventory engine rejected the credentials; confirm provider credentials before querying.".to_string()
        }
        QueryErrorKind::Timeout => format!(
            "The query timed out ({}); narrow the filter or select fewer columns.",
            first_words(error, 8)
        ),
    }
}

fn first_words(text: &str, n: usize) -> String {
    text.split_whitespace().take(n).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_lesson_names_the_column() {
        let failure = QueryFailure::new(
            "show stopped instances",
            "SELECT * FROM aws_ec2_instance WHERE state = 'stopped'",
            "column \"state\" does not exist",
            QueryErrorKind::Schema,
            Some("state"),
        );
        assert_eq!(failure.error_kind, QueryErrorKind::Schema);
        assert!(failure.lesson.contains("'state'"));
        assert!(!failure.lesson.is_empty());
    }

    #[test]
    fn test_lessons_exist_for_every_kind() {
        for kind in [
            QueryErrorKind::Syntax,
            QueryErrorKind::Schema,
            QueryErrorKind::Auth,
            QueryErrorKind::Timeout,
        ] {
            assert!(!lesson_for(kind, "some error", None).is_empty());
        }
    }
}
