// Copyright (c) 2026 CloudShip AI, Inc.
// SPDX-License-Identifier: Apache-2.0
//! Deterministic SQL repair.
//!
//! The inventory engine's tables trip up language models in a handful of
//! documented ways. Each rule here is a (pattern, replacement) pair applied
//! in order before execution; a second error-driven pass renames the exact
//! column the engine complained about. Repair is idempotent:
//! `repair(repair(q)) == repair(q)`.

use once_cell::sync::Lazy;
use regex::Regex;

/// Bare boolean-looking state filter: `WHERE running`.
static BARE_RUNNING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bWHERE\s+running\b").unwrap());

/// Misremembered EC2 state columns.
static STATE_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bstate_name\b").unwrap());
static BARE_STATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bstate\b").unwrap());

/// Dotted accessor on a JSON column, e.g. `sg.group_id`.
static JSON_DOT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([a-z_]+)\.([a-z][a-z0-9_]*)\b").unwrap());

static EC2_TABLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\baws_ec2_[a-z_]+\b").unwrap());

/// Aliases the engine stores as JSON documents; dotted access on these must
/// become a JSON-path operator.
const JSON_COLUMNS: &[&str] = &[
    "sg",
    "security_groups",
    "tags",
    "tag",
    "policy",
    "policy_std",
    "block_device_mappings",
];

/// Renames applied when the engine reports a missing column.
static COLUMN_RENAMES: Lazy<Vec<(&'static str, Regex, &'static str)>> = Lazy::new(|| {
    [
        ("state", "instance_state"),
        ("state_name", "instance_state"),
        ("status", "instance_state"),
    ]
    .into_iter()
    .map(|(from, to)| {
        let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(from))).unwrap();
        (from, pattern, to)
    })
    .collect()
});

#[derive(Debug, Clone, Default)]
pub struct QueryRepairer;

impl QueryRepairer {
    pub fn new() -> Self {
        Self
    }

    /// Apply the ordered rule table to a query.
    pub fn repair(&self, sql: &str) -> String {
        let mut out = BARE_RUNNING
            .replace_all(sql, "WHERE instance_state = 'running'")
            .into_owned();

        if EC2_TABLE.is_match(&out) {
            out = STATE_NAME.replace_all(&out, "instance_state").into_owned();
            out = BARE_STATE.replace_all(&out, "instance_state").into_owned();
        }

        out = JSON_DOT
            .replace_all(&out, |caps: &regex::Captures<'_>| {
                let alias = &caps[1];
                let field = &caps[2];
                if JSON_COLUMNS.contains(&alias) {
                    format!("{}->>'{}'", alias, pascal_case(field))
                } else {
                    caps[0].to_string()
                }
            })
            .into_owned();

        out
    }

    /// Error-driven pass: the engine said `column` does not exist; rename it
    /// if a documented fix applies, otherwise return the query unchanged.
    pub fn repair_column(&self, sql: &str, column: &str) -> String {
        for (from, pattern, to) in COLUMN_RENAMES.iter() {
            if column == *from {
                return pattern.replace_all(sql, *to).into_owned();
            }
        }
        sql.to_string()
    }
}

/// `group_id` → `GroupId`, matching the inventory engine's JSON key casing.
fn pascal_case(field: &str) -> String {
    field
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}
