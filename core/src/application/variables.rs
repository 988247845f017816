// Copyright (c) 2026 CloudShip AI, Inc.
// SPDX-License-Identifier: Apache-2.0
//! Variable resolution.
//!
//! Turns a set of declared [`Variable`]s plus user-supplied `--var K=V` pairs
//! into a concrete environment map, failing early on missing required
//! variables. Resolution is idempotent: resolving an already-resolved map
//! against the same declarations yields the same environment.

use crate::domain::tool::Variable;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VariableError {
    #[error("missing required variable {name}: {description}")]
    MissingRequired { name: String, description: String },

    #[error("malformed --var '{0}' (expected KEY=VALUE)")]
    Malformed(String),
}

/// Resolve declared variables against user-supplied values.
///
/// Rules: user values always override defaults; optional variables with no
/// value and no default are omitted; required variables with neither fail
/// with the variable's name and description.
pub fn resolve(
    declared: &[Variable],
    supplied: &HashMap<String, String>,
) -> Result<HashMap<String, String>, VariableError> {
    let mut env = HashMap::new();

    for var in declared {
        match supplied.get(&var.name) {
            Some(value) => {
                env.insert(var.name.clone(), value.clone());
            }
            None => match &var.default {
                Some(default) => {
                    env.insert(var.name.clone(), default.clone());
                }
                None if var.required => {
                    return Err(VariableError::MissingRequired {
                        name: var.name.clone(),
                        description: var.description.clone(),
                    });
                }
                None => {}
            },
        }
    }

    // Caller-passed keys outside the declaration set travel through
    // unchanged; the orchestrator treats them as explicitly-passed
    // credentials.
    for (key, value) in supplied {
        env.entry(key.clone()).or_insert_with(|| value.clone());
    }

    Ok(env)
}

/// Parse repeated `--var KEY=VALUE` arguments.
pub fn parse_var_flags(pairs: &[String]) -> Result<HashMap<String, String>, VariableError> {
    let mut vars = HashMap::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| VariableError::Malformed(pair.clone()))?;
        if key.is_empty() {
            return Err(VariableError::Malformed(pair.clone()));
        }
        vars.insert(key.to_string(), value.to_string());
    }
    Ok(vars)
}

/// Render a declared variable for help output, masking secrets.
pub fn describe(var: &Variable) -> String {
    let requirement = if var.required { "required" } else { "optional" };
    match &var.default {
        Some(default) => format!(
            "{} ({}, default: {}) - {}",
            var.name,
            requirement,
            var.display_value(default),
            var.description
        ),
        None => format!("{} ({}) - {}", var.name, requirement, var.description),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declarations() -> Vec<Variable> {
        vec![
            Variable::required("BRAVE_API_KEY", "Brave Search API key").secret(),
            Variable::optional("FILESYSTEM_ROOT", "root directory").with_default("/tmp"),
            Variable::optional("LOG_LEVEL", "server log level"),
        ]
    }

    #[test]
    fn test_missing_required_names_the_variable() {
        let err = resolve(&declarations(), &HashMap::new()).unwrap_err();
        match err {
            VariableError::MissingRequired { name, description } => {
                assert_eq!(name, "BRAVE_API_KEY");
                assert_eq!(description, "Brave Search API key");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_defaults_applied_and_overridden() {
        let mut supplied = HashMap::new();
        supplied.insert("BRAVE_API_KEY".to_string(), "sk-1".to_string());
        let env = resolve(&declarations(), &supplied).unwrap();
        assert_eq!(env.get("FILESYSTEM_ROOT").map(String::as_str), Some("/tmp"));
        assert!(!env.contains_key("LOG_LEVEL"));

        supplied.insert("FILESYSTEM_ROOT".to_string(), "/srv".to_string());
        let env = resolve(&declarations(), &supplied).unwrap();
        assert_eq!(env.get("FILESYSTEM_ROOT").map(String::as_str), Some("/srv"));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let mut supplied = HashMap::new();
        supplied.insert("BRAVE_API_KEY".to_string(), "sk-1".to_string());
        let once = resolve(&declarations(), &supplied).unwrap();
        let twice = resolve(&declarations(), &once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_undeclared_keys_pass_through() {
        let mut supplied = HashMap::new();
        supplied.insert("BRAVE_API_KEY".to_string(), "sk-1".to_string());
        supplied.insert("AWS_REGION".to_string(), "eu-west-1".to_string());
        let env = resolve(&declarations(), &supplied).unwrap();
        assert_eq!(env.get("AWS_REGION").map(String::as_str), Some("eu-west-1"));
    }

    #[test]
    fn test_parse_var_flags() {
        let pairs = vec![
            "BRAVE_API_KEY=abc".to_string(),
            "ROOT=/srv/data=x".to_string(),
        ];
        let vars = parse_var_flags(&pairs).unwrap();
        assert_eq!(vars.get("BRAVE_API_KEY").map(String::as_str), Some("abc"));
        // Only the first '=' splits.
        assert_eq!(vars.get("ROOT").map(String::as_str), Some("/srv/data=x"));

        assert!(parse_var_flags(&["novalue".to_string()]).is_err());
        assert!(parse_var_flags(&["=orphan".to_string()]).is_err());
    }

    #[test]
    fn test_describe_masks_secret_defaults() {
        let var = Variable::optional("TOKEN", "service token")
            .with_default("super-secret")
            .secret();
        let text = describe(&var);
        assert!(!text.contains("super-secret"));
        assert!(text.contains("********"));
    }
}
